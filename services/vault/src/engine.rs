//! # Vault Engine - Accounting and Reallocation Hub
//!
//! ## Purpose
//!
//! Owns the persisted [`VaultStorage`] together with the behaviour objects
//! that act on it: the strategy arena, swap venue, treasury, rebalance policy,
//! clock and event sinks. Every public operation is a method on
//! [`VaultEngine`]; the operations themselves live in the `deposit`, `fees`,
//! `rebalance`, `flash_boost`, `automation` and `access` modules.
//!
//! ## Integration Points
//!
//! - **Input Sources**: callers (users, owner, keepers, schedulers), strategy
//!   adapters reporting balance and APY, the swap venue for conversions
//! - **Output Destinations**: treasury fee transfers, [`EventSink`]s, tracing
//! - **State Management**: one [`VaultStorage`] value, snapshot/restore via
//!   [`Stateful`]
//!
//! ## Architecture Role
//!
//! ```text
//! Callers → [VaultEngine] → Strategy adapters / Swap venue / Treasury
//!    ↓            ↓                     ↓
//! deposit    share ledger        deposit / withdraw
//! rebalance  principal ledger    swap_exact_input
//! upkeep     fee state           receive
//! ```
//!
//! Mutating operations take `&mut self`, so a strategy adapter called during
//! an operation has no path back into the engine. Ledger writes happen only
//! after every external call of the operation has returned.

use crate::adapters::{StrategyAdapter, SwapVenue, Treasury};
use crate::errors::{StateError, VaultError, VaultResult};
use crate::events::{EventSink, TracingSink};
use crate::ledger::IdleBalances;
use crate::rebalance::{ApyHysteresisPolicy, RebalancePolicy, StrategyView};
use crate::registry::StrategyRegistry;
use crate::storage::{FlashBoostState, Stateful, VaultStorage};
use router_config::constants::fees::MAX_PROTOCOL_FEE_BPS;
use router_config::VaultConfig;
use router_math::{ApyMath, ShareMath};
use router_types::{Address, Amount, AssetId, Bps, Clock, PairId, StrategyId, VaultEvent};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Recipient address the vault reports to the swap venue unless overridden
pub const DEFAULT_VAULT_ADDRESS: Address = Address::new([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, b'y', b'i', b'e', b'l', b'd', b'v', b'l', b't',
]);

/// Per-strategy line of a [`PairSnapshot`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategySnapshot {
    pub id: StrategyId,
    pub name: String,
    pub principal: Amount,
    pub balance: Amount,
    pub apy: Bps,
    pub apy_percent: Decimal,
}

/// Read-only view of a pair for dashboards and the keeper
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairSnapshot {
    pub id: PairId,
    pub token0: AssetId,
    pub token1: AssetId,
    pub total_shares: Amount,
    pub vault_value: Amount,
    pub idle: IdleBalances,
    pub pending_yield: Amount,
    pub last_rebalance: u64,
    pub share_price: Option<Decimal>,
    pub strategies: Vec<StrategySnapshot>,
    pub flash_boost: Option<FlashBoostState>,
    pub liquidity_receipt: Option<AssetId>,
}

impl PairSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

pub struct VaultEngine {
    pub(crate) storage: VaultStorage,
    pub(crate) registry: StrategyRegistry,
    pub(crate) venue: Option<Arc<dyn SwapVenue>>,
    pub(crate) treasury: Arc<dyn Treasury>,
    pub(crate) policy: Box<dyn RebalancePolicy>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) sinks: Vec<Arc<dyn EventSink>>,
    pub(crate) address: Address,
}

impl VaultEngine {
    /// Build an engine owned by `owner` with settings seeded from `config`.
    ///
    /// The config is validated first: a fee above the ceiling is reported as
    /// [`VaultError::FeeTooHigh`], any other bad setting as
    /// [`VaultError::InvalidConfig`]. Keeper addresses listed in the config
    /// are granted immediately. The
    /// treasury object receives every fee; its address is recorded in the
    /// fee state.
    pub fn new(
        owner: Address,
        config: &VaultConfig,
        clock: Arc<dyn Clock>,
        treasury: Arc<dyn Treasury>,
    ) -> VaultResult<Self> {
        if config.fees.protocol_fee_bps > MAX_PROTOCOL_FEE_BPS {
            return Err(VaultError::FeeTooHigh {
                requested: config.fees.protocol_fee_bps,
                max: MAX_PROTOCOL_FEE_BPS,
            });
        }
        config
            .validate()
            .map_err(|e| VaultError::InvalidConfig(format!("{:#}", e)))?;
        let keepers = config
            .keeper_addresses()
            .map_err(|e| VaultError::InvalidConfig(format!("{:#}", e)))?;

        let mut storage = VaultStorage::new(owner, treasury.address(), config);
        storage.access.keepers.extend(keepers);

        info!(
            owner = %owner,
            fee_bps = config.fees.protocol_fee_bps,
            keepers = storage.access.keepers.len(),
            "Vault engine initialized"
        );

        Ok(Self {
            storage,
            registry: StrategyRegistry::new(),
            venue: None,
            treasury,
            policy: Box::new(ApyHysteresisPolicy),
            clock,
            sinks: vec![Arc::new(TracingSink)],
            address: DEFAULT_VAULT_ADDRESS,
        })
    }

    pub fn with_venue(mut self, venue: Arc<dyn SwapVenue>) -> Self {
        self.venue = Some(venue);
        self
    }

    pub fn with_policy(mut self, policy: Box<dyn RebalancePolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Add a sink after the default tracing sink
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn storage(&self) -> &VaultStorage {
        &self.storage
    }

    pub fn policy_name(&self) -> &str {
        self.policy.name()
    }

    pub(crate) fn now(&self) -> u64 {
        self.clock.now_secs()
    }

    pub(crate) fn emit(&self, event: VaultEvent) {
        for sink in &self.sinks {
            sink.emit(&event);
        }
    }

    pub(crate) fn adapter(&self, strategy: StrategyId) -> VaultResult<Arc<dyn StrategyAdapter>> {
        self.registry
            .get(strategy)
            .cloned()
            .ok_or(VaultError::StrategyNotRegistered {
                pair: self.registry.pair_of(strategy).unwrap_or_default(),
                strategy,
            })
    }

    /// Adapter of `strategy`, which must be registered on `pair`
    pub(crate) fn pair_adapter(
        &self,
        pair: PairId,
        strategy: StrategyId,
    ) -> VaultResult<Arc<dyn StrategyAdapter>> {
        if !self.storage.pair(pair)?.holds_strategy(strategy) {
            return Err(VaultError::StrategyNotRegistered { pair, strategy });
        }
        self.adapter(strategy)
    }

    /// Balance, APY and principal of every strategy of `pair`, in registration order
    pub fn strategy_views(&self, pair: PairId) -> VaultResult<Vec<StrategyView>> {
        let record = self.storage.pair(pair)?;
        record
            .strategies
            .iter()
            .map(|&id| {
                let adapter = self.adapter(id)?;
                Ok(StrategyView {
                    id,
                    apy: adapter.current_apy(),
                    balance: adapter.current_balance(),
                    principal: self.storage.principal_of(pair, id),
                })
            })
            .collect()
    }

    // ---- read-only accessors ----

    pub fn user_shares(&self, pair: PairId, account: Address) -> Amount {
        self.storage.shares_of(pair, account)
    }

    pub fn pair(&self, pair: PairId) -> VaultResult<&crate::storage::PairRecord> {
        self.storage.pair(pair)
    }

    pub fn next_pair_id(&self) -> PairId {
        self.storage.next_pair_id
    }

    pub fn total_fees_collected(&self) -> Amount {
        self.storage.fees.total_fees_collected
    }

    pub fn protocol_fee_bps(&self) -> Bps {
        self.storage.fees.protocol_fee_bps
    }

    pub fn treasury_address(&self) -> Address {
        self.storage.fees.treasury
    }

    pub fn strategy_principal(&self, pair: PairId, strategy: StrategyId) -> Amount {
        self.storage.principal_of(pair, strategy)
    }

    pub fn last_rebalance(&self, pair: PairId) -> VaultResult<u64> {
        Ok(self.storage.pair(pair)?.last_rebalance)
    }

    pub fn is_keeper(&self, account: Address) -> bool {
        self.storage.access.keepers.contains(&account)
    }

    pub fn owner(&self) -> Address {
        self.storage.access.owner
    }

    pub fn is_paused(&self) -> bool {
        self.storage.access.paused
    }

    pub fn flash_boost(&self, pair: PairId) -> Option<&FlashBoostState> {
        self.storage.flash_boosts.get(&pair)
    }

    pub fn strategies(&self, pair: PairId) -> VaultResult<&[StrategyId]> {
        Ok(&self.storage.pair(pair)?.strategies)
    }

    pub fn strategy_adapter(&self, strategy: StrategyId) -> Option<Arc<dyn StrategyAdapter>> {
        self.registry.get(strategy).cloned()
    }

    /// Idle balances plus every registered strategy's reported balance.
    /// Deposits and withdrawals both price shares with this.
    pub fn vault_value(&self, pair: PairId) -> VaultResult<Amount> {
        let record = self.storage.pair(pair)?;
        let mut value = record.idle.total();
        for &id in &record.strategies {
            value = value
                .checked_add(self.adapter(id)?.current_balance())
                .ok_or(router_math::MathError::Overflow)?;
        }
        Ok(value)
    }

    pub fn pair_snapshot(&self, pair: PairId) -> VaultResult<PairSnapshot> {
        let record = self.storage.pair(pair)?;
        let vault_value = self.vault_value(pair)?;
        let strategies = record
            .strategies
            .iter()
            .map(|&id| {
                let adapter = self.adapter(id)?;
                let apy = adapter.current_apy();
                Ok(StrategySnapshot {
                    id,
                    name: adapter.name().to_string(),
                    principal: self.storage.principal_of(pair, id),
                    balance: adapter.current_balance(),
                    apy,
                    apy_percent: ApyMath::bps_to_percent(apy),
                })
            })
            .collect::<VaultResult<Vec<_>>>()?;

        Ok(PairSnapshot {
            id: pair,
            token0: record.token0,
            token1: record.token1,
            total_shares: record.total_shares,
            vault_value,
            idle: record.idle,
            pending_yield: record.pending_yield,
            last_rebalance: record.last_rebalance,
            share_price: ShareMath::share_price(record.total_shares, vault_value),
            strategies,
            flash_boost: self.storage.flash_boosts.get(&pair).cloned(),
            liquidity_receipt: record.liquidity_receipt,
        })
    }

    // ---- persistence ----

    /// Serialize the persisted schema
    pub fn snapshot(&self) -> VaultResult<Vec<u8>> {
        Ok(self.storage.snapshot()?)
    }

    /// Replace the persisted schema with `snapshot`.
    ///
    /// The strategy arena is not part of the snapshot: every strategy the
    /// snapshot references must already be registered on this engine under
    /// the same handle. On failure the engine is unchanged.
    pub fn restore(&mut self, snapshot: &[u8]) -> VaultResult<()> {
        let mut candidate = self.storage.clone();
        candidate.restore(snapshot)?;

        for record in candidate.pairs.values() {
            for &id in &record.strategies {
                if self.registry.get(id).is_none() {
                    return Err(StateError::ValidationFailed {
                        reason: format!("{} of {} is not registered", id, record.id),
                    }
                    .into());
                }
            }
        }

        self.registry.detach_all();
        for record in candidate.pairs.values() {
            for &id in &record.strategies {
                self.registry.attach(id, record.id);
            }
        }
        self.storage = candidate;
        debug!(pairs = self.storage.pairs.len(), "Vault state restored");
        Ok(())
    }
}

impl std::fmt::Debug for VaultEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultEngine")
            .field("address", &self.address)
            .field("storage", &self.storage)
            .field("registry", &self.registry)
            .field("policy", &self.policy.name())
            .field("venue_set", &self.venue.is_some())
            .finish()
    }
}
