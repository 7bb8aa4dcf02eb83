//! Persisted vault schema
//!
//! Everything the vault must remember lives in [`VaultStorage`]: pairs, share
//! balances, the principal ledger, fee state, active flash boosts, access
//! control and the mutable settings. Behaviour (strategy adapters, swap venue,
//! treasury, rebalance policy) is held by the engine outside this struct, so a
//! snapshot taken by one build restores into another unchanged.

use crate::errors::{StateError, VaultError, VaultResult};
use crate::ledger::IdleBalances;
use router_config::VaultConfig;
use router_types::{Address, Amount, AssetId, Bps, PairId, StrategyId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Bumped whenever a field is added to or removed from the schema
pub const SCHEMA_VERSION: u16 = 1;

/// Components whose full state can be captured and reinstated
pub trait Stateful {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create a snapshot of the current state
    fn snapshot(&self) -> Result<Vec<u8>, Self::Error>;

    /// Restore state from a snapshot
    fn restore(&mut self, snapshot: &[u8]) -> Result<(), Self::Error>;
}

/// A pooled vault over one or two assets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairRecord {
    pub id: PairId,
    pub token0: AssetId,
    pub token1: AssetId,
    pub total_shares: Amount,
    pub liquidity_receipt: Option<AssetId>,
    pub last_rebalance: u64,
    /// Registration order; index 0 wins APY ties
    pub strategies: Vec<StrategyId>,
    pub idle: IdleBalances,
    /// Realized yield sitting in `idle` that has not been charged yet
    pub pending_yield: Amount,
}

impl PairRecord {
    pub fn new(id: PairId, token0: AssetId, token1: AssetId) -> Self {
        Self {
            id,
            token0,
            token1,
            total_shares: 0,
            liquidity_receipt: None,
            last_rebalance: 0,
            strategies: Vec::new(),
            idle: IdleBalances::default(),
            pending_yield: 0,
        }
    }

    #[inline]
    pub fn is_single_asset(&self) -> bool {
        self.token0 == self.token1
    }

    #[inline]
    pub fn holds_strategy(&self, strategy: StrategyId) -> bool {
        self.strategies.contains(&strategy)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeState {
    pub protocol_fee_bps: Bps,
    pub treasury: Address,
    /// Sum of every fee transfer ever made; never decreases
    pub total_fees_collected: Amount,
}

/// A temporary excursion into a whitelisted strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashBoostState {
    pub strategy: StrategyId,
    pub percent: u8,
    /// Boosted strategy principal right after the move
    pub principal_snapshot: Amount,
    pub started_at: u64,
    /// Where the boosted capital came from and how much each gave
    pub sources: Vec<(StrategyId, Amount)>,
}

impl FlashBoostState {
    pub fn moved_total(&self) -> Amount {
        self.sources.iter().map(|(_, amount)| *amount).sum()
    }

    pub fn involves(&self, strategy: StrategyId) -> bool {
        self.strategy == strategy || self.sources.iter().any(|(id, _)| *id == strategy)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessState {
    pub owner: Address,
    pub keepers: BTreeSet<Address>,
    pub paused: bool,
}

/// Owner-tunable settings, seeded from [`VaultConfig`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSettings {
    pub min_rebalance_interval_secs: u64,
    pub improvement_threshold_bps: Bps,
    pub permissionless_automation: bool,
    pub max_strategies_per_pair: u32,
    pub flash_boost_enabled: bool,
    pub flash_boost_max_percent: u8,
    pub flash_boost_max_duration_secs: u64,
    pub flash_whitelist: BTreeSet<StrategyId>,
    pub default_slippage_bps: Bps,
    pub swap_deadline_secs: u64,
}

impl VaultSettings {
    pub fn from_config(config: &VaultConfig) -> Self {
        Self {
            min_rebalance_interval_secs: config.rebalance.min_interval_secs,
            improvement_threshold_bps: config.rebalance.improvement_threshold_bps,
            permissionless_automation: config.rebalance.permissionless,
            max_strategies_per_pair: config.rebalance.max_strategies_per_pair as u32,
            flash_boost_enabled: config.flash_boost.enabled,
            flash_boost_max_percent: config.flash_boost.max_percent,
            flash_boost_max_duration_secs: config.flash_boost.max_duration_secs,
            flash_whitelist: BTreeSet::new(),
            default_slippage_bps: config.deposit.default_slippage_bps,
            swap_deadline_secs: config.deposit.swap_deadline_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultStorage {
    pub pairs: BTreeMap<PairId, PairRecord>,
    pub next_pair_id: PairId,
    pub user_shares: BTreeMap<(PairId, Address), Amount>,
    pub principal: BTreeMap<(PairId, StrategyId), Amount>,
    pub fees: FeeState,
    pub flash_boosts: BTreeMap<PairId, FlashBoostState>,
    pub access: AccessState,
    pub settings: VaultSettings,
}

impl VaultStorage {
    pub fn new(owner: Address, treasury: Address, config: &VaultConfig) -> Self {
        Self {
            pairs: BTreeMap::new(),
            next_pair_id: PairId::new(0),
            user_shares: BTreeMap::new(),
            principal: BTreeMap::new(),
            fees: FeeState {
                protocol_fee_bps: config.fees.protocol_fee_bps,
                treasury,
                total_fees_collected: 0,
            },
            flash_boosts: BTreeMap::new(),
            access: AccessState {
                owner,
                keepers: BTreeSet::new(),
                paused: false,
            },
            settings: VaultSettings::from_config(config),
        }
    }

    pub fn pair(&self, pair: PairId) -> VaultResult<&PairRecord> {
        self.pairs.get(&pair).ok_or(VaultError::PairNotFound(pair))
    }

    pub fn pair_mut(&mut self, pair: PairId) -> VaultResult<&mut PairRecord> {
        self.pairs.get_mut(&pair).ok_or(VaultError::PairNotFound(pair))
    }

    pub fn shares_of(&self, pair: PairId, account: Address) -> Amount {
        self.user_shares.get(&(pair, account)).copied().unwrap_or(0)
    }

    /// Structural invariants every committed state satisfies
    pub fn check_invariants(&self) -> Result<(), StateError> {
        for (id, record) in &self.pairs {
            let held: Amount = self
                .user_shares
                .range((*id, Address::ZERO)..)
                .take_while(|((pair, _), _)| pair == id)
                .map(|(_, shares)| *shares)
                .sum();
            if held != record.total_shares {
                return Err(StateError::ValidationFailed {
                    reason: format!(
                        "{} total_shares {} but holders sum to {}",
                        id, record.total_shares, held
                    ),
                });
            }
        }
        if let Some((pair, _)) = self
            .principal
            .keys()
            .find(|(pair, strategy)| {
                self.pairs
                    .get(pair)
                    .map_or(true, |record| !record.holds_strategy(*strategy))
            })
        {
            return Err(StateError::ValidationFailed {
                reason: format!("principal recorded for unregistered strategy on {}", pair),
            });
        }
        if self.fees.protocol_fee_bps > router_config::constants::fees::MAX_PROTOCOL_FEE_BPS {
            return Err(StateError::ValidationFailed {
                reason: format!("protocol fee {} above ceiling", self.fees.protocol_fee_bps),
            });
        }
        Ok(())
    }
}

impl Stateful for VaultStorage {
    type Error = StateError;

    fn snapshot(&self) -> Result<Vec<u8>, StateError> {
        Ok(bincode::serialize(&(SCHEMA_VERSION, self))?)
    }

    fn restore(&mut self, snapshot: &[u8]) -> Result<(), StateError> {
        let version: u16 = bincode::deserialize(snapshot)?;
        if version != SCHEMA_VERSION {
            return Err(StateError::SchemaVersion {
                expected: SCHEMA_VERSION,
                found: version,
            });
        }
        let (_, storage): (u16, VaultStorage) = bincode::deserialize(snapshot)?;
        storage.check_invariants()?;
        *self = storage;
        Ok(())
    }
}
