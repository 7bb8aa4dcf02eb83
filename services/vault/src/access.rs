//! Authorization guards and owner-only configuration
//!
//! Every mutator names its caller explicitly. The owner configures pairs,
//! strategies, fees and roles; keepers run capital movements; the pause flag
//! stops every value-moving entry point while leaving reads available.

use crate::adapters::{StrategyAdapter, SwapVenue, Treasury};
use crate::engine::VaultEngine;
use crate::errors::{VaultError, VaultResult};
use crate::logging::LogEmoji;
use crate::storage::PairRecord;
use router_config::constants::fees::MAX_PROTOCOL_FEE_BPS;
use router_types::{Address, AssetId, Bps, PairId, StrategyId, VaultEvent};
use std::sync::Arc;
use tracing::info;

impl VaultEngine {
    pub(crate) fn ensure_owner(&self, caller: Address) -> VaultResult<()> {
        if caller != self.storage.access.owner {
            return Err(VaultError::NotOwner(caller));
        }
        Ok(())
    }

    pub(crate) fn ensure_keeper(&self, caller: Address) -> VaultResult<()> {
        if !self.is_keeper(caller) {
            return Err(VaultError::NotKeeper(caller));
        }
        Ok(())
    }

    /// Owner or keeper
    pub(crate) fn ensure_operator(&self, caller: Address) -> VaultResult<()> {
        if caller == self.storage.access.owner || self.is_keeper(caller) {
            return Ok(());
        }
        Err(VaultError::NotKeeper(caller))
    }

    /// Rebalance and upkeep are open to anyone unless automation is restricted
    pub(crate) fn ensure_automation(&self, caller: Address) -> VaultResult<()> {
        if self.storage.settings.permissionless_automation {
            return Ok(());
        }
        self.ensure_operator(caller)
    }

    pub(crate) fn ensure_not_paused(&self) -> VaultResult<()> {
        if self.storage.access.paused {
            return Err(VaultError::Paused);
        }
        Ok(())
    }

    // ---- pairs and strategies ----

    /// Register a pair over `token0`/`token1` (identical for single-asset pairs)
    pub fn add_pair(
        &mut self,
        caller: Address,
        token0: AssetId,
        token1: AssetId,
    ) -> VaultResult<PairId> {
        self.ensure_owner(caller)?;
        let id = self.storage.next_pair_id;
        self.storage
            .pairs
            .insert(id, PairRecord::new(id, token0, token1));
        self.storage.next_pair_id = id.next();

        info!(pair = %id, token0 = %token0, token1 = %token1, "Pair added");
        self.emit(VaultEvent::PairAdded {
            pair: id,
            token0,
            token1,
        });
        Ok(id)
    }

    pub fn set_liquidity_receipt(
        &mut self,
        caller: Address,
        pair: PairId,
        receipt: AssetId,
    ) -> VaultResult<()> {
        self.ensure_owner(caller)?;
        self.storage.pair_mut(pair)?.liquidity_receipt = Some(receipt);
        Ok(())
    }

    /// Attach `adapter` to `pair`. The same adapter may not serve two pairs
    /// or appear twice on one.
    pub fn add_strategy(
        &mut self,
        caller: Address,
        pair: PairId,
        adapter: Arc<dyn StrategyAdapter>,
    ) -> VaultResult<StrategyId> {
        self.ensure_owner(caller)?;
        let count = self.storage.pair(pair)?.strategies.len();

        if let Some(existing) = self.registry.find(&adapter) {
            if self.registry.pair_of(existing).is_some() {
                return Err(VaultError::StrategyAlreadyRegistered);
            }
        }
        let max = self.storage.settings.max_strategies_per_pair as usize;
        if count >= max {
            return Err(VaultError::TooManyStrategies { pair, max });
        }

        let name = adapter.name().to_string();
        let id = self.registry.insert(adapter);
        self.registry.attach(id, pair);
        self.storage.pair_mut(pair)?.strategies.push(id);

        info!(pair = %pair, strategy = %id, name = %name, "Strategy added");
        self.emit(VaultEvent::StrategyAdded { pair, strategy: id });
        Ok(id)
    }

    /// Detach an empty strategy from `pair`
    pub fn remove_strategy(
        &mut self,
        caller: Address,
        pair: PairId,
        strategy: StrategyId,
    ) -> VaultResult<()> {
        self.ensure_owner(caller)?;
        let adapter = self.pair_adapter(pair, strategy)?;
        if self
            .storage
            .flash_boosts
            .get(&pair)
            .is_some_and(|boost| boost.involves(strategy))
        {
            return Err(VaultError::FlashBoostActive(pair));
        }
        if self.storage.principal_of(pair, strategy) != 0 || adapter.current_balance() != 0 {
            return Err(VaultError::StrategyNotEmpty(strategy));
        }

        self.storage
            .pair_mut(pair)?
            .strategies
            .retain(|&id| id != strategy);
        self.registry.detach(strategy);

        info!(pair = %pair, strategy = %strategy, "Strategy removed");
        self.emit(VaultEvent::StrategyRemoved { pair, strategy });
        Ok(())
    }

    // ---- collaborators ----

    pub fn set_router(&mut self, caller: Address, venue: Arc<dyn SwapVenue>) -> VaultResult<()> {
        self.ensure_owner(caller)?;
        self.venue = Some(venue);
        info!("Swap router updated");
        Ok(())
    }

    pub fn set_treasury(&mut self, caller: Address, treasury: Arc<dyn Treasury>) -> VaultResult<()> {
        self.ensure_owner(caller)?;
        self.storage.fees.treasury = treasury.address();
        self.treasury = treasury;
        info!(treasury = %self.storage.fees.treasury, "Treasury updated");
        Ok(())
    }

    // ---- fees and roles ----

    pub fn set_protocol_fee(&mut self, caller: Address, fee_bps: Bps) -> VaultResult<()> {
        self.ensure_owner(caller)?;
        if fee_bps > MAX_PROTOCOL_FEE_BPS {
            return Err(VaultError::FeeTooHigh {
                requested: fee_bps,
                max: MAX_PROTOCOL_FEE_BPS,
            });
        }
        self.storage.fees.protocol_fee_bps = fee_bps;
        info!(fee_bps, "Protocol fee updated");
        Ok(())
    }

    pub fn set_keeper(&mut self, caller: Address, keeper: Address, enabled: bool) -> VaultResult<()> {
        self.ensure_owner(caller)?;
        if enabled {
            self.storage.access.keepers.insert(keeper);
        } else {
            self.storage.access.keepers.remove(&keeper);
        }
        info!("{} Keeper {} {}", LogEmoji::LOCK, keeper, if enabled { "granted" } else { "revoked" });
        Ok(())
    }

    pub fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> VaultResult<()> {
        self.ensure_owner(caller)?;
        self.storage.access.owner = new_owner;
        info!("{} Ownership transferred {} -> {}", LogEmoji::LOCK, caller, new_owner);
        Ok(())
    }

    pub fn pause(&mut self, caller: Address) -> VaultResult<()> {
        self.ensure_owner(caller)?;
        self.storage.access.paused = true;
        info!("{} Vault paused by {}", LogEmoji::LOCK, caller);
        self.emit(VaultEvent::Paused { by: caller });
        Ok(())
    }

    pub fn unpause(&mut self, caller: Address) -> VaultResult<()> {
        self.ensure_owner(caller)?;
        self.storage.access.paused = false;
        info!("{} Vault unpaused by {}", LogEmoji::LOCK, caller);
        self.emit(VaultEvent::Unpaused { by: caller });
        Ok(())
    }

    // ---- rebalance and flash boost settings ----

    pub fn set_min_rebalance_interval(&mut self, caller: Address, secs: u64) -> VaultResult<()> {
        self.ensure_owner(caller)?;
        self.storage.settings.min_rebalance_interval_secs = secs;
        info!("{} Minimum rebalance interval set to {}s", LogEmoji::CLOCK, secs);
        Ok(())
    }

    pub fn set_rebalance_threshold(&mut self, caller: Address, threshold_bps: Bps) -> VaultResult<()> {
        self.ensure_owner(caller)?;
        self.storage.settings.improvement_threshold_bps = threshold_bps;
        info!(threshold_bps, "Rebalance improvement threshold updated");
        Ok(())
    }

    pub fn set_flash_boost_enabled(&mut self, caller: Address, enabled: bool) -> VaultResult<()> {
        self.ensure_owner(caller)?;
        self.storage.settings.flash_boost_enabled = enabled;
        info!(enabled, "Flash boost toggled");
        Ok(())
    }

    pub fn set_flash_strategy_whitelist(
        &mut self,
        caller: Address,
        strategy: StrategyId,
        allowed: bool,
    ) -> VaultResult<()> {
        self.ensure_owner(caller)?;
        let whitelist = &mut self.storage.settings.flash_whitelist;
        if allowed {
            whitelist.insert(strategy);
        } else {
            whitelist.remove(&strategy);
        }
        info!(strategy = %strategy, allowed, "Flash boost whitelist updated");
        Ok(())
    }
}
