//! Automation interface
//!
//! An external scheduler polls [`VaultEngine::check_upkeep`] and forwards the
//! returned payload to [`VaultEngine::perform_upkeep`]. The check never
//! mutates. Perform re-evaluates from scratch, so a stale or replayed payload
//! is a no-op rather than a second move.

use crate::engine::VaultEngine;
use crate::errors::{VaultError, VaultResult};
use crate::{log_execution, log_search};
use router_types::{Address, PairId};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpkeepAction {
    Rebalance,
    /// Settle a flash boost that ran past its maximum duration
    UnwindFlashBoost,
}

/// Work order handed from `check_upkeep` to `perform_upkeep`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpkeepPayload {
    pub pair: PairId,
    pub action: UpkeepAction,
}

impl UpkeepPayload {
    pub fn encode(&self) -> VaultResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| VaultError::InvalidPayload(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> VaultResult<Self> {
        bincode::deserialize(bytes).map_err(|e| VaultError::InvalidPayload(e.to_string()))
    }
}

impl VaultEngine {
    /// The action `pair` needs right now, if any
    pub fn upkeep_action(&self, pair: PairId) -> VaultResult<Option<UpkeepAction>> {
        self.storage.pair(pair)?;
        if self.is_paused() {
            return Ok(None);
        }
        if self.is_flash_boost_expired(pair) {
            return Ok(Some(UpkeepAction::UnwindFlashBoost));
        }
        if self.plan_rebalance(pair)?.is_some() {
            return Ok(Some(UpkeepAction::Rebalance));
        }
        Ok(None)
    }

    /// `(needed, payload)`. The payload is empty when nothing is needed.
    pub fn check_upkeep(&self, pair: PairId) -> VaultResult<(bool, Vec<u8>)> {
        match self.upkeep_action(pair)? {
            Some(action) => {
                let payload = UpkeepPayload { pair, action }.encode()?;
                log_search!("Upkeep needed on {}: {:?} ({})", pair, action, hex::encode(&payload));
                Ok((true, payload))
            }
            None => Ok((false, Vec::new())),
        }
    }

    /// Act on a payload from [`check_upkeep`](Self::check_upkeep). Returns the
    /// action taken, or `None` when the pair no longer needs it.
    pub fn perform_upkeep(&mut self, caller: Address, payload: &[u8]) -> VaultResult<Option<UpkeepAction>> {
        self.ensure_not_paused()?;
        let payload = UpkeepPayload::decode(payload)?;
        self.storage.pair(payload.pair)?;
        self.ensure_automation(caller)?;

        let pair = payload.pair;
        match payload.action {
            UpkeepAction::UnwindFlashBoost => {
                if !self.is_flash_boost_expired(pair) {
                    debug!(pair = %pair, "Boost unwind no longer due");
                    return Ok(None);
                }
                let settlement = self.unwind_flash_boost(pair)?;
                log_execution!("Upkeep unwound expired boost on {} (fee {})", pair, settlement.fee);
            }
            UpkeepAction::Rebalance => {
                let Some(plan) = self.plan_rebalance(pair)? else {
                    debug!(pair = %pair, "Rebalance no longer due");
                    return Ok(None);
                };
                self.execute_rebalance(pair, plan)?;
            }
        }
        Ok(Some(payload.action))
    }
}
