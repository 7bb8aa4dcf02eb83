//! Notifications emitted by the vault
//!
//! Every state change a client might want to index is a [`VaultEvent`].
//! Events are plain data; delivery is the concern of the engine's sinks.

use crate::{Address, Amount, AssetId, PairId, StrategyId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VaultEvent {
    PairAdded {
        pair: PairId,
        token0: AssetId,
        token1: AssetId,
    },
    StrategyAdded {
        pair: PairId,
        strategy: StrategyId,
    },
    StrategyRemoved {
        pair: PairId,
        strategy: StrategyId,
    },
    /// Share balance of `account` changed
    XpUpdated {
        pair: PairId,
        account: Address,
        shares: Amount,
        total_shares: Amount,
    },
    FeeCollected {
        pair: PairId,
        amount: Amount,
        total_fees: Amount,
    },
    StrategyRebalanced {
        pair: PairId,
        from: Vec<StrategyId>,
        to: StrategyId,
        amount: Amount,
        fee: Amount,
    },
    FlashBoostStarted {
        pair: PairId,
        strategy: StrategyId,
        percent: u8,
        amount: Amount,
    },
    FlashBoostEnded {
        pair: PairId,
        strategy: StrategyId,
        returned: Amount,
        fee: Amount,
    },
    Paused {
        by: Address,
    },
    Unpaused {
        by: Address,
    },
}

impl VaultEvent {
    /// Canonical event name
    pub fn name(&self) -> &'static str {
        match self {
            VaultEvent::PairAdded { .. } => "PairAdded",
            VaultEvent::StrategyAdded { .. } => "StrategyAdded",
            VaultEvent::StrategyRemoved { .. } => "StrategyRemoved",
            VaultEvent::XpUpdated { .. } => "XPUpdated",
            VaultEvent::FeeCollected { .. } => "FeeCollected",
            VaultEvent::StrategyRebalanced { .. } => "StrategyRebalanced",
            VaultEvent::FlashBoostStarted { .. } => "FlashBoostStarted",
            VaultEvent::FlashBoostEnded { .. } => "FlashBoostEnded",
            VaultEvent::Paused { .. } => "Paused",
            VaultEvent::Unpaused { .. } => "Unpaused",
        }
    }

    /// Pair the event belongs to, if any
    pub fn pair(&self) -> Option<PairId> {
        match self {
            VaultEvent::PairAdded { pair, .. }
            | VaultEvent::StrategyAdded { pair, .. }
            | VaultEvent::StrategyRemoved { pair, .. }
            | VaultEvent::XpUpdated { pair, .. }
            | VaultEvent::FeeCollected { pair, .. }
            | VaultEvent::StrategyRebalanced { pair, .. }
            | VaultEvent::FlashBoostStarted { pair, .. }
            | VaultEvent::FlashBoostEnded { pair, .. } => Some(*pair),
            VaultEvent::Paused { .. } | VaultEvent::Unpaused { .. } => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
