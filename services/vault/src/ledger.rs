//! Principal ledger and idle balances
//!
//! Principal is capital the vault knowingly placed into a strategy. It moves
//! only when the vault moves capital, never because a strategy reports a new
//! balance, so `balance - principal` is always the unrealized yield.

use crate::storage::VaultStorage;
use router_math::{mul_div, MathError};
use router_types::{Amount, PairId, StrategyId};
use serde::{Deserialize, Serialize};

/// Undeployed value held by a pair, per underlying asset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdleBalances {
    pub token0: Amount,
    pub token1: Amount,
}

impl IdleBalances {
    #[inline]
    pub fn total(&self) -> Amount {
        self.token0.saturating_add(self.token1)
    }

    /// Split `amount` across both assets in proportion to their balances.
    /// Rounding favours token1 so neither leg can exceed its balance.
    pub fn split(&self, amount: Amount) -> Result<(Amount, Amount), MathError> {
        let total = self.total();
        if amount > total {
            return Err(MathError::Overflow);
        }
        if total == 0 {
            return Ok((0, 0));
        }
        let from0 = mul_div(amount, self.token0, total)?;
        Ok((from0, amount - from0))
    }

    /// Remove a pro-rata `amount`, returning what came out of each asset
    pub fn draw(&mut self, amount: Amount) -> Result<(Amount, Amount), MathError> {
        let (from0, from1) = self.split(amount)?;
        self.token0 -= from0;
        self.token1 -= from1;
        Ok((from0, from1))
    }
}

impl VaultStorage {
    pub fn principal_of(&self, pair: PairId, strategy: StrategyId) -> Amount {
        self.principal.get(&(pair, strategy)).copied().unwrap_or(0)
    }

    /// Zero entries are dropped so the map only lists live positions
    pub fn set_principal(&mut self, pair: PairId, strategy: StrategyId, amount: Amount) {
        if amount == 0 {
            self.principal.remove(&(pair, strategy));
        } else {
            self.principal.insert((pair, strategy), amount);
        }
    }

    pub fn add_principal(&mut self, pair: PairId, strategy: StrategyId, amount: Amount) {
        let current = self.principal_of(pair, strategy);
        self.set_principal(pair, strategy, current.saturating_add(amount));
    }

    pub fn reduce_principal(&mut self, pair: PairId, strategy: StrategyId, amount: Amount) {
        let current = self.principal_of(pair, strategy);
        self.set_principal(pair, strategy, current.saturating_sub(amount));
    }

    /// Principal placed across every strategy of `pair`, optionally skipping one
    pub fn deployed_principal(&self, pair: PairId, except: Option<StrategyId>) -> Amount {
        self.principal
            .range((pair, StrategyId::new(0))..=(pair, StrategyId::new(u32::MAX)))
            .filter(|((_, strategy), _)| Some(*strategy) != except)
            .map(|(_, amount)| *amount)
            .sum()
    }
}
