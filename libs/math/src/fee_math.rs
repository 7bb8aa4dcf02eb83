//! Yield attribution and fee skimming
//!
//! Yield is always measured against tracked principal, never inferred from a
//! reported balance alone. A strategy that has lost value reports zero yield,
//! so the fee on a loss is zero rather than negative.

use crate::{mul_div, MathError};
use router_types::{Amount, Bps, BPS_DENOMINATOR};

/// A pulled amount attributed between principal and yield
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct YieldSplit {
    pub principal: Amount,
    pub yield_amount: Amount,
}

pub struct FeeMath;

impl FeeMath {
    /// `max(gross - principal, 0)`
    #[inline]
    pub fn yield_component(gross: Amount, principal: Amount) -> Amount {
        gross.saturating_sub(principal)
    }

    /// `yield * fee_bps / 10_000`, rounded down
    pub fn fee_on_yield(yield_amount: Amount, fee_bps: Bps) -> Result<Amount, MathError> {
        mul_div(yield_amount, fee_bps as Amount, BPS_DENOMINATOR)
    }

    /// Fee owed when `gross` comes back from a position with `principal` placed
    pub fn skim_amount(gross: Amount, principal: Amount, fee_bps: Bps) -> Result<Amount, MathError> {
        Self::fee_on_yield(Self::yield_component(gross, principal), fee_bps)
    }

    /// Attribute a partial pull of `amount` out of a position reporting
    /// `balance` with `principal` placed. The yield share is pro-rata to the
    /// position's yield, and principal absorbs the rounding remainder.
    pub fn split_pull(
        amount: Amount,
        balance: Amount,
        principal: Amount,
    ) -> Result<YieldSplit, MathError> {
        if balance == 0 {
            return Ok(YieldSplit {
                principal: amount.min(principal),
                yield_amount: 0,
            });
        }
        let total_yield = Self::yield_component(balance, principal);
        let yield_amount = mul_div(amount, total_yield, balance)?;
        let principal_part = (amount - yield_amount).min(principal);
        Ok(YieldSplit {
            principal: principal_part,
            yield_amount: amount - principal_part,
        })
    }

    /// `value * percent / 100`, rounded down. `percent` must not exceed 100.
    pub fn percent_of(value: Amount, percent: u8) -> Result<Amount, MathError> {
        if percent > 100 {
            return Err(MathError::PercentOutOfRange(percent as u32));
        }
        mul_div(value, percent as Amount, 100)
    }

    /// Minimum acceptable output for an `expected` quote under `slippage_bps`
    pub fn min_amount_out(expected: Amount, slippage_bps: Bps) -> Result<Amount, MathError> {
        if slippage_bps as Amount > BPS_DENOMINATOR {
            return Err(MathError::PercentOutOfRange(slippage_bps));
        }
        mul_div(expected, BPS_DENOMINATOR - slippage_bps as Amount, BPS_DENOMINATOR)
    }

    /// Portion of `amount` in basis points
    pub fn bps_of(amount: Amount, bps: Bps) -> Result<Amount, MathError> {
        mul_div(amount, bps as Amount, BPS_DENOMINATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_only_on_yield() {
        // 1100 back on 1000 principal at 2%: fee is 2, not 22
        assert_eq!(FeeMath::skim_amount(1_100, 1_000, 200).unwrap(), 2);
        assert_eq!(FeeMath::skim_amount(300, 200, 300).unwrap(), 3);
    }

    #[test]
    fn test_no_fee_on_loss_or_flat() {
        assert_eq!(FeeMath::skim_amount(900, 1_000, 500).unwrap(), 0);
        assert_eq!(FeeMath::skim_amount(1_000, 1_000, 500).unwrap(), 0);
    }

    #[test]
    fn test_split_partial_pull() {
        // Position: 1100 balance, 1000 principal. Pull 550 => 50 yield, 500 principal
        let split = FeeMath::split_pull(550, 1_100, 1_000).unwrap();
        assert_eq!(split.yield_amount, 50);
        assert_eq!(split.principal, 500);
    }

    #[test]
    fn test_split_full_pull_matches_yield_component() {
        let split = FeeMath::split_pull(1_100, 1_100, 1_000).unwrap();
        assert_eq!(split.yield_amount, 100);
        assert_eq!(split.principal, 1_000);
    }

    #[test]
    fn test_split_untracked_balance_is_all_yield() {
        let split = FeeMath::split_pull(40, 100, 0).unwrap();
        assert_eq!(split.principal, 0);
        assert_eq!(split.yield_amount, 40);
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(FeeMath::percent_of(1_000, 20).unwrap(), 200);
        assert_eq!(FeeMath::percent_of(999, 25).unwrap(), 249);
        assert!(FeeMath::percent_of(1_000, 101).is_err());
    }

    #[test]
    fn test_min_amount_out() {
        assert_eq!(FeeMath::min_amount_out(500, 30).unwrap(), 498);
        assert_eq!(FeeMath::min_amount_out(500, 0).unwrap(), 500);
        assert!(FeeMath::min_amount_out(500, 10_001).is_err());
    }
}
