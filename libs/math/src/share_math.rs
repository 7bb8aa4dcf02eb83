//! Share minting and burning
//!
//! Ownership is late-bound: a holder's claim is `shares * vault_value /
//! total_shares` evaluated at the moment of withdrawal, never a stored price.
//! Both directions round down so neither a depositor nor a withdrawer can
//! extract more than their proportional value.

use crate::{mul_div, MathError};
use router_types::Amount;
use rust_decimal::Decimal;

pub struct ShareMath;

impl ShareMath {
    /// Shares to issue for `deposit_value` given the pool state *before* the deposit.
    ///
    /// Bootstrap (`total_shares == 0`) issues shares 1:1 with value. A pool that
    /// has shares outstanding but zero value cannot price new shares and
    /// returns [`MathError::DivisionByZero`].
    pub fn shares_for_deposit(
        deposit_value: Amount,
        total_shares: Amount,
        vault_value_before: Amount,
    ) -> Result<Amount, MathError> {
        if total_shares == 0 {
            return Ok(deposit_value);
        }
        mul_div(deposit_value, total_shares, vault_value_before)
    }

    /// Value released by burning `shares` out of `total_shares`
    pub fn value_for_shares(
        shares: Amount,
        total_shares: Amount,
        vault_value: Amount,
    ) -> Result<Amount, MathError> {
        mul_div(shares, vault_value, total_shares)
    }

    /// Value per share for display. An empty pool prices at 1; values beyond
    /// `Decimal` range yield `None`.
    pub fn share_price(total_shares: Amount, vault_value: Amount) -> Option<Decimal> {
        if total_shares == 0 {
            return Some(Decimal::ONE);
        }
        let to_decimal = |v: Amount| {
            i128::try_from(v)
                .ok()
                .and_then(|v| Decimal::try_from_i128_with_scale(v, 0).ok())
        };
        to_decimal(vault_value)?.checked_div(to_decimal(total_shares)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bootstrap_is_one_to_one() {
        assert_eq!(ShareMath::shares_for_deposit(1_000, 0, 0).unwrap(), 1_000);
    }

    #[test]
    fn test_proportional_mint_after_yield() {
        // 1000 shares backed by 1100 value: 550 value buys 500 shares
        assert_eq!(ShareMath::shares_for_deposit(550, 1_000, 1_100).unwrap(), 500);
    }

    #[test]
    fn test_mint_rounds_down() {
        assert_eq!(ShareMath::shares_for_deposit(1, 1_000, 1_100).unwrap(), 0);
    }

    #[test]
    fn test_unpriceable_pool() {
        assert_eq!(
            ShareMath::shares_for_deposit(10, 1_000, 0),
            Err(MathError::DivisionByZero)
        );
    }

    #[test]
    fn test_burn_value() {
        assert_eq!(ShareMath::value_for_shares(500, 1_000, 1_097).unwrap(), 548);
        assert_eq!(ShareMath::value_for_shares(1_000, 1_000, 1_097).unwrap(), 1_097);
    }

    #[test]
    fn test_share_price() {
        assert_eq!(ShareMath::share_price(0, 0), Some(Decimal::ONE));
        assert_eq!(ShareMath::share_price(1_000, 1_100), Some(dec!(1.1)));
        assert_eq!(ShareMath::share_price(1, u128::MAX), None);
    }
}
