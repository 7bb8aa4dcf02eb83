//! # Yield Router Math - Exact Vault Accounting Arithmetic
//!
//! ## Purpose
//!
//! Integer arithmetic underpinning every value movement in the vault: share
//! minting and burning, yield attribution against tracked principal, fee
//! skimming in basis points, APY hysteresis comparison, and constant-product
//! quoting for single-sided deposit conversion. All functions are pure and
//! round down, so residual dust always stays inside the vault.
//!
//! ## Integration Points
//!
//! - **Input Sources**: vault ledgers (principal, idle balances, share supply),
//!   strategy adapters (reported balances and APY), swap venue reserves
//! - **Output Destinations**: share accounting, fee engine, rebalancing policy,
//!   flash boost sizing, simulated swap venue
//! - **Precision**: `u128` base units end to end; `Decimal` only for
//!   display-grade values such as share price and APY percentages
//! - **Validation**: every multiplication is checked, overflow surfaces as
//!   [`MathError::Overflow`] rather than wrapping
//!
//! ## Architecture Role
//!
//! ```text
//! Ledgers / Adapters → [router-math] → Engine decisions
//!        ↓                  ↓                 ↓
//! total_shares        ShareMath         mint / burn amounts
//! principal           FeeMath           fee, net, yield split
//! current_apy         ApyMath           rebalance or not
//! reserves            V2Math            simulated swap output
//! ```

pub mod apy;
pub mod errors;
pub mod fee_math;
pub mod share_math;
pub mod v2_math;

pub use apy::ApyMath;
pub use errors::MathError;
pub use fee_math::{FeeMath, YieldSplit};
pub use share_math::ShareMath;
pub use v2_math::{V2Math, V2PoolState};

use router_types::Amount;

/// `a * b / denominator`, rounded down, with overflow and zero checks
#[inline]
pub fn mul_div(a: Amount, b: Amount, denominator: Amount) -> Result<Amount, MathError> {
    if denominator == 0 {
        return Err(MathError::DivisionByZero);
    }
    a.checked_mul(b)
        .map(|product| product / denominator)
        .ok_or(MathError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_rounds_down() {
        assert_eq!(mul_div(10, 3, 4).unwrap(), 7);
        assert_eq!(mul_div(1, 1, 3).unwrap(), 0);
    }

    #[test]
    fn test_mul_div_errors() {
        assert_eq!(mul_div(1, 1, 0), Err(MathError::DivisionByZero));
        assert_eq!(mul_div(u128::MAX, 2, 1), Err(MathError::Overflow));
    }
}
