//! Constant-product (x*y=k) quoting in integer base units
//!
//! Used to quote the half-swap of a single-sided deposit and to settle swaps
//! in the simulated venue. Outputs round down.

use crate::{mul_div, MathError};
use router_types::{Amount, Bps, BPS_DENOMINATOR};
use serde::{Deserialize, Serialize};

/// Pool reserves and fee structure for a V2-style pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct V2PoolState {
    pub reserve_in: Amount,
    pub reserve_out: Amount,
    pub fee_bps: Bps, // 30 = 0.3%
}

impl V2PoolState {
    pub fn new(reserve_in: Amount, reserve_out: Amount, fee_bps: Bps) -> Self {
        Self {
            reserve_in,
            reserve_out,
            fee_bps,
        }
    }
}

pub struct V2Math;

impl V2Math {
    /// Output for `amount_in` after the pool fee:
    /// `out = in_after_fee * reserve_out / (reserve_in + in_after_fee)`
    pub fn get_amount_out(amount_in: Amount, pool: &V2PoolState) -> Result<Amount, MathError> {
        if pool.reserve_in == 0 || pool.reserve_out == 0 {
            return Err(MathError::DivisionByZero);
        }
        if pool.fee_bps as Amount > BPS_DENOMINATOR {
            return Err(MathError::PercentOutOfRange(pool.fee_bps));
        }
        let in_after_fee = mul_div(
            amount_in,
            BPS_DENOMINATOR - pool.fee_bps as Amount,
            BPS_DENOMINATOR,
        )?;
        let denominator = pool
            .reserve_in
            .checked_add(in_after_fee)
            .ok_or(MathError::Overflow)?;
        mul_div(in_after_fee, pool.reserve_out, denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_with_fee() {
        let pool = V2PoolState::new(10_000, 10_000, 30);
        // 100 in -> 99 after fee -> 99 * 10000 / 10099 = 98
        assert_eq!(V2Math::get_amount_out(100, &pool).unwrap(), 98);
    }

    #[test]
    fn test_output_without_fee() {
        let pool = V2PoolState::new(1_000, 1_000, 0);
        assert_eq!(V2Math::get_amount_out(1_000, &pool).unwrap(), 500);
    }

    #[test]
    fn test_empty_pool_rejected() {
        let pool = V2PoolState::new(0, 1_000, 30);
        assert_eq!(V2Math::get_amount_out(10, &pool), Err(MathError::DivisionByZero));
    }
}
