//! APY comparison with hysteresis

use router_types::{Bps, BPS_DENOMINATOR};
use rust_decimal::Decimal;

pub struct ApyMath;

impl ApyMath {
    /// True when `target_apy` beats `current_apy` by more than `threshold_bps`
    /// relative to the current rate: `target * 10_000 > current * (10_000 + threshold)`.
    ///
    /// A zero threshold reduces to a strict `target > current`.
    pub fn exceeds_threshold(target_apy: Bps, current_apy: Bps, threshold_bps: Bps) -> bool {
        let lhs = target_apy as u128 * BPS_DENOMINATOR;
        let rhs = current_apy as u128 * (BPS_DENOMINATOR + threshold_bps as u128);
        lhs > rhs
    }

    /// Absolute APY gap in basis points, zero when the target is not better
    #[inline]
    pub fn improvement(target_apy: Bps, current_apy: Bps) -> Bps {
        target_apy.saturating_sub(current_apy)
    }

    /// Basis points as a percentage, e.g. 450 -> 4.50
    pub fn bps_to_percent(bps: Bps) -> Decimal {
        Decimal::new(bps as i64, 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_relative_threshold() {
        // 6.10% vs 4.00% with a 3% relative threshold
        assert!(ApyMath::exceeds_threshold(610, 400, 300));
        // 4.10% vs 4.00% does not clear 3%
        assert!(!ApyMath::exceeds_threshold(410, 400, 300));
        // exactly at the boundary is not enough
        assert!(!ApyMath::exceeds_threshold(412, 400, 300));
        assert!(ApyMath::exceeds_threshold(413, 400, 300));
    }

    #[test]
    fn test_zero_threshold_is_strict() {
        assert!(ApyMath::exceeds_threshold(401, 400, 0));
        assert!(!ApyMath::exceeds_threshold(400, 400, 0));
    }

    #[test]
    fn test_zero_current_apy() {
        assert!(ApyMath::exceeds_threshold(1, 0, 300));
        assert!(!ApyMath::exceeds_threshold(0, 0, 300));
    }

    #[test]
    fn test_formatting_helpers() {
        assert_eq!(ApyMath::bps_to_percent(450), dec!(4.50));
        assert_eq!(ApyMath::improvement(300, 500), 0);
        assert_eq!(ApyMath::improvement(500, 300), 200);
    }
}
