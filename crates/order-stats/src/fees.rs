//! Platform fee calculation
//!
//! The platform charges a two-tier commission on an amount:
//! - Up to the threshold (10,000): 0.06% of the amount
//! - Above the threshold: 0.06% of the threshold plus 1% of the excess
//!
//! The same schedule is applied on two different bases elsewhere: per order
//! total during aggregation, and on the expected group total when overrides
//! are recalculated. Callers pick the basis; this module only knows the rates.

use serde::Deserialize;

use crate::constants;

/// Tiered platform fee schedule
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    pub threshold: f64,
    pub base_rate: f64,
    pub excess_rate: f64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            threshold: constants::FEE_THRESHOLD,
            base_rate: constants::FEE_BASE_RATE,
            excess_rate: constants::FEE_EXCESS_RATE,
        }
    }
}

impl FeeSchedule {
    /// Fee charged on `amount`. Not rounded; format at display time.
    ///
    /// Negative amounts fall in the lower tier and yield a negative fee.
    pub fn fee(&self, amount: f64) -> f64 {
        if amount <= self.threshold {
            amount * self.base_rate
        } else {
            self.threshold * self.base_rate + (amount - self.threshold) * self.excess_rate
        }
    }
}

/// Fee on `amount` under the default schedule
pub fn platform_fee(amount: f64) -> f64 {
    FeeSchedule::default().fee(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_fee_lower_tier() {
        assert!((platform_fee(100.0) - 0.06).abs() < EPS);
        assert!((platform_fee(13.15) - 0.00789).abs() < EPS);
        assert_eq!(platform_fee(0.0), 0.0);
    }

    #[test]
    fn test_fee_at_threshold() {
        // 10,000 * 0.06% = 6
        assert!((platform_fee(10_000.0) - 6.0).abs() < EPS);
        assert!((platform_fee(9_999.999) - 9_999.999 * 0.0006).abs() < EPS);
    }

    #[test]
    fn test_fee_upper_tier() {
        // 6 + 5,000 * 1% = 56
        assert!((platform_fee(15_000.0) - 56.0).abs() < EPS);
    }

    #[test]
    fn test_fee_continuous_at_threshold() {
        let eps = 0.01;
        let expected = 10_000.0 * 0.0006 + eps * 0.01;
        assert!((platform_fee(10_000.0 + eps) - expected).abs() < EPS);
        assert!((platform_fee(10_000.0 + eps) - platform_fee(10_000.0)).abs() < 0.001);
    }

    #[test]
    fn test_fee_monotonic() {
        let amounts = [0.0, 1.0, 500.0, 9_999.0, 10_000.0, 10_001.0, 50_000.0];
        for pair in amounts.windows(2) {
            assert!(platform_fee(pair[0]) <= platform_fee(pair[1]));
        }
    }

    #[test]
    fn test_fee_negative_amount() {
        assert!((platform_fee(-100.0) + 0.06).abs() < EPS);
    }

    #[test]
    fn test_custom_schedule() {
        let schedule = FeeSchedule {
            threshold: 100.0,
            base_rate: 0.01,
            excess_rate: 0.1,
        };
        assert!((schedule.fee(50.0) - 0.5).abs() < EPS);
        assert!((schedule.fee(200.0) - 11.0).abs() < EPS);
    }
}
