//! Expected-profit overrides and the figures recalculated from them
//!
//! An override replaces only `expected_profit` on a group. Aggregated fields
//! are never touched; the platform fee, total cost and total profit shown to
//! the user are derived on read through [`ProfitModel`]:
//!
//! - expected total per order = avg unit price + expected profit
//! - platform fee = fee(expected total per order * order count)
//! - total cost = total sales + platform fee
//! - total profit = completed order count * expected profit
//! - profit margin = total profit / total sales (percent)
//!
//! The fee here is charged once on the group total, unlike aggregation which
//! charges each completed order separately. Both are kept as-is.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::aggregate::{profit_margin, GroupStatistics};
use crate::constants;
use crate::fees::FeeSchedule;
use crate::orders::{GroupKey, OrderStatus};

// =============================================================================
// Recalculation
// =============================================================================

/// Inputs for the figures derived from expected profit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfitModel {
    pub fees: FeeSchedule,
    /// Used for groups without an override
    pub default_expected_profit: f64,
}

impl Default for ProfitModel {
    fn default() -> Self {
        Self {
            fees: FeeSchedule::default(),
            default_expected_profit: constants::DEFAULT_EXPECTED_PROFIT,
        }
    }
}

/// Figures recalculated from a group's expected profit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecalculatedFigures {
    pub expected_profit: f64,
    pub platform_fee: f64,
    pub total_cost: f64,
    pub total_profit: f64,
    pub profit_margin: f64,
}

impl ProfitModel {
    pub fn expected_profit(&self, stats: &GroupStatistics) -> f64 {
        stats.expected_profit.unwrap_or(self.default_expected_profit)
    }

    pub fn expected_total_per_order(&self, stats: &GroupStatistics) -> f64 {
        stats.avg_unit_price + self.expected_profit(stats)
    }

    /// Fee on the expected group total (single charge, not per order)
    pub fn platform_fee(&self, stats: &GroupStatistics) -> f64 {
        self.fees
            .fee(self.expected_total_per_order(stats) * stats.order_count as f64)
    }

    pub fn total_cost(&self, stats: &GroupStatistics) -> f64 {
        stats.total_sales + self.platform_fee(stats)
    }

    pub fn total_profit(&self, stats: &GroupStatistics) -> f64 {
        stats.order_states.count(OrderStatus::Completed) as f64 * self.expected_profit(stats)
    }

    pub fn profit_margin(&self, stats: &GroupStatistics) -> f64 {
        profit_margin(self.total_profit(stats), stats.total_sales)
    }

    pub fn figures(&self, stats: &GroupStatistics) -> RecalculatedFigures {
        let total_profit = self.total_profit(stats);
        RecalculatedFigures {
            expected_profit: self.expected_profit(stats),
            platform_fee: self.platform_fee(stats),
            total_cost: self.total_cost(stats),
            total_profit,
            profit_margin: profit_margin(total_profit, stats.total_sales),
        }
    }
}

// =============================================================================
// Override Storage
// =============================================================================

/// Set the expected profit of the group whose display name matches exactly
///
/// Returns `false` (and changes nothing) when no group matches.
pub fn apply_override(
    statistics: &mut [GroupStatistics],
    display_name: &str,
    expected_profit: f64,
) -> bool {
    match statistics.iter_mut().find(|s| s.display_name == display_name) {
        Some(stats) => {
            debug!("Expected profit for {} set to {}", display_name, expected_profit);
            stats.expected_profit = Some(expected_profit);
            true
        }
        None => {
            warn!("No product group named '{}', override ignored", display_name);
            false
        }
    }
}

/// Expected-profit overrides keyed by group identity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfitOverrides {
    values: HashMap<GroupKey, f64>,
}

impl ProfitOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: GroupKey, expected_profit: f64) {
        self.values.insert(key, expected_profit);
    }

    pub fn get(&self, key: &GroupKey) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn remove(&mut self, key: &GroupKey) -> Option<f64> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Resolve a display name against the current groups and store its override
    ///
    /// Returns `false` when no group has that display name.
    pub fn set_by_display_name(
        &mut self,
        statistics: &[GroupStatistics],
        display_name: &str,
        expected_profit: f64,
    ) -> bool {
        match statistics.iter().find(|s| s.display_name == display_name) {
            Some(stats) => {
                self.set(stats.key.clone(), expected_profit);
                true
            }
            None => {
                warn!("No product group named '{}', override ignored", display_name);
                false
            }
        }
    }

    /// Copy stored overrides onto matching groups; other groups are untouched
    pub fn apply(&self, statistics: &mut [GroupStatistics]) {
        for stats in statistics.iter_mut() {
            if let Some(value) = self.get(&stats.key) {
                stats.expected_profit = Some(value);
            }
        }
    }
}
