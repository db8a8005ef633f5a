//! Batch-wide totals over the displayed groups

use crate::aggregate::GroupStatistics;
use crate::overrides::ProfitModel;

/// Totals across all groups
///
/// Cost, platform fee and profit are the recalculated (expected-profit)
/// figures, so the summary changes whenever an override does.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatchSummary {
    pub order_count: u64,
    pub total_sales: f64,
    pub total_cost: f64,
    pub total_platform_fee: f64,
    pub total_profit: f64,
    pub total_refund_count: u64,
    pub total_refund_amount: f64,
}

impl BatchSummary {
    pub fn from_statistics(statistics: &[GroupStatistics], model: &ProfitModel) -> Self {
        statistics.iter().fold(Self::default(), |mut acc, stats| {
            let figures = model.figures(stats);

            acc.order_count += stats.order_count;
            acc.total_sales += stats.total_sales;
            acc.total_cost += figures.total_cost;
            acc.total_platform_fee += figures.platform_fee;
            acc.total_profit += figures.total_profit;
            acc.total_refund_count += stats.total_refund_count;
            acc.total_refund_amount += stats.total_refund_amount;
            acc
        })
    }
}
