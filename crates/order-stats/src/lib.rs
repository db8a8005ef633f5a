//! Order statistics
//!
//! Turns third-party order-list payloads into a per-product financial
//! summary: order counts, status breakdown, refunds, costs, platform fees and
//! profit. Groups with similar names are kept together and ordered by profit,
//! and a per-group expected profit can be overridden to recompute the
//! fee, cost and profit figures derived from it.
//!
//! Pipeline: payload -> validate -> group -> aggregate -> cluster -> rank,
//! then overrides and the batch summary on read.

pub mod aggregate;
pub mod config;
pub mod constants;
pub mod error;
pub mod fees;
pub mod orders;
pub mod overrides;
pub mod payload;
pub mod ranking;
pub mod similarity;
pub mod summary;

use tracing::debug;

pub use aggregate::{GroupStatistics, OrderStates};
pub use config::Config;
pub use error::{PayloadError, SubmissionError};
pub use orders::{GroupKey, OrderRecord, OrderStatus};
pub use overrides::{ProfitModel, ProfitOverrides};
pub use payload::{AcceptancePolicy, OrderBatch};
pub use summary::BatchSummary;

/// Aggregate, cluster and rank a batch of validated records
pub fn calculate_statistics(records: &[OrderRecord], config: &Config) -> Vec<GroupStatistics> {
    let groups = aggregate::aggregate_with_fees(records, &config.fees);
    let group_count = groups.len();

    let clusters = similarity::cluster_with_threshold(groups, config.similarity_threshold);
    debug!(
        records = records.len(),
        groups = group_count,
        clusters = clusters.len(),
        "Calculated statistics"
    );

    ranking::rank(clusters)
}
