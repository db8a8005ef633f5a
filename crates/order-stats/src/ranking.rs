//! Profit ordering of similarity clusters

use std::cmp::Ordering;

use crate::aggregate::GroupStatistics;
use crate::similarity::SimilarityCluster;

fn by_profit_desc(a: &GroupStatistics, b: &GroupStatistics) -> Ordering {
    b.total_profit.total_cmp(&a.total_profit)
}

/// Flatten clusters into presentation order
///
/// Members are sorted by total profit (descending) within each cluster, and
/// clusters by the profit of their top member. Both sorts are stable, so
/// equal profits keep their input order.
pub fn rank(clusters: Vec<SimilarityCluster>) -> Vec<GroupStatistics> {
    let mut clusters: Vec<SimilarityCluster> = clusters
        .into_iter()
        .filter(|c| !c.is_empty())
        .map(|mut c| {
            c.members.sort_by(by_profit_desc);
            c
        })
        .collect();

    clusters.sort_by(|a, b| match (a.seed(), b.seed()) {
        (Some(a), Some(b)) => by_profit_desc(a, b),
        _ => Ordering::Equal,
    });

    clusters.into_iter().flat_map(|c| c.members).collect()
}
