//! Name-similarity clustering for presentation order
//!
//! Groups whose display names share enough keywords are placed next to each
//! other. Clustering is a single greedy pass: every unassigned group is
//! compared against the seed of the current cluster only, so members are not
//! guaranteed to be similar to each other.

use std::collections::HashSet;

use crate::aggregate::GroupStatistics;
use crate::constants;

/// Groups judged related by name, seed first
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityCluster {
    pub members: Vec<GroupStatistics>,
}

impl SimilarityCluster {
    pub fn seed(&self) -> Option<&GroupStatistics> {
        self.members.first()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Drop a trailing "(¥<price>)" from a display name
fn strip_price_suffix(name: &str) -> &str {
    let trimmed = name.trim_end();
    let marker = format!("({}", constants::CURRENCY_SYMBOL);

    let Some(body) = trimmed.strip_suffix(')') else {
        return trimmed;
    };
    let Some(pos) = body.rfind(&marker) else {
        return trimmed;
    };

    let price = &body[pos + marker.len()..];
    if price.is_empty() || !price.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return trimmed;
    }

    &trimmed[..pos]
}

/// Keyword set of a display name, price suffix removed
pub fn extract_keywords(name: &str) -> HashSet<&str> {
    strip_price_suffix(name)
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|token| !token.is_empty())
        .collect()
}

/// Jaccard similarity of two names' keyword sets (0.0 to 1.0)
///
/// Names without keywords only match themselves exactly.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let keywords_a = extract_keywords(a);
    let keywords_b = extract_keywords(b);
    keyword_similarity(a, &keywords_a, b, &keywords_b)
}

fn keyword_similarity(a: &str, ka: &HashSet<&str>, b: &str, kb: &HashSet<&str>) -> f64 {
    if ka.is_empty() || kb.is_empty() {
        return if a == b { 1.0 } else { 0.0 };
    }

    let common = ka.intersection(kb).count();
    let union = ka.union(kb).count();
    common as f64 / union as f64
}

/// Cluster groups using the default threshold
pub fn cluster(statistics: Vec<GroupStatistics>) -> Vec<SimilarityCluster> {
    cluster_with_threshold(statistics, constants::SIMILARITY_THRESHOLD)
}

/// Greedy seed-anchored clustering; a group joins when similarity > `threshold`
pub fn cluster_with_threshold(
    statistics: Vec<GroupStatistics>,
    threshold: f64,
) -> Vec<SimilarityCluster> {
    let names: Vec<String> = statistics.iter().map(|s| s.display_name.clone()).collect();
    let keywords: Vec<HashSet<&str>> = names.iter().map(|n| extract_keywords(n)).collect();

    let mut pending: Vec<Option<GroupStatistics>> = statistics.into_iter().map(Some).collect();
    let mut clusters = Vec::new();

    for i in 0..pending.len() {
        let Some(seed) = pending[i].take() else {
            continue;
        };
        let mut members = vec![seed];

        for j in (i + 1)..pending.len() {
            if pending[j].is_none() {
                continue;
            }
            let similarity = keyword_similarity(&names[i], &keywords[i], &names[j], &keywords[j]);
            if similarity > threshold {
                members.extend(pending[j].take());
            }
        }

        clusters.push(SimilarityCluster { members });
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::orders::OrderRecord;

    fn stats_for(names: &[(&str, f64)]) -> Vec<GroupStatistics> {
        let records: Vec<OrderRecord> = names
            .iter()
            .map(|(name, price)| OrderRecord {
                product_name: Some(name.to_string()),
                unit_price: Some(*price),
                total_amount: Some(*price),
                face_value: Some(*price),
                state: Some(3),
                ..Default::default()
            })
            .collect();
        aggregate(&records)
    }

    fn cluster_names(clusters: &[SimilarityCluster]) -> Vec<Vec<String>> {
        clusters
            .iter()
            .map(|c| c.members.iter().map(|m| m.display_name.clone()).collect())
            .collect()
    }

    #[test]
    fn test_extract_keywords() {
        let keywords = extract_keywords("Apple iPhone-15_Pro Max (¥5999.5)");
        let expected: HashSet<&str> = ["Apple", "iPhone", "15", "Pro", "Max"].into_iter().collect();
        assert_eq!(keywords, expected);

        // Suffix only stripped when it is a price
        assert!(extract_keywords("Cable (¥abc)").contains("(¥abc)"));
        assert!(extract_keywords("(¥10)").is_empty());
    }

    #[test]
    fn test_name_similarity() {
        assert_eq!(name_similarity("Steam Card 50 (¥50)", "Steam Card 50 (¥48)"), 1.0);
        // {Steam, Card} shared of {Steam, Card, 50, 100}
        assert!((name_similarity("Steam Card 50", "Steam Card 100") - 0.5).abs() < 1e-9);
        assert_eq!(name_similarity("Steam Card", "Apple Music"), 0.0);
    }

    #[test]
    fn test_similarity_without_keywords() {
        assert_eq!(name_similarity("(¥10)", "(¥10)"), 1.0);
        assert_eq!(name_similarity("(¥10)", "(¥12)"), 0.0);
        assert_eq!(name_similarity("(¥10)", "Widget (¥10)"), 0.0);
    }

    #[test]
    fn test_threshold_is_strict() {
        // {A, B} vs {A, C, D}: 1 shared of 4
        assert!(name_similarity("A B", "A C D") < 0.3);
        let clusters = cluster_with_threshold(stats_for(&[("A-B", 1.0), ("A-C", 1.0)]), 1.0 / 3.0);
        // Exactly 1/3 does not pass a 1/3 threshold
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn test_cluster_partitions_input() {
        let stats = stats_for(&[
            ("Steam-Card-50", 50.0),
            ("Apple-Music-1M", 10.0),
            ("Steam-Card-100", 100.0),
            ("Apple-Music-3M", 30.0),
            ("Netflix", 60.0),
        ]);
        let clusters = cluster(stats);
        assert_eq!(
            cluster_names(&clusters),
            vec![
                vec!["Steam-Card-50 (¥50)", "Steam-Card-100 (¥100)"],
                vec!["Apple-Music-1M (¥10)", "Apple-Music-3M (¥30)"],
                vec!["Netflix (¥60)"],
            ]
        );
        let total: usize = clusters.iter().map(SimilarityCluster::len).sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn test_seed_anchoring_not_transitive() {
        // "Y-Z-W" matches member "X-Y-Z" (2/4) but not seed "X-Y" (1/4)
        let stats = stats_for(&[("X-Y", 1.0), ("X-Y-Z", 1.0), ("Y-Z-W", 1.0)]);
        let clusters = cluster(stats);
        assert_eq!(
            cluster_names(&clusters),
            vec![vec!["X-Y (¥1)", "X-Y-Z (¥1)"], vec!["Y-Z-W (¥1)"]]
        );
    }

    #[test]
    fn test_grouped_names_are_single_keywords() {
        // Grouping strips whitespace, so only '-' and '_' separate keywords
        let stats = stats_for(&[("Steam Card 50", 50.0), ("Steam Card 100", 100.0)]);
        assert_eq!(stats[0].display_name, "SteamCard50 (¥50)");
        assert_eq!(extract_keywords(&stats[0].display_name).len(), 1);
        assert_eq!(cluster(stats).len(), 2);
    }

    #[test]
    fn test_cluster_deterministic() {
        let names = [("Gift Card A", 1.0), ("Gift Card B", 2.0), ("Other", 3.0)];
        let first = cluster(stats_for(&names));
        let second = cluster(stats_for(&names));
        assert_eq!(first, second);
    }

    #[test]
    fn test_cluster_empty() {
        assert!(cluster(Vec::new()).is_empty());
    }
}
