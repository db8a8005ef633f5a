//! Per-product aggregation
//!
//! Folds validated order records into one [`GroupStatistics`] per
//! [`GroupKey`] (normalized product name + unit price).

use std::collections::{BTreeMap, HashMap};

use crate::fees::FeeSchedule;
use crate::orders::{GroupKey, OrderRecord, OrderStatus};

// =============================================================================
// Status Histogram
// =============================================================================

/// Order count per status
///
/// Documented statuses are counted in fixed slots; anything else lands in
/// the unknown bucket keyed by its raw code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderStates {
    known: [u64; OrderStatus::KNOWN.len()],
    unknown: BTreeMap<i64, u64>,
}

impl OrderStates {
    pub fn record(&mut self, status: OrderStatus) {
        match status.known_index() {
            Some(idx) => self.known[idx] += 1,
            None => *self.unknown.entry(status.code()).or_insert(0) += 1,
        }
    }

    pub fn count(&self, status: OrderStatus) -> u64 {
        match status.known_index() {
            Some(idx) => self.known[idx],
            None => self.unknown.get(&status.code()).copied().unwrap_or(0),
        }
    }

    pub fn total(&self) -> u64 {
        self.known.iter().sum::<u64>() + self.unknown.values().sum::<u64>()
    }

    /// Non-zero entries in ascending code order
    pub fn iter(&self) -> impl Iterator<Item = (OrderStatus, u64)> + '_ {
        let mut entries: Vec<(OrderStatus, u64)> = OrderStatus::KNOWN
            .iter()
            .zip(self.known.iter())
            .filter(|(_, count)| **count > 0)
            .map(|(status, count)| (*status, *count))
            .chain(
                self.unknown
                    .iter()
                    .map(|(code, count)| (OrderStatus::Unknown(*code), *count)),
            )
            .collect();
        entries.sort_by_key(|(status, _)| status.code());
        entries.into_iter()
    }

    /// Entries ordered by descending count, ties by ascending code
    pub fn by_count_desc(&self) -> Vec<(OrderStatus, u64)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }
}

impl std::fmt::Display for OrderStates {
    /// "completed: 3, refunded: 1"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .by_count_desc()
            .into_iter()
            .map(|(status, count)| format!("{}: {}", status, count))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

// =============================================================================
// Group Statistics
// =============================================================================

/// Financial summary of one product group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStatistics {
    pub key: GroupKey,
    /// "<name> (¥<unit price>)"
    pub display_name: String,
    pub order_count: u64,
    pub avg_unit_price: f64,
    /// avg_unit_price * order_count
    pub total_sales: f64,
    /// Sum of face values
    pub total_cost: f64,
    /// Sum of per-order fees over completed orders
    pub total_platform_fee: f64,
    /// total_sales + total_platform_fee - total_cost
    pub total_profit: f64,
    pub avg_profit: f64,
    /// Percent of total_sales, 0 when there are no sales
    pub profit_margin: f64,
    pub total_refund_count: u64,
    /// Sum of unit prices (not amounts paid) over refunded orders
    pub total_refund_amount: f64,
    pub order_states: OrderStates,
    /// User-supplied expected profit per order, `None` until edited
    pub expected_profit: Option<f64>,
}

#[derive(Debug)]
struct GroupAccumulator {
    key: GroupKey,
    order_count: u64,
    unit_price_sum: f64,
    face_value_sum: f64,
    platform_fee_sum: f64,
    refund_count: u64,
    refund_amount: f64,
    states: OrderStates,
}

impl GroupAccumulator {
    fn new(key: GroupKey) -> Self {
        Self {
            key,
            order_count: 0,
            unit_price_sum: 0.0,
            face_value_sum: 0.0,
            platform_fee_sum: 0.0,
            refund_count: 0,
            refund_amount: 0.0,
            states: OrderStates::default(),
        }
    }

    fn add(&mut self, record: &OrderRecord, fees: &FeeSchedule) {
        let status = record.status();

        self.order_count += 1;
        self.unit_price_sum += record.unit_price();
        self.face_value_sum += record.face_value();
        self.states.record(status);

        match status {
            // Fee is charged per completed order, then summed
            OrderStatus::Completed => self.platform_fee_sum += fees.fee(record.total_amount()),
            OrderStatus::Refunded => {
                self.refund_count += 1;
                self.refund_amount += record.unit_price();
            }
            _ => {}
        }
    }

    fn finish(self) -> GroupStatistics {
        let count = self.order_count as f64;
        let avg_unit_price = self.unit_price_sum / count;
        let total_sales = avg_unit_price * count;
        let total_profit = total_sales + self.platform_fee_sum - self.face_value_sum;

        GroupStatistics {
            display_name: self.key.display_name(),
            key: self.key,
            order_count: self.order_count,
            avg_unit_price,
            total_sales,
            total_cost: self.face_value_sum,
            total_platform_fee: self.platform_fee_sum,
            total_profit,
            avg_profit: total_profit / count,
            profit_margin: profit_margin(total_profit, total_sales),
            total_refund_count: self.refund_count,
            total_refund_amount: self.refund_amount,
            order_states: self.states,
            expected_profit: None,
        }
    }
}

/// Profit as a percentage of sales
pub fn profit_margin(profit: f64, sales: f64) -> f64 {
    if sales == 0.0 {
        return 0.0;
    }
    profit / sales * 100.0
}

/// Aggregate records under the default fee schedule
pub fn aggregate(records: &[OrderRecord]) -> Vec<GroupStatistics> {
    aggregate_with_fees(records, &FeeSchedule::default())
}

/// Aggregate records into one entry per group, in first-seen order
pub fn aggregate_with_fees(records: &[OrderRecord], fees: &FeeSchedule) -> Vec<GroupStatistics> {
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<GroupAccumulator> = Vec::new();

    for record in records {
        let key = record.group_key();
        let slot = match index.get(&key) {
            Some(&slot) => slot,
            None => {
                groups.push(GroupAccumulator::new(key.clone()));
                index.insert(key, groups.len() - 1);
                groups.len() - 1
            }
        };
        groups[slot].add(record, fees);
    }

    groups.into_iter().map(GroupAccumulator::finish).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::platform_fee;

    const EPS: f64 = 1e-9;

    fn order(name: &str, unit: f64, amount: f64, face: f64, state: i64) -> OrderRecord {
        OrderRecord {
            product_name: Some(name.to_string()),
            unit_price: Some(unit),
            total_amount: Some(amount),
            face_value: Some(face),
            state: Some(state),
            ..Default::default()
        }
    }

    #[test]
    fn test_widget_scenario() {
        let records = vec![
            order("Widget", 10.0, 100.0, 90.0, 3),
            order("Widget", 10.0, 50.0, 40.0, 5),
        ];
        let stats = aggregate(&records);
        assert_eq!(stats.len(), 1);

        let widget = &stats[0];
        assert_eq!(widget.display_name, "Widget (¥10)");
        assert_eq!(widget.order_count, 2);
        assert!((widget.total_sales - 20.0).abs() < EPS);
        assert!((widget.total_cost - 130.0).abs() < EPS);
        assert!((widget.total_platform_fee - platform_fee(100.0)).abs() < EPS);
        assert!((widget.total_platform_fee - 0.06).abs() < EPS);
        assert!((widget.total_profit - -109.94).abs() < EPS);
        assert!((widget.avg_profit - -54.97).abs() < EPS);
        assert_eq!(widget.order_states.count(OrderStatus::Completed), 1);
        assert_eq!(widget.order_states.count(OrderStatus::Refunded), 1);
        assert_eq!(widget.total_refund_count, 1);
        assert!((widget.total_refund_amount - 10.0).abs() < EPS);
        assert_eq!(widget.expected_profit, None);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(&[]).is_empty());
    }

    #[test]
    fn test_grouping_by_name_and_price() {
        let records = vec![
            order("Phone  X", 10.0, 11.0, 9.0, 3),
            order("Phone X", 10.0, 11.0, 9.0, 3),
            order(" Phone X ", 12.0, 13.0, 11.0, 3),
            order("Phone Y", 10.0, 11.0, 9.0, 3),
        ];
        let stats = aggregate(&records);
        assert_eq!(stats.len(), 3);

        // First-seen order
        assert_eq!(stats[0].display_name, "PhoneX (¥10)");
        assert_eq!(stats[0].order_count, 2);
        assert_eq!(stats[1].display_name, "PhoneX (¥12)");
        assert_eq!(stats[1].order_count, 1);
        assert_eq!(stats[2].display_name, "PhoneY (¥10)");
    }

    #[test]
    fn test_grouping_ignores_inner_whitespace() {
        let records = vec![
            order("Phone X", 10.0, 11.0, 9.0, 3),
            order("PhoneX", 10.0, 11.0, 9.0, 5),
        ];
        let stats = aggregate(&records);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].display_name, "PhoneX (¥10)");
        assert_eq!(stats[0].order_count, 2);
        assert_eq!(stats[0].order_states.total(), 2);
    }

    #[test]
    fn test_fee_per_order_not_on_group_total() {
        // Two completed orders of 6,000 each: per-order fees stay in the lower tier
        let records = vec![
            order("Bulk", 5_000.0, 6_000.0, 0.0, 3),
            order("Bulk", 5_000.0, 6_000.0, 0.0, 3),
        ];
        let stats = aggregate(&records);
        assert!((stats[0].total_platform_fee - 2.0 * 6_000.0 * 0.0006).abs() < EPS);
        assert!((stats[0].total_platform_fee - platform_fee(12_000.0)).abs() > 1.0);
    }

    #[test]
    fn test_only_completed_orders_pay_fees() {
        let records = vec![
            order("Card", 10.0, 100.0, 9.0, 1),
            order("Card", 10.0, 100.0, 9.0, 2),
            order("Card", 10.0, 100.0, 9.0, 4),
            order("Card", 10.0, 100.0, 9.0, 6),
        ];
        let stats = aggregate(&records);
        assert_eq!(stats[0].total_platform_fee, 0.0);
        assert_eq!(stats[0].total_refund_count, 0);
    }

    #[test]
    fn test_conservation() {
        let records = vec![
            order("A", 3.3, 4.0, 3.0, 3),
            order("A", 3.3, 4.0, 3.0, 5),
            order("A", 3.3, 4.0, 3.0, 9),
            order("A", 3.3, 4.0, 3.0, 7),
            order("B", 1.0, 2.0, 1.0, 3),
        ];
        for stat in aggregate(&records) {
            assert_eq!(stat.total_sales, stat.avg_unit_price * stat.order_count as f64);
            assert_eq!(stat.order_states.total(), stat.order_count);
        }
    }

    #[test]
    fn test_profit_margin() {
        assert_eq!(profit_margin(5.0, 0.0), 0.0);
        assert!((profit_margin(5.0, 20.0) - 25.0).abs() < EPS);
        assert!((profit_margin(-10.0, 20.0) - -50.0).abs() < EPS);

        let stats = aggregate(&[order("Free", 0.0, 0.0, 0.0, 3)]);
        assert_eq!(stats[0].profit_margin, 0.0);
    }

    #[test]
    fn test_order_states_histogram() {
        let mut states = OrderStates::default();
        for code in [3, 3, 3, 5, 9, 7, 0] {
            states.record(OrderStatus::from_code(code));
        }
        assert_eq!(states.total(), 7);
        assert_eq!(states.count(OrderStatus::Completed), 3);
        assert_eq!(states.count(OrderStatus::Unknown(7)), 1);
        assert_eq!(states.count(OrderStatus::Paid), 0);

        let codes: Vec<i64> = states.iter().map(|(s, _)| s.code()).collect();
        assert_eq!(codes, vec![0, 3, 5, 7, 9]);
    }

    #[test]
    fn test_order_states_display() {
        let mut states = OrderStates::default();
        for code in [5, 3, 3, 3, 42] {
            states.record(OrderStatus::from_code(code));
        }
        assert_eq!(states.to_string(), "completed: 3, refunded: 1, status-42: 1");
        assert_eq!(OrderStates::default().to_string(), "");
    }
}
