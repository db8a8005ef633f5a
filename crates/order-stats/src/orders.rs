//! Order records as delivered by the third-party order API
//!
//! Covers the record shape, status codes, record validation and the
//! grouping key derived from each record.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::hash::{Hash, Hasher};

use crate::constants;

/// A single order from an `orderList` payload
///
/// Fields are read leniently so that incomplete records survive
/// deserialization and can be filtered by [`is_valid`] instead of failing the
/// whole payload. For the numeric fields `None` means the key was absent; a
/// key that is present always yields `Some`, with `null` and non-numeric
/// values read as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Upstream order ID (number in practice, kept as raw JSON)
    #[serde(rename = "OrderId", default)]
    pub order_id: Option<Value>,
    /// Product display name
    #[serde(rename = "GoodMessage", default, deserialize_with = "lenient_name")]
    pub product_name: Option<String>,
    /// Total amount paid for the order
    #[serde(rename = "AllMoney", default, deserialize_with = "present_amount")]
    pub total_amount: Option<f64>,
    /// Unit (sourcing) price
    #[serde(rename = "UnitMoney", default, deserialize_with = "present_amount")]
    pub unit_price: Option<f64>,
    /// Face value of the goods (cost)
    #[serde(rename = "GoodFaceValue", default, deserialize_with = "present_amount")]
    pub face_value: Option<f64>,
    /// Raw status code
    #[serde(rename = "State", default, deserialize_with = "lenient_state")]
    pub state: Option<i64>,
    /// Remaining transport fields, unused by the statistics
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Numeric value of a transport field; numeric strings are parsed, anything
/// else counts as 0
fn amount_from_value(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Only called when the key is present, so the result is always `Some`
fn present_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(Some(amount_from_value(&value)))
}

/// Product name as text; `null`, `false` and `""` carry no name
fn lenient_name<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let name = match Value::deserialize(deserializer)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    };
    Ok(name.filter(|s| !s.is_empty()))
}

/// Status code; non-integer values are treated as missing
fn lenient_state<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let state = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(state)
}

impl OrderRecord {
    pub fn status(&self) -> OrderStatus {
        OrderStatus::from_code(self.state.unwrap_or(0))
    }

    /// Unit price, treating a missing value as zero
    pub fn unit_price(&self) -> f64 {
        self.unit_price.unwrap_or(0.0)
    }

    pub fn total_amount(&self) -> f64 {
        self.total_amount.unwrap_or(0.0)
    }

    pub fn face_value(&self) -> f64 {
        self.face_value.unwrap_or(0.0)
    }

    pub fn group_key(&self) -> GroupKey {
        group_key(self)
    }
}

// =============================================================================
// Status Codes
// =============================================================================

/// Order status as reported by the upstream API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OrderStatus {
    PendingPayment,
    Paid,
    Completed,
    Cancelled,
    Refunded,
    Processing,
    RefundInProgress,
    /// Any code outside the documented set
    Unknown(i64),
}

impl OrderStatus {
    /// Every documented status, in code order
    pub const KNOWN: [OrderStatus; 7] = [
        OrderStatus::PendingPayment,
        OrderStatus::Paid,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
        OrderStatus::Refunded,
        OrderStatus::Processing,
        OrderStatus::RefundInProgress,
    ];

    pub fn from_code(code: i64) -> Self {
        match code {
            constants::STATUS_PENDING_PAYMENT => OrderStatus::PendingPayment,
            constants::STATUS_PAID => OrderStatus::Paid,
            constants::STATUS_COMPLETED => OrderStatus::Completed,
            constants::STATUS_CANCELLED => OrderStatus::Cancelled,
            constants::STATUS_REFUNDED => OrderStatus::Refunded,
            constants::STATUS_PROCESSING => OrderStatus::Processing,
            constants::STATUS_REFUND_IN_PROGRESS => OrderStatus::RefundInProgress,
            other => OrderStatus::Unknown(other),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            OrderStatus::PendingPayment => constants::STATUS_PENDING_PAYMENT,
            OrderStatus::Paid => constants::STATUS_PAID,
            OrderStatus::Completed => constants::STATUS_COMPLETED,
            OrderStatus::Cancelled => constants::STATUS_CANCELLED,
            OrderStatus::Refunded => constants::STATUS_REFUNDED,
            OrderStatus::Processing => constants::STATUS_PROCESSING,
            OrderStatus::RefundInProgress => constants::STATUS_REFUND_IN_PROGRESS,
            OrderStatus::Unknown(code) => *code,
        }
    }

    /// Position in [`OrderStatus::KNOWN`], `None` for unknown codes
    pub(crate) fn known_index(&self) -> Option<usize> {
        OrderStatus::KNOWN.iter().position(|s| s == self)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::PendingPayment => write!(f, "pending-payment"),
            OrderStatus::Paid => write!(f, "paid"),
            OrderStatus::Completed => write!(f, "completed"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
            OrderStatus::Refunded => write!(f, "refunded"),
            OrderStatus::Processing => write!(f, "processing"),
            OrderStatus::RefundInProgress => write!(f, "refund-in-progress"),
            OrderStatus::Unknown(code) => write!(f, "status-{}", code),
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Check the fields the statistics depend on are present
///
/// Rejects records with an absent or empty product name, or without a
/// total amount or face value key. Whitespace-only names and `null` amounts
/// are present and pass.
pub fn is_valid(record: &OrderRecord) -> bool {
    let has_name = record.product_name.as_deref().is_some_and(|name| !name.is_empty());

    has_name && record.total_amount.is_some() && record.face_value.is_some()
}

// =============================================================================
// Grouping Key
// =============================================================================

/// Strip every whitespace character from a product name
///
/// "Phone X", "Phone  X" and "PhoneX" all normalize to "PhoneX".
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect()
}

/// Identity of a product group: normalized name plus exact unit price
#[derive(Debug, Clone)]
pub struct GroupKey {
    name: String,
    unit_price: f64,
}

impl GroupKey {
    pub fn new(name: &str, unit_price: f64) -> Self {
        // -0.0 and 0.0 must land in the same group
        let unit_price = if unit_price == 0.0 { 0.0 } else { unit_price };
        Self {
            name: normalize_name(name),
            unit_price,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit_price(&self) -> f64 {
        self.unit_price
    }

    /// Human-readable group name, e.g. "Widget (¥10)"
    pub fn display_name(&self) -> String {
        format!("{} ({}{})", self.name, constants::CURRENCY_SYMBOL, self.unit_price)
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.unit_price.to_bits() == other.unit_price.to_bits()
    }
}

impl Eq for GroupKey {}

impl Hash for GroupKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.unit_price.to_bits().hash(state);
    }
}

/// Grouping key for a record
pub fn group_key(record: &OrderRecord) -> GroupKey {
    GroupKey::new(
        record.product_name.as_deref().unwrap_or_default(),
        record.unit_price(),
    )
}
