//! Centralized constants for the order statistics tool
//!
//! Defaults for everything that can be overridden from order-stats.toml live
//! here, alongside the fixed status codes of the upstream order API.

// =============================================================================
// Platform Fee Schedule
// =============================================================================

/// Amount up to which the base rate applies
pub const FEE_THRESHOLD: f64 = 10_000.0;

/// Rate charged on the part of an amount at or below the threshold (0.06%)
pub const FEE_BASE_RATE: f64 = 0.0006;

/// Rate charged on the part of an amount above the threshold (1%)
pub const FEE_EXCESS_RATE: f64 = 0.01;

// =============================================================================
// Grouping and Overrides
// =============================================================================

/// Keyword overlap a group needs with a cluster seed to join it (strictly greater)
pub const SIMILARITY_THRESHOLD: f64 = 0.3;

/// Expected profit per order used when no override has been set
pub const DEFAULT_EXPECTED_PROFIT: f64 = 0.3;

/// Currency marker used in display names, e.g. "Widget (¥10)"
pub const CURRENCY_SYMBOL: char = '¥';

// =============================================================================
// Order Status Codes
// =============================================================================

pub const STATUS_PENDING_PAYMENT: i64 = 1;
pub const STATUS_PAID: i64 = 2;
pub const STATUS_COMPLETED: i64 = 3;
pub const STATUS_CANCELLED: i64 = 4;
pub const STATUS_REFUNDED: i64 = 5;
pub const STATUS_PROCESSING: i64 = 6;
pub const STATUS_REFUND_IN_PROGRESS: i64 = 9;

// =============================================================================
// File Names
// =============================================================================

/// Default config file, looked up in the working directory
pub const CONFIG_FILENAME: &str = "order-stats.toml";

/// Prefix of the exported statistics sheet (date and extension appended)
pub const STATISTICS_EXPORT_PREFIX: &str = "statistics";
