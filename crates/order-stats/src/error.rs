//! Error types for payload ingestion

use thiserror::Error;

/// Why a single payload was rejected
///
/// `index` is zero-based; messages show it one-based.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PayloadError {
    /// Not JSON, or no `orderList` array
    #[error("payload #{}: malformed order data ({reason})", .index + 1)]
    Malformed { index: usize, reason: String },

    /// `orderList` is present but empty
    #[error("payload #{}: order list is empty", .index + 1)]
    EmptyOrderList { index: usize },

    /// Every record failed validation
    #[error("payload #{}: no valid orders ({invalid} incomplete record(s) filtered)", .index + 1)]
    NoValidRecords { index: usize, invalid: usize },
}

impl PayloadError {
    pub fn index(&self) -> usize {
        match self {
            PayloadError::Malformed { index, .. }
            | PayloadError::EmptyOrderList { index }
            | PayloadError::NoValidRecords { index, .. } => *index,
        }
    }
}

/// Why a whole submission produced no batch
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmissionError {
    /// Nothing but blank input was supplied
    #[error("no order data supplied; provide at least one payload")]
    EmptySubmission,

    /// A payload was rejected (first rejection wins)
    #[error(transparent)]
    Payload(#[from] PayloadError),
}
