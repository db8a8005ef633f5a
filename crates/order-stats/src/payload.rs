//! Payload ingestion
//!
//! A submission is one or more JSON payloads of the form
//! `{"orderList": [ {...}, ... ]}`. Each payload is parsed and validated on
//! its own, producing a per-payload outcome. The outcomes are then merged into
//! a single record batch according to an [`AcceptancePolicy`].

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{PayloadError, SubmissionError};
use crate::orders::{is_valid, OrderRecord};

/// Raw payload shape; records stay untyped until validated one by one
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderListPayload {
    order_list: Vec<serde_json::Value>,
}

/// A payload that passed parsing and has at least one valid record
#[derive(Debug, Clone)]
pub struct AcceptedPayload {
    pub index: usize,
    pub records: Vec<OrderRecord>,
    /// Records dropped by validation
    pub invalid_count: usize,
}

pub type PayloadOutcome = Result<AcceptedPayload, PayloadError>;

/// How to combine payload outcomes into a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AcceptancePolicy {
    /// Reject the submission on the first rejected payload
    #[default]
    AllOrNothing,
    /// Keep every accepted payload, skip rejected ones
    ValidOnly,
}

/// Records ready for aggregation
#[derive(Debug, Clone, Default)]
pub struct OrderBatch {
    pub records: Vec<OrderRecord>,
    /// Incomplete records filtered across all accepted payloads
    pub invalid_count: usize,
    /// Payloads skipped under [`AcceptancePolicy::ValidOnly`]
    pub rejected: Vec<PayloadError>,
}

/// Parse and validate one payload
pub fn parse_payload(index: usize, input: &str) -> PayloadOutcome {
    let payload: OrderListPayload =
        serde_json::from_str(input).map_err(|e| PayloadError::Malformed {
            index,
            reason: e.to_string(),
        })?;

    if payload.order_list.is_empty() {
        return Err(PayloadError::EmptyOrderList { index });
    }

    let total = payload.order_list.len();
    let records: Vec<OrderRecord> = payload
        .order_list
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<OrderRecord>(value) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(payload = index + 1, "Unreadable order record: {}", e);
                None
            }
        })
        .filter(is_valid)
        .collect();

    let invalid_count = total - records.len();
    if records.is_empty() {
        return Err(PayloadError::NoValidRecords {
            index,
            invalid: invalid_count,
        });
    }

    debug!(
        payload = index + 1,
        valid = records.len(),
        invalid = invalid_count,
        "Parsed payload"
    );

    Ok(AcceptedPayload {
        index,
        records,
        invalid_count,
    })
}

/// Outcomes for every non-blank payload of a submission
#[derive(Debug, Clone)]
pub struct Submission {
    outcomes: Vec<PayloadOutcome>,
}

impl Submission {
    /// Parse each input as one payload
    ///
    /// Blank inputs are skipped and do not consume an index.
    pub fn from_inputs<S: AsRef<str>>(inputs: &[S]) -> Result<Self, SubmissionError> {
        let outcomes: Vec<PayloadOutcome> = inputs
            .iter()
            .map(AsRef::as_ref)
            .filter(|input| !input.trim().is_empty())
            .enumerate()
            .map(|(index, input)| parse_payload(index, input))
            .collect();

        if outcomes.is_empty() {
            return Err(SubmissionError::EmptySubmission);
        }

        Ok(Self { outcomes })
    }

    pub fn outcomes(&self) -> &[PayloadOutcome] {
        &self.outcomes
    }

    /// Merge payload outcomes into one batch
    pub fn into_batch(self, policy: AcceptancePolicy) -> Result<OrderBatch, SubmissionError> {
        let mut batch = OrderBatch::default();

        for outcome in self.outcomes {
            match outcome {
                Ok(accepted) => {
                    batch.invalid_count += accepted.invalid_count;
                    batch.records.extend(accepted.records);
                }
                Err(e) => match policy {
                    AcceptancePolicy::AllOrNothing => return Err(e.into()),
                    AcceptancePolicy::ValidOnly => {
                        warn!("Skipping {}", e);
                        batch.rejected.push(e);
                    }
                },
            }
        }

        if batch.records.is_empty() {
            // Only reachable under ValidOnly: every payload was rejected
            if let Some(first) = batch.rejected.into_iter().next() {
                return Err(first.into());
            }
            return Err(SubmissionError::EmptySubmission);
        }

        if batch.invalid_count > 0 {
            warn!(
                "{} incomplete order record(s) filtered out",
                batch.invalid_count
            );
        }

        Ok(batch)
    }
}

/// Parse and merge a submission in one step
pub fn load_submission<S: AsRef<str>>(
    inputs: &[S],
    policy: AcceptancePolicy,
) -> Result<OrderBatch, SubmissionError> {
    Submission::from_inputs(inputs)?.into_batch(policy)
}
