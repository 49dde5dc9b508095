// Error taxonomy for sampling, unit conversion and transmission.
// Configuration errors are startup-only and go through anyhow (see config.rs).

use std::num::ParseFloatError;
use std::time::Duration;

use thiserror::Error;

use crate::models::SourceKind;

/// A textual magnitude could not be turned into a number.
#[derive(Debug, Error)]
pub enum UnitError {
    #[error("unknown unit in '{0}'")]
    UnknownUnit(String),

    #[error("invalid number '{value}': {source}")]
    InvalidNumber {
        value: String,
        #[source]
        source: ParseFloatError,
    },
}

#[derive(Debug, Error)]
pub enum SampleError {
    /// The whole source failed for this tick; its contribution is skipped.
    #[error("{kind} source unavailable: {reason}")]
    SourceUnavailable { kind: SourceKind, reason: String },

    #[error("{kind} source timed out after {after:?}")]
    Timeout { kind: SourceKind, after: Duration },

    /// One record could not be used; the rest of the snapshot still applies.
    #[error("malformed sample '{record}': {reason}")]
    MalformedSample { record: String, reason: String },
}

impl SampleError {
    pub fn unavailable(kind: SourceKind, reason: impl std::fmt::Display) -> Self {
        SampleError::SourceUnavailable {
            kind,
            reason: reason.to_string(),
        }
    }

    pub fn malformed(record: &str, reason: impl std::fmt::Display) -> Self {
        SampleError::MalformedSample {
            record: record.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<UnitError> for SampleError {
    fn from(e: UnitError) -> Self {
        let record = match &e {
            UnitError::UnknownUnit(v) => v.clone(),
            UnitError::InvalidNumber { value, .. } => value.clone(),
        };
        SampleError::MalformedSample {
            record,
            reason: e.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransmissionError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("backend rejected line with status {status}: {body}")]
    Status { status: u16, body: String },
}
