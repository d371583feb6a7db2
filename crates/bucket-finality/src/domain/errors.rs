//! # Domain Errors
//!
//! Error types for the bucket state machine and its service.

use super::value_objects::{BucketId, Timestamp};
use thiserror::Error;

/// Bucket error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BucketError {
    /// Report arrived after the (recomputed) submission-window start.
    #[error("Submission window violation: current timestamp {current_timestamp} > last possible submission timestamp {window_start}")]
    SubmissionWindowViolation {
        /// Bucket clock at submission time
        current_timestamp: Timestamp,
        /// Recomputed window boundary
        window_start: Timestamp,
    },

    /// Clock was asked to move backwards.
    #[error("Time cannot move backwards: delta {delta}")]
    NegativeTimeAdvance {
        /// Rejected delta
        delta: i64,
    },

    /// Clock advance does not fit in a timestamp.
    #[error("Timestamp overflow: {current} + {delta}")]
    TimestampOverflow {
        /// Clock before the advance
        current: Timestamp,
        /// Requested delta
        delta: u64,
    },

    /// No bucket registered under this id.
    #[error("Unknown bucket: {bucket_id}")]
    UnknownBucket {
        /// Requested id
        bucket_id: BucketId,
    },

    /// A bucket with this id already exists.
    #[error("Bucket already exists: {bucket_id}")]
    DuplicateBucket {
        /// Conflicting id
        bucket_id: BucketId,
    },

    /// A state invariant does not hold.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Configuration rejected by validation.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type for bucket operations.
pub type BucketResult<T> = Result<T, BucketError>;
