//! Outgoing events for the bucket state machine
//!
//! Buckets queue these as they mutate; the service drains them and hands
//! them to the configured observer.

use crate::domain::{BucketId, Nonce, Timestamp};
use serde::{Deserialize, Serialize};

/// Something observable happened to a bucket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BucketEvent {
    /// A slash consumed `nonce` at `timestamp`.
    SlashRecorded {
        bucket_id: BucketId,
        nonce: Nonce,
        timestamp: Timestamp,
    },
    /// Pending slashes were replayed into the window.
    WindowRecomputed {
        bucket_id: BucketId,
        window_start: Timestamp,
        finalization_timestamp: Timestamp,
        applied: u64,
        deferred_from: Option<Nonce>,
    },
    /// A stale report store was cleared on epoch fast-forward.
    ReportsInvalidated {
        bucket_id: BucketId,
        discarded: usize,
        from_epoch: Nonce,
        to_epoch: Nonce,
    },
    /// A report was appended.
    ReportAccepted {
        bucket_id: BucketId,
        epoch: Nonce,
        report_count: usize,
    },
    /// A report arrived after the window boundary.
    SubmissionRejected {
        bucket_id: BucketId,
        current_timestamp: Timestamp,
        window_start: Timestamp,
    },
    /// The finalization predicate flipped to true.
    FinalizationObserved {
        bucket_id: BucketId,
        timestamp: Timestamp,
    },
    /// The finalization predicate flipped back to false.
    FinalizationRevoked {
        bucket_id: BucketId,
        timestamp: Timestamp,
    },
}

impl BucketEvent {
    /// Bucket the event belongs to.
    pub fn bucket_id(&self) -> BucketId {
        match self {
            Self::SlashRecorded { bucket_id, .. }
            | Self::WindowRecomputed { bucket_id, .. }
            | Self::ReportsInvalidated { bucket_id, .. }
            | Self::ReportAccepted { bucket_id, .. }
            | Self::SubmissionRejected { bucket_id, .. }
            | Self::FinalizationObserved { bucket_id, .. }
            | Self::FinalizationRevoked { bucket_id, .. } => *bucket_id,
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SlashRecorded { .. } => "slash_recorded",
            Self::WindowRecomputed { .. } => "window_recomputed",
            Self::ReportsInvalidated { .. } => "reports_invalidated",
            Self::ReportAccepted { .. } => "report_accepted",
            Self::SubmissionRejected { .. } => "submission_rejected",
            Self::FinalizationObserved { .. } => "finalization_observed",
            Self::FinalizationRevoked { .. } => "finalization_revoked",
        }
    }
}
