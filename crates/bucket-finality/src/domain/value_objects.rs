//! # Value Objects
//!
//! Timestamps, nonces, identifiers and the week-ceiling quantization used
//! to place a new submission window after a slash.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Seconds since the bucket clock's genesis.
pub type Timestamp = u64;

/// Slash-event version counter.
pub type Nonce = u64;

/// One week in seconds.
pub const WEEK_SECS: u64 = 604_800;

/// Opaque bucket identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketId(pub u64);

impl BucketId {
    /// Create a new bucket id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for BucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bucket-{}", self.0)
    }
}

impl From<u64> for BucketId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Earliest submission-window start after a slash at `timestamp`.
///
/// `floor(timestamp / WEEK) * WEEK + 2 * WEEK`
pub fn week_ceiling_submission_start(timestamp: Timestamp) -> Timestamp {
    week_ceiling_with_period(timestamp, WEEK_SECS)
}

/// Week-ceiling with a configurable period.
///
/// Saturates at `u64::MAX` instead of wrapping. `period` must be non-zero,
/// which [`BucketConfig::validate`](crate::BucketConfig::validate) enforces.
pub fn week_ceiling_with_period(timestamp: Timestamp, period: u64) -> Timestamp {
    let aligned = (timestamp / period) * period;
    aligned.saturating_add(period.saturating_mul(2))
}

/// Externally observed lifecycle state of a bucket.
///
/// ```text
/// [Open] ──window end passes──→ [PendingFinalization] ──deadline reached──→ [Finalized]
///   ↑                                   │                                        │
///   └──────── slash + resync ───────────┴──────── unresolved early slash ────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketStatus {
    /// Clock is at or before the stored submission-window boundary.
    Open,
    /// Window closed, but the deadline is not reached or a pending slash blocks it.
    PendingFinalization,
    /// The finalization predicate currently holds.
    Finalized,
}

impl fmt::Display for BucketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::PendingFinalization => write!(f, "pending_finalization"),
            Self::Finalized => write!(f, "finalized"),
        }
    }
}

/// Point-in-time view of a bucket for observers and exporters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSnapshot {
    /// Bucket identifier.
    pub id: BucketId,
    /// Nonce at creation.
    pub bucket_origin_nonce: Nonce,
    /// Current slash counter.
    pub global_nonce: Nonce,
    /// Epoch the report store is synchronized to.
    pub last_updated_nonce: Nonce,
    /// Bucket clock.
    pub current_timestamp: Timestamp,
    /// Lower bound of the window.
    pub submission_start_timestamp: Timestamp,
    /// Upper bound of the window.
    pub submission_end_timestamp: Timestamp,
    /// Finalization deadline.
    pub finalization_timestamp: Timestamp,
    /// Reports held for the current epoch.
    pub report_count: usize,
    /// Slash events not yet folded into the report epoch.
    pub pending_slashes: u64,
    /// Result of the finalization predicate.
    pub finalized: bool,
    /// Derived lifecycle state.
    pub status: BucketStatus,
}
