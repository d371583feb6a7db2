//! Driving Ports (API - Inbound)
//!
//! Operations exposed to clock sources, report submitters and observers.
//! Every call is synchronous; there are no suspension points in the model.

use crate::domain::{BucketId, BucketResult, BucketSnapshot, BucketStatus, Nonce, Timestamp};

/// Primary bucket API.
///
/// Each method addresses a single bucket by id and is serialized against
/// other calls on that bucket.
pub trait BucketApi<R>: Send + Sync {
    /// Register a new bucket whose origin nonce is `bucket_origin_nonce`.
    fn create_bucket(&self, id: BucketId, bucket_origin_nonce: Nonce) -> BucketResult<()>;

    /// Advance a bucket's clock. Negative deltas are rejected.
    fn warp_forward(&self, id: BucketId, delta: i64) -> BucketResult<Timestamp>;

    /// Record a slash at the bucket's current timestamp.
    fn execute_slash_event(&self, id: BucketId) -> BucketResult<Nonce>;

    /// Submit a report; returns the number of reports held for the epoch.
    fn push_report(&self, id: BucketId, report: R) -> BucketResult<usize>;

    /// Recompute and return the submission-window start.
    fn calculate_submission_start(&self, id: BucketId) -> BucketResult<Timestamp>;

    /// Evaluate the finalization predicate.
    fn is_finalized(&self, id: BucketId) -> BucketResult<bool>;

    /// Derived lifecycle state.
    fn status(&self, id: BucketId) -> BucketResult<BucketStatus>;

    /// Point-in-time view of a bucket.
    fn snapshot(&self, id: BucketId) -> BucketResult<BucketSnapshot>;

    /// Ids of every registered bucket, ascending.
    fn bucket_ids(&self) -> Vec<BucketId>;
}
