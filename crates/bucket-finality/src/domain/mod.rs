//! # Domain Module
//!
//! Core types for the bucket state machine.
//!
//! ## Core Modules
//! - bucket: The state machine itself
//! - slash_log: Nonce-keyed append-only slash timestamps
//! - report_store: Epoch-versioned report buffer
//! - value_objects: Timestamps, ids, snapshots, week-ceiling
//! - invariants: Structural checks used by tests and callers
//! - errors: Error types

pub mod bucket;
pub mod errors;
pub mod invariants;
pub mod report_store;
pub mod slash_log;
pub mod value_objects;

pub use bucket::Bucket;
pub use errors::{BucketError, BucketResult};
pub use invariants::{
    check_bucket_invariants, invariant_clock_monotonic, invariant_deadline_after_window,
    invariant_deadline_covers_window, invariant_nonce_order, invariant_slash_log_dense,
    invariant_slash_log_ordered,
};
pub use report_store::ReportStore;
pub use slash_log::SlashLog;
pub use value_objects::{
    week_ceiling_submission_start, week_ceiling_with_period, BucketId, BucketSnapshot,
    BucketStatus, Nonce, Timestamp, WEEK_SECS,
};
