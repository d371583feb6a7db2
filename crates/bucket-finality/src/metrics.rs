//! # Bucket Metrics
//!
//! Prometheus metrics for monitoring bucket activity.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! bucket-finality = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `bucket_slash_events_total` - Counter of recorded slash events
//! - `bucket_window_replays_total` - Counter of replay passes over pending slashes
//! - `bucket_reports_accepted_total` - Counter of accepted reports
//! - `bucket_reports_rejected_total` - Counter of reports rejected by the window check
//! - `bucket_reports_invalidated_total` - Counter of reports discarded on epoch fast-forward
//! - `bucket_finalized` - Gauge of buckets currently observed as finalized

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_gauge, register_int_counter, Gauge, IntCounter};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total slash events recorded
    pub static ref SLASH_EVENTS: IntCounter = register_int_counter!(
        "bucket_slash_events_total",
        "Total number of slash events recorded"
    )
    .expect("Failed to create SLASH_EVENTS metric");

    /// Total replay passes
    pub static ref WINDOW_REPLAYS: IntCounter = register_int_counter!(
        "bucket_window_replays_total",
        "Total number of window replays over pending slashes"
    )
    .expect("Failed to create WINDOW_REPLAYS metric");

    /// Total reports accepted
    pub static ref REPORTS_ACCEPTED: IntCounter = register_int_counter!(
        "bucket_reports_accepted_total",
        "Total number of reports accepted"
    )
    .expect("Failed to create REPORTS_ACCEPTED metric");

    /// Total reports rejected
    pub static ref REPORTS_REJECTED: IntCounter = register_int_counter!(
        "bucket_reports_rejected_total",
        "Total number of reports rejected outside the submission window"
    )
    .expect("Failed to create REPORTS_REJECTED metric");

    /// Total reports discarded on resync
    pub static ref REPORTS_INVALIDATED: IntCounter = register_int_counter!(
        "bucket_reports_invalidated_total",
        "Total number of stale reports discarded on epoch fast-forward"
    )
    .expect("Failed to create REPORTS_INVALIDATED metric");

    /// Buckets currently observed as finalized
    pub static ref FINALIZED_BUCKETS: Gauge = register_gauge!(
        "bucket_finalized",
        "Number of buckets currently observed as finalized"
    )
    .expect("Failed to create FINALIZED_BUCKETS metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record a slash event
#[cfg(feature = "metrics")]
pub fn record_slash_event() {
    SLASH_EVENTS.inc();
}

/// Record a replay pass
#[cfg(feature = "metrics")]
pub fn record_window_replay() {
    WINDOW_REPLAYS.inc();
}

/// Record an accepted report
#[cfg(feature = "metrics")]
pub fn record_report_accepted() {
    REPORTS_ACCEPTED.inc();
}

/// Record a rejected report
#[cfg(feature = "metrics")]
pub fn record_report_rejected() {
    REPORTS_REJECTED.inc();
}

/// Record reports discarded on resync
#[cfg(feature = "metrics")]
pub fn record_reports_invalidated(count: u64) {
    REPORTS_INVALIDATED.inc_by(count);
}

/// Update the finalized bucket gauge
#[cfg(feature = "metrics")]
pub fn set_finalized_buckets(count: u64) {
    FINALIZED_BUCKETS.set(count as f64);
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_slash_event() {}

#[cfg(not(feature = "metrics"))]
pub fn record_window_replay() {}

#[cfg(not(feature = "metrics"))]
pub fn record_report_accepted() {}

#[cfg(not(feature = "metrics"))]
pub fn record_report_rejected() {}

#[cfg(not(feature = "metrics"))]
pub fn record_reports_invalidated(_count: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn set_finalized_buckets(_count: u64) {}
