//! # bucket-finality
//!
//! Reporting buckets whose finalization deadline is pushed out by slash
//! events.
//!
//! ## Overview
//!
//! This crate provides:
//! - **Bucket**: a recurring submission window plus a finalization deadline
//! - **Slash Log**: nonce-keyed slash timestamps, replayed lazily into the window
//! - **Epoch-versioned Reports**: a slash invalidates every report held so far
//! - **Service**: a registry of independent buckets feeding an observer
//!
//! ## Architecture
//!
//! ```text
//! Clock source ──warp_forward──→ ┐
//! Slash source ──execute_slash──→ ├─→ BucketService ──→ Bucket (per-bucket lock)
//! Submitter ────push_report────→ ┘         │
//!                                          └── BucketEvent / BucketSnapshot ──→ BucketObserver
//! ```
//!
//! ## Lifecycle
//!
//! ```text
//! [OPEN] ──clock > window end──→ [PENDING_FINALIZATION] ──clock ≥ deadline──→ [FINALIZED]
//!    ↑                                   │
//!    └────── slash inside the window ────┘
//! ```
//!
//! `Finalized` is a predicate over current state, not a sticky flag.
//!
//! ## Example
//!
//! ```rust
//! use bucket_finality::{Bucket, BucketId, WEEK_SECS};
//!
//! let mut bucket: Bucket<u64> = Bucket::new(BucketId::new(0), 0);
//! bucket.warp_forward(2 * WEEK_SECS as i64 - 10).unwrap();
//! bucket.execute_slash_event();
//!
//! assert_eq!(bucket.calculate_submission_start(), 3 * WEEK_SECS);
//! assert!(!bucket.is_finalized());
//! ```

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod events;
pub mod metrics;
pub mod ports;

pub use adapters::JsonLinesObserver;
pub use application::BucketService;
pub use config::{BucketConfig, ServiceConfig};
#[cfg(feature = "toml-config")]
pub use config::ConfigError;
pub use domain::{
    week_ceiling_submission_start, Bucket, BucketError, BucketId, BucketResult, BucketSnapshot,
    BucketStatus, Nonce, Timestamp, WEEK_SECS,
};
pub use events::BucketEvent;
pub use ports::{BucketApi, BucketObserver, NoopObserver, ObserverError, RecordingObserver};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
