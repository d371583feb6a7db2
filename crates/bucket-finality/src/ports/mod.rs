//! # Ports Module
//!
//! Hexagonal architecture ports (inbound API, outbound observer).

pub mod inbound;
pub mod outbound;

pub use inbound::BucketApi;
pub use outbound::{BucketObserver, NoopObserver, ObserverError, RecordingObserver};
