//! Events module for the bucket state machine

pub mod outgoing;

pub use outgoing::BucketEvent;
