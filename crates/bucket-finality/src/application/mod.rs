//! # Application Module
//!
//! Application services orchestrating buckets and the outbound observer.

pub mod service;

pub use service::BucketService;
