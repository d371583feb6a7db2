//! # Algorithms Module
//!
//! Pure functions over the slash log, kept apart from the mutable bucket.

pub mod window_replay;

pub use window_replay::{replay_slash_window, within_window, ReplayOutcome};
