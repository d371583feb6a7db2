//! Adapters for outbound ports.

pub mod json_lines;

pub use json_lines::JsonLinesObserver;
