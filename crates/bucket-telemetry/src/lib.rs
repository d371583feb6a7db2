//! # Bucket Telemetry
//!
//! Logging setup shared by the bucket-finality binaries.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bucket_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_logging(&config).expect("Failed to init logging");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BUCKET_SERVICE_NAME` | `bucket-finality` | Service name in logs |
//! | `BUCKET_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `BUCKET_CONSOLE_OUTPUT` | `true` | Write logs to stderr |
//! | `BUCKET_JSON_LOGS` | `false` | JSON log lines (default `true` in containers) |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),
}
