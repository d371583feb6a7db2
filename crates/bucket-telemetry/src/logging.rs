//! Structured logging setup.
//!
//! Logs go to stderr so that binaries can keep stdout for data. With
//! `json_logs` every line is a JSON object carrying the span and event
//! fields; otherwise a human-readable format is used.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Build the level filter for a config.
///
/// Uses `config.log_level` only; `TelemetryConfig::from_env` has already
/// resolved `BUCKET_LOG_LEVEL` ahead of `RUST_LOG`.
pub fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(&config.log_level).map_err(|e| TelemetryError::Filter(e.to_string()))
}

/// Install the global subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = build_filter(config)?;

    let json_layer = (config.console_output && config.json_logs).then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
    });

    let pretty_layer = (config.console_output && !config.json_logs).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .try_init()
        .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

    tracing::debug!(
        service = %config.service_name,
        json_logs = config.json_logs,
        log_level = %config.log_level,
        "Structured logging initialized"
    );

    Ok(())
}

/// Log a bucket-related event with standard fields.
///
/// ```rust,ignore
/// log_bucket_event!(info, "Bucket finalized", bucket_id, timestamp = ts);
/// ```
#[macro_export]
macro_rules! log_bucket_event {
    ($level:ident, $msg:expr, $bucket_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            subsystem = "bucket",
            bucket_id = %$bucket_id,
            $($($field)*,)?
            $msg
        )
    };
}
