//! # Bucket Configuration
//!
//! Window geometry for new buckets and service-level switches.
//!
//! The defaults reproduce the reference bucket: a one-week period, a
//! submission window ending one week after genesis and a finalization
//! deadline two weeks after genesis.

use crate::domain::{BucketError, BucketResult, Timestamp, WEEK_SECS};
use serde::{Deserialize, Serialize};

/// Window geometry for a bucket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketConfig {
    /// Quantization period for week-ceiling (seconds).
    pub week_secs: u64,

    /// Clock value a new bucket starts at.
    pub genesis_timestamp: Timestamp,

    /// Initial submission-window start, relative to genesis.
    pub submission_start_offset: u64,

    /// Initial submission-window end, relative to genesis.
    pub submission_end_offset: u64,

    /// Initial finalization deadline, relative to genesis.
    pub finalization_offset: u64,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            week_secs: WEEK_SECS,
            genesis_timestamp: 0,
            submission_start_offset: 0,
            submission_end_offset: WEEK_SECS,
            finalization_offset: 2 * WEEK_SECS,
        }
    }
}

impl BucketConfig {
    /// Create a config for testing (100 second weeks).
    pub fn for_testing() -> Self {
        Self {
            week_secs: 100,
            genesis_timestamp: 0,
            submission_start_offset: 0,
            submission_end_offset: 100,
            finalization_offset: 200,
        }
    }

    /// Check the geometry is usable.
    pub fn validate(&self) -> BucketResult<()> {
        if self.week_secs == 0 {
            return Err(BucketError::InvalidConfig(
                "week_secs must be non-zero".to_string(),
            ));
        }
        if self.submission_start_offset > self.submission_end_offset {
            return Err(BucketError::InvalidConfig(format!(
                "submission_start_offset {} exceeds submission_end_offset {}",
                self.submission_start_offset, self.submission_end_offset
            )));
        }
        if self.finalization_offset < self.submission_end_offset {
            return Err(BucketError::InvalidConfig(format!(
                "finalization_offset {} is before submission_end_offset {}",
                self.finalization_offset, self.submission_end_offset
            )));
        }
        if self
            .genesis_timestamp
            .checked_add(self.finalization_offset)
            .is_none()
        {
            return Err(BucketError::InvalidConfig(
                "finalization deadline overflows".to_string(),
            ));
        }
        Ok(())
    }

    /// Absolute initial window start.
    pub fn initial_submission_start(&self) -> Timestamp {
        self.genesis_timestamp.saturating_add(self.submission_start_offset)
    }

    /// Absolute initial window end.
    pub fn initial_submission_end(&self) -> Timestamp {
        self.genesis_timestamp.saturating_add(self.submission_end_offset)
    }

    /// Absolute initial finalization deadline.
    pub fn initial_finalization(&self) -> Timestamp {
        self.genesis_timestamp.saturating_add(self.finalization_offset)
    }
}

/// Configuration for [`BucketService`](crate::BucketService).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Geometry applied to every bucket the service creates.
    pub bucket: BucketConfig,

    /// Send a snapshot to the observer after every mutating operation.
    pub emit_snapshots: bool,

    /// Compact the slash log whenever a report resynchronizes the epoch.
    pub compact_on_sync: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bucket: BucketConfig::default(),
            emit_snapshots: true,
            compact_on_sync: false,
        }
    }
}

impl ServiceConfig {
    /// Create a config for testing.
    pub fn for_testing() -> Self {
        Self {
            bucket: BucketConfig::for_testing(),
            emit_snapshots: true,
            compact_on_sync: false,
        }
    }
}

// ============================================================================
// TOML loading (requires "toml-config" feature)
// ============================================================================

#[cfg(feature = "toml-config")]
mod toml_config {
    use super::*;
    use std::fs;
    use std::path::Path;
    use thiserror::Error;

    /// Errors that can occur during config loading.
    #[derive(Debug, Error)]
    pub enum ConfigError {
        /// File I/O error.
        #[error("Failed to read {path}: {error}")]
        Io {
            /// Path of the file that failed to load.
            path: String,
            /// Error message from the I/O operation.
            error: String,
        },
        /// TOML parsing error.
        #[error("Failed to parse config: {0}")]
        Parse(String),
        /// Parsed config failed validation.
        #[error(transparent)]
        Invalid(#[from] BucketError),
    }

    impl BucketConfig {
        /// Parse and validate a bucket config from TOML.
        ///
        /// ```toml
        /// week_secs = 604800
        /// genesis_timestamp = 0
        /// submission_end_offset = 604800
        /// finalization_offset = 1209600
        /// ```
        pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
            let config: Self =
                toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
            config.validate()?;
            Ok(config)
        }

        /// Load and validate a bucket config from a TOML file.
        pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
            let content = read(path.as_ref())?;
            Self::from_toml_str(&content)
        }
    }

    impl ServiceConfig {
        /// Parse and validate a service config from TOML.
        ///
        /// ```toml
        /// emit_snapshots = true
        /// compact_on_sync = false
        ///
        /// [bucket]
        /// week_secs = 604800
        /// ```
        pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
            let config: Self =
                toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
            config.bucket.validate()?;
            Ok(config)
        }

        /// Load and validate a service config from a TOML file.
        pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
            let content = read(path.as_ref())?;
            Self::from_toml_str(&content)
        }
    }

    fn read(path: &Path) -> Result<String, ConfigError> {
        fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            error: e.to_string(),
        })
    }
}

#[cfg(feature = "toml-config")]
pub use toml_config::ConfigError;
