//! Driven Ports (SPI - Outbound Dependencies)
//!
//! The only outbound dependency is an observer that receives events and
//! snapshots for logging, tabular export or charting.

use crate::domain::BucketSnapshot;
use crate::events::BucketEvent;
use parking_lot::Mutex;
use thiserror::Error;

/// Observer failures. These never fail the bucket operation that caused them.
#[derive(Debug, Error)]
pub enum ObserverError {
    /// Writing to the sink failed.
    #[error("Observer I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding the record failed.
    #[error("Observer encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Receives bucket events and snapshots.
pub trait BucketObserver: Send + Sync {
    /// Called for every drained bucket event, in order.
    fn on_event(&self, event: &BucketEvent) -> Result<(), ObserverError>;

    /// Called with the bucket state after a mutating operation.
    fn on_snapshot(&self, snapshot: &BucketSnapshot) -> Result<(), ObserverError>;
}

// =============================================================================
// In-process implementations
// =============================================================================

/// Observer that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl BucketObserver for NoopObserver {
    fn on_event(&self, _event: &BucketEvent) -> Result<(), ObserverError> {
        Ok(())
    }

    fn on_snapshot(&self, _snapshot: &BucketSnapshot) -> Result<(), ObserverError> {
        Ok(())
    }
}

/// Observer that keeps everything in memory, for tests.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<BucketEvent>>,
    snapshots: Mutex<Vec<BucketSnapshot>>,
}

impl RecordingObserver {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far.
    pub fn events(&self) -> Vec<BucketEvent> {
        self.events.lock().clone()
    }

    /// Snapshots received so far.
    pub fn snapshots(&self) -> Vec<BucketSnapshot> {
        self.snapshots.lock().clone()
    }

    /// Clear both buffers.
    pub fn clear(&self) {
        self.events.lock().clear();
        self.snapshots.lock().clear();
    }
}

impl BucketObserver for RecordingObserver {
    fn on_event(&self, event: &BucketEvent) -> Result<(), ObserverError> {
        self.events.lock().push(event.clone());
        Ok(())
    }

    fn on_snapshot(&self, snapshot: &BucketSnapshot) -> Result<(), ObserverError> {
        self.snapshots.lock().push(snapshot.clone());
        Ok(())
    }
}
