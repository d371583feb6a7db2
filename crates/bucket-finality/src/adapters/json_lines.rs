//! JSON-lines observer
//!
//! Writes one JSON object per event or snapshot to any `Write` sink, for
//! downstream table export or charting.

use crate::domain::BucketSnapshot;
use crate::events::BucketEvent;
use crate::ports::{BucketObserver, ObserverError};
use parking_lot::Mutex;
use serde::Serialize;
use std::io::Write;

/// One output line.
#[derive(Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
enum Record<'a> {
    Event(&'a BucketEvent),
    Snapshot(&'a BucketSnapshot),
}

/// Observer writing JSON lines.
pub struct JsonLinesObserver<W: Write + Send> {
    writer: Mutex<W>,
    include_snapshots: bool,
}

impl<W: Write + Send> JsonLinesObserver<W> {
    /// Write both events and snapshots.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            include_snapshots: true,
        }
    }

    /// Write events only.
    pub fn events_only(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            include_snapshots: false,
        }
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_record(&self, record: &Record<'_>) -> Result<(), ObserverError> {
        let mut writer = self.writer.lock();
        serde_json::to_writer(&mut *writer, record)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> BucketObserver for JsonLinesObserver<W> {
    fn on_event(&self, event: &BucketEvent) -> Result<(), ObserverError> {
        self.write_record(&Record::Event(event))
    }

    fn on_snapshot(&self, snapshot: &BucketSnapshot) -> Result<(), ObserverError> {
        if !self.include_snapshots {
            return Ok(());
        }
        self.write_record(&Record::Snapshot(snapshot))
    }
}
