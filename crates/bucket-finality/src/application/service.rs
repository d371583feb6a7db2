//! # Bucket Service
//!
//! Registry of independent buckets. Each bucket sits behind its own mutex,
//! so calls on different buckets never contend; calls on one bucket are
//! serialized.
//!
//! After every call the service drains the bucket's queued events, tracks
//! flips of the finalization predicate, and forwards everything to the
//! observer. Observer failures are logged and swallowed.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::domain::{
    Bucket, BucketError, BucketId, BucketResult, BucketSnapshot, BucketStatus, Nonce, Timestamp,
};
use crate::events::BucketEvent;
use crate::metrics;
use crate::ports::{BucketApi, BucketObserver};

/// A bucket plus what the service last observed about it.
struct BucketEntry<R> {
    bucket: Bucket<R>,
    observed_finalized: bool,
    /// Set by `remove_bucket`; callers still holding the entry must not touch it.
    removed: bool,
}

type SharedEntry<R> = Arc<Mutex<BucketEntry<R>>>;

/// Bucket Service - owns buckets and feeds the observer.
pub struct BucketService<R, O: BucketObserver> {
    /// Configuration.
    config: ServiceConfig,
    /// Buckets by id.
    buckets: RwLock<BTreeMap<BucketId, SharedEntry<R>>>,
    /// Event and snapshot sink.
    observer: Arc<O>,
    /// Buckets whose last observed predicate was true.
    finalized_count: AtomicU64,
}

impl<R, O: BucketObserver> BucketService<R, O> {
    /// Create a new service.
    pub fn new(config: ServiceConfig, observer: Arc<O>) -> BucketResult<Self> {
        config.bucket.validate()?;
        Ok(Self {
            config,
            buckets: RwLock::new(BTreeMap::new()),
            observer,
            finalized_count: AtomicU64::new(0),
        })
    }

    /// Service configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Observer handle.
    pub fn observer(&self) -> &Arc<O> {
        &self.observer
    }

    /// Number of registered buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.read().len()
    }

    /// Buckets whose finalization was last observed as true.
    pub fn finalized_count(&self) -> u64 {
        self.finalized_count.load(Ordering::Relaxed)
    }

    /// Unregister a bucket, returning its final snapshot.
    pub fn remove_bucket(&self, id: BucketId) -> BucketResult<BucketSnapshot> {
        let entry = self
            .buckets
            .write()
            .remove(&id)
            .ok_or(BucketError::UnknownBucket { bucket_id: id })?;
        let mut entry = entry.lock();
        entry.removed = true;
        if entry.observed_finalized {
            self.finalized_count.fetch_sub(1, Ordering::Relaxed);
            metrics::set_finalized_buckets(self.finalized_count());
        }
        info!(bucket_id = %id, "[bucket] Bucket removed");
        Ok(entry.bucket.snapshot())
    }

    /// Compact a bucket's slash log. Returns the number of entries removed.
    pub fn compact(&self, id: BucketId) -> BucketResult<usize> {
        self.with_bucket(id, false, |bucket| Ok(bucket.compact_slash_log()))
    }

    /// Reports currently held by a bucket.
    pub fn reports(&self, id: BucketId) -> BucketResult<Vec<R>>
    where
        R: Clone,
    {
        self.with_bucket(id, false, |bucket| Ok(bucket.reports().to_vec()))
    }

    /// Run `op` against one bucket, then publish what changed.
    fn with_bucket<T>(
        &self,
        id: BucketId,
        mutating: bool,
        op: impl FnOnce(&mut Bucket<R>) -> BucketResult<T>,
    ) -> BucketResult<T> {
        let entry = self
            .buckets
            .read()
            .get(&id)
            .cloned()
            .ok_or(BucketError::UnknownBucket { bucket_id: id })?;
        self.with_entry(id, &entry, mutating, op)
    }

    /// Like `with_bucket`, on an entry already looked up. Fails if the entry
    /// was removed after the lookup.
    fn with_entry<T>(
        &self,
        id: BucketId,
        entry: &SharedEntry<R>,
        mutating: bool,
        op: impl FnOnce(&mut Bucket<R>) -> BucketResult<T>,
    ) -> BucketResult<T> {
        let mut entry = entry.lock();
        if entry.removed {
            return Err(BucketError::UnknownBucket { bucket_id: id });
        }
        let result = op(&mut entry.bucket);

        let mut events = entry.bucket.take_events();
        if let Some(flip) = self.observe_finalization(&mut entry) {
            events.push(flip);
        }
        for event in &events {
            self.dispatch_event(event);
        }
        if mutating && self.config.emit_snapshots {
            let snapshot = entry.bucket.snapshot();
            if let Err(e) = self.observer.on_snapshot(&snapshot) {
                warn!(bucket_id = %id, error = %e, "[bucket] Observer rejected snapshot");
            }
        }

        result
    }

    /// Compare the predicate with the last observation and record a flip.
    fn observe_finalization(&self, entry: &mut BucketEntry<R>) -> Option<BucketEvent> {
        let finalized = entry.bucket.is_finalized();
        if finalized == entry.observed_finalized {
            return None;
        }
        entry.observed_finalized = finalized;

        let bucket_id = entry.bucket.id();
        let timestamp = entry.bucket.current_timestamp();
        if finalized {
            self.finalized_count.fetch_add(1, Ordering::Relaxed);
            info!(bucket_id = %bucket_id, timestamp, "[bucket] Bucket finalized");
        } else {
            self.finalized_count.fetch_sub(1, Ordering::Relaxed);
            warn!(bucket_id = %bucket_id, timestamp, "[bucket] Finalization revoked");
        }
        metrics::set_finalized_buckets(self.finalized_count());

        Some(if finalized {
            BucketEvent::FinalizationObserved {
                bucket_id,
                timestamp,
            }
        } else {
            BucketEvent::FinalizationRevoked {
                bucket_id,
                timestamp,
            }
        })
    }

    fn dispatch_event(&self, event: &BucketEvent) {
        match event {
            BucketEvent::SlashRecorded { .. } => metrics::record_slash_event(),
            BucketEvent::WindowRecomputed { .. } => metrics::record_window_replay(),
            BucketEvent::ReportAccepted { .. } => metrics::record_report_accepted(),
            BucketEvent::SubmissionRejected { .. } => metrics::record_report_rejected(),
            BucketEvent::ReportsInvalidated { discarded, .. } => {
                metrics::record_reports_invalidated(*discarded as u64)
            }
            BucketEvent::FinalizationObserved { .. } | BucketEvent::FinalizationRevoked { .. } => {}
        }

        debug!(bucket_id = %event.bucket_id(), kind = event.kind(), "[bucket] Dispatching event");
        if let Err(e) = self.observer.on_event(event) {
            warn!(
                bucket_id = %event.bucket_id(),
                kind = event.kind(),
                error = %e,
                "[bucket] Observer rejected event"
            );
        }
    }
}

impl<R, O> BucketApi<R> for BucketService<R, O>
where
    R: Send + 'static,
    O: BucketObserver,
{
    fn create_bucket(&self, id: BucketId, bucket_origin_nonce: Nonce) -> BucketResult<()> {
        let bucket = Bucket::with_config(id, bucket_origin_nonce, self.config.bucket.clone())?
            .with_event_queue();
        let snapshot = bucket.snapshot();
        {
            let mut buckets = self.buckets.write();
            if buckets.contains_key(&id) {
                return Err(BucketError::DuplicateBucket { bucket_id: id });
            }
            buckets.insert(
                id,
                Arc::new(Mutex::new(BucketEntry {
                    bucket,
                    observed_finalized: false,
                    removed: false,
                })),
            );
        }

        info!(bucket_id = %id, origin_nonce = bucket_origin_nonce, "[bucket] Bucket created");
        if self.config.emit_snapshots {
            if let Err(e) = self.observer.on_snapshot(&snapshot) {
                warn!(bucket_id = %id, error = %e, "[bucket] Observer rejected snapshot");
            }
        }
        Ok(())
    }

    fn warp_forward(&self, id: BucketId, delta: i64) -> BucketResult<Timestamp> {
        self.with_bucket(id, true, |bucket| bucket.warp_forward(delta))
    }

    fn execute_slash_event(&self, id: BucketId) -> BucketResult<Nonce> {
        self.with_bucket(id, true, |bucket| Ok(bucket.execute_slash_event()))
    }

    fn push_report(&self, id: BucketId, report: R) -> BucketResult<usize> {
        let compact = self.config.compact_on_sync;
        self.with_bucket(id, true, |bucket| {
            let count = bucket.push_report(report)?;
            if compact {
                bucket.compact_slash_log();
            }
            Ok(count)
        })
    }

    fn calculate_submission_start(&self, id: BucketId) -> BucketResult<Timestamp> {
        self.with_bucket(id, true, |bucket| Ok(bucket.calculate_submission_start()))
    }

    fn is_finalized(&self, id: BucketId) -> BucketResult<bool> {
        self.with_bucket(id, false, |bucket| Ok(bucket.is_finalized()))
    }

    fn status(&self, id: BucketId) -> BucketResult<BucketStatus> {
        self.with_bucket(id, false, |bucket| Ok(bucket.status()))
    }

    fn snapshot(&self, id: BucketId) -> BucketResult<BucketSnapshot> {
        self.with_bucket(id, false, |bucket| Ok(bucket.snapshot()))
    }

    fn bucket_ids(&self) -> Vec<BucketId> {
        self.buckets.read().keys().copied().collect()
    }
}
