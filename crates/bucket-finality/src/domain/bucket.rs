//! # Bucket
//!
//! A recurring reporting window whose finalization deadline can be pushed
//! out by slash events.
//!
//! ## Nonces
//!
//! Every slash consumes the current global nonce. The report store is
//! tagged with the nonce epoch it was filled under (`last_updated_nonce`);
//! once a slash moves the global nonce past it, the store is stale and is
//! discarded by the next accepted report.
//!
//! ## Window recomputation
//!
//! The window is recomputed lazily, only from [`Bucket::calculate_submission_start`]
//! (directly or through [`Bucket::push_report`]):
//!
//! | State | Window start |
//! |-------|--------------|
//! | no slash since creation | stored `submission_end_timestamp` |
//! | store synchronized to the latest nonce | week-ceiling of the most recent slash |
//! | slashes pending | replay from `last_updated_nonce`, persisted into the window fields |
//!
//! Replay never moves `last_updated_nonce`; only an accepted report does,
//! and it jumps straight to the global nonce.

use super::errors::{BucketError, BucketResult};
use super::report_store::ReportStore;
use super::slash_log::SlashLog;
use super::value_objects::{
    week_ceiling_with_period, BucketId, BucketSnapshot, BucketStatus, Nonce, Timestamp,
};
use crate::algorithms::replay_slash_window;
use crate::config::BucketConfig;
use crate::events::BucketEvent;
use tracing::{debug, info, warn};

/// Bucket state machine.
#[derive(Clone, Debug)]
pub struct Bucket<R> {
    /// Opaque identifier.
    id: BucketId,
    /// Window geometry.
    config: BucketConfig,
    /// Global nonce at creation.
    bucket_origin_nonce: Nonce,
    /// External clock, never decreases.
    current_timestamp: Timestamp,
    /// Replay anchor for the window start.
    submission_start_timestamp: Timestamp,
    /// Last possible submission timestamp.
    submission_end_timestamp: Timestamp,
    /// Deadline at or after which the bucket may finalize.
    finalization_timestamp: Timestamp,
    /// Slash timestamps by nonce. `next_nonce()` is the global nonce.
    slash_log: SlashLog,
    /// Reports for epoch `last_updated_nonce`.
    reports: ReportStore<R>,
    /// Events not yet drained by the owner.
    pending_events: Vec<BucketEvent>,
    /// Queue events at all. Off unless an owner drains them.
    queue_events: bool,
}

impl<R> Bucket<R> {
    /// Create a bucket with the default one-week geometry.
    pub fn new(id: BucketId, bucket_origin_nonce: Nonce) -> Self {
        Self::from_validated(id, bucket_origin_nonce, BucketConfig::default())
    }

    /// Create a bucket with custom geometry.
    pub fn with_config(
        id: BucketId,
        bucket_origin_nonce: Nonce,
        config: BucketConfig,
    ) -> BucketResult<Self> {
        config.validate()?;
        Ok(Self::from_validated(id, bucket_origin_nonce, config))
    }

    fn from_validated(id: BucketId, bucket_origin_nonce: Nonce, config: BucketConfig) -> Self {
        Self {
            id,
            current_timestamp: config.genesis_timestamp,
            submission_start_timestamp: config.initial_submission_start(),
            submission_end_timestamp: config.initial_submission_end(),
            finalization_timestamp: config.initial_finalization(),
            config,
            bucket_origin_nonce,
            slash_log: SlashLog::new(bucket_origin_nonce),
            reports: ReportStore::new(bucket_origin_nonce),
            pending_events: Vec::new(),
            queue_events: false,
        }
    }

    /// Start queueing events for [`Bucket::take_events`].
    ///
    /// Without this the bucket records nothing, so a caller that never
    /// drains the queue holds no event memory.
    pub fn with_event_queue(mut self) -> Self {
        self.queue_events = true;
        self
    }

    /// Whether events are being queued.
    pub fn queues_events(&self) -> bool {
        self.queue_events
    }

    fn emit(&mut self, event: BucketEvent) {
        if self.queue_events {
            self.pending_events.push(event);
        }
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Advance the clock by `delta` seconds.
    ///
    /// # Errors
    /// - `NegativeTimeAdvance` if `delta < 0`
    /// - `TimestampOverflow` if the clock would leave `u64`
    ///
    /// The bucket is unchanged on error.
    pub fn warp_forward(&mut self, delta: i64) -> BucketResult<Timestamp> {
        let delta = u64::try_from(delta).map_err(|_| BucketError::NegativeTimeAdvance { delta })?;
        self.current_timestamp = self.current_timestamp.checked_add(delta).ok_or(
            BucketError::TimestampOverflow {
                current: self.current_timestamp,
                delta,
            },
        )?;
        debug!(
            bucket_id = %self.id,
            delta,
            timestamp = self.current_timestamp,
            "[bucket] Clock advanced"
        );
        Ok(self.current_timestamp)
    }

    /// Record a slash at the current timestamp and advance the global nonce.
    ///
    /// Returns the nonce the slash consumed. The window fields are left alone
    /// until the next recomputation.
    pub fn execute_slash_event(&mut self) -> Nonce {
        let nonce = self.slash_log.record(self.current_timestamp);
        info!(
            bucket_id = %self.id,
            nonce,
            timestamp = self.current_timestamp,
            "[bucket] Slash recorded"
        );
        self.emit(BucketEvent::SlashRecorded {
            bucket_id: self.id,
            nonce,
            timestamp: self.current_timestamp,
        });
        nonce
    }

    /// Recompute and return the active submission-window start.
    ///
    /// Pending slashes update `submission_end_timestamp` and
    /// `finalization_timestamp`; `last_updated_nonce` never moves here.
    pub fn calculate_submission_start(&mut self) -> Timestamp {
        let global_nonce = self.global_nonce();

        if self.bucket_origin_nonce == global_nonce {
            return self.submission_end_timestamp;
        }

        let last_updated = self.last_updated_nonce();
        if last_updated == global_nonce {
            return match self.slash_log.latest() {
                Some((_, slash_ts)) => week_ceiling_with_period(slash_ts, self.config.week_secs),
                None => self.submission_end_timestamp,
            };
        }

        let outcome = replay_slash_window(
            self.slash_log.range(last_updated, global_nonce),
            self.submission_start_timestamp,
            self.finalization_timestamp,
            self.config.week_secs,
        );

        debug!(
            bucket_id = %self.id,
            from_nonce = last_updated,
            applied = outcome.applied,
            deferred_from = ?outcome.deferred_from,
            window_start = outcome.window_start,
            finalization = outcome.finalization_timestamp,
            "[bucket] Replayed pending slashes"
        );

        self.submission_end_timestamp = outcome.window_start;
        self.finalization_timestamp = outcome.finalization_timestamp;
        self.emit(BucketEvent::WindowRecomputed {
            bucket_id: self.id,
            window_start: outcome.window_start,
            finalization_timestamp: outcome.finalization_timestamp,
            applied: outcome.applied,
            deferred_from: outcome.deferred_from,
        });

        outcome.window_start
    }

    /// Submit a report for the current epoch.
    ///
    /// A stale store is cleared and its epoch fast-forwarded to the global
    /// nonce before the report is appended. Returns the number of reports
    /// now held.
    ///
    /// # Errors
    /// - `SubmissionWindowViolation` if the clock is past the recomputed
    ///   window start
    pub fn push_report(&mut self, report: R) -> BucketResult<usize> {
        let window_start = self.calculate_submission_start();
        if self.current_timestamp > window_start {
            warn!(
                bucket_id = %self.id,
                timestamp = self.current_timestamp,
                window_start,
                "[bucket] Rejecting report outside submission window"
            );
            self.emit(BucketEvent::SubmissionRejected {
                bucket_id: self.id,
                current_timestamp: self.current_timestamp,
                window_start,
            });
            return Err(BucketError::SubmissionWindowViolation {
                current_timestamp: self.current_timestamp,
                window_start,
            });
        }

        let global_nonce = self.global_nonce();
        let from_epoch = self.reports.epoch();
        if from_epoch != global_nonce {
            let discarded = self.reports.reset_to(global_nonce);
            info!(
                bucket_id = %self.id,
                from_epoch,
                to_epoch = global_nonce,
                discarded,
                "[bucket] Report store resynchronized"
            );
            self.emit(BucketEvent::ReportsInvalidated {
                bucket_id: self.id,
                discarded,
                from_epoch,
                to_epoch: global_nonce,
            });
        }

        let report_count = self.reports.push(report);
        self.emit(BucketEvent::ReportAccepted {
            bucket_id: self.id,
            epoch: global_nonce,
            report_count,
        });
        Ok(report_count)
    }

    /// Finalization predicate. Pure read.
    ///
    /// With a pending slash, the bucket may still close if that slash landed
    /// at or after the deadline; an earlier pending slash blocks it until a
    /// recomputation resolves it.
    pub fn is_finalized(&self) -> bool {
        let last_updated = self.last_updated_nonce();
        if last_updated != self.global_nonce() {
            return match self.slash_log.get(last_updated) {
                Some(slash_ts) => {
                    slash_ts >= self.finalization_timestamp
                        && self.current_timestamp >= self.finalization_timestamp
                }
                None => false,
            };
        }
        self.current_timestamp >= self.finalization_timestamp
    }

    /// Derived lifecycle state. Pure read.
    pub fn status(&self) -> BucketStatus {
        if self.is_finalized() {
            BucketStatus::Finalized
        } else if self.current_timestamp <= self.submission_end_timestamp {
            BucketStatus::Open
        } else {
            BucketStatus::PendingFinalization
        }
    }

    /// Point-in-time view for observers.
    pub fn snapshot(&self) -> BucketSnapshot {
        BucketSnapshot {
            id: self.id,
            bucket_origin_nonce: self.bucket_origin_nonce,
            global_nonce: self.global_nonce(),
            last_updated_nonce: self.last_updated_nonce(),
            current_timestamp: self.current_timestamp,
            submission_start_timestamp: self.submission_start_timestamp,
            submission_end_timestamp: self.submission_end_timestamp,
            finalization_timestamp: self.finalization_timestamp,
            report_count: self.reports.len(),
            pending_slashes: self.pending_slashes(),
            finalized: self.is_finalized(),
            status: self.status(),
        }
    }

    /// Drop slash entries no query can read any more.
    ///
    /// Keeps the entry at `last_updated_nonce - 1`, which the synchronized
    /// window query reads. Returns the number of entries removed.
    pub fn compact_slash_log(&mut self) -> usize {
        let keep_from = self.last_updated_nonce().saturating_sub(1);
        let removed = self.slash_log.prune_before(keep_from);
        if removed > 0 {
            debug!(bucket_id = %self.id, removed, keep_from, "[bucket] Slash log compacted");
        }
        removed
    }

    /// Take and clear queued events. Always empty unless the bucket was
    /// built [`with_event_queue`](Bucket::with_event_queue).
    pub fn take_events(&mut self) -> Vec<BucketEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Bucket identifier.
    pub fn id(&self) -> BucketId {
        self.id
    }

    /// Window geometry.
    pub fn config(&self) -> &BucketConfig {
        &self.config
    }

    /// Nonce at creation.
    pub fn bucket_origin_nonce(&self) -> Nonce {
        self.bucket_origin_nonce
    }

    /// Nonce the next slash will consume.
    pub fn global_nonce(&self) -> Nonce {
        self.slash_log.next_nonce()
    }

    /// Epoch the report store is synchronized to.
    pub fn last_updated_nonce(&self) -> Nonce {
        self.reports.epoch()
    }

    /// Slashes not yet folded into the report epoch.
    pub fn pending_slashes(&self) -> u64 {
        self.global_nonce() - self.last_updated_nonce()
    }

    /// Bucket clock.
    pub fn current_timestamp(&self) -> Timestamp {
        self.current_timestamp
    }

    /// Replay anchor for the window start.
    pub fn submission_start_timestamp(&self) -> Timestamp {
        self.submission_start_timestamp
    }

    /// Last possible submission timestamp as of the last recomputation.
    pub fn submission_end_timestamp(&self) -> Timestamp {
        self.submission_end_timestamp
    }

    /// Finalization deadline as of the last recomputation.
    pub fn finalization_timestamp(&self) -> Timestamp {
        self.finalization_timestamp
    }

    /// Reports held for the current epoch, in submission order.
    pub fn reports(&self) -> &[R] {
        self.reports.reports()
    }

    /// Slash log.
    pub fn slash_log(&self) -> &SlashLog {
        &self.slash_log
    }

    /// Timestamp of the slash that consumed `nonce`.
    pub fn slash_timestamp(&self, nonce: Nonce) -> Option<Timestamp> {
        self.slash_log.get(nonce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WEEK_SECS;

    const W: u64 = WEEK_SECS;

    fn bucket() -> Bucket<u64> {
        Bucket::new(BucketId::new(0), 0)
    }

    #[test]
    fn test_new_bucket_defaults() {
        let b = bucket();
        assert_eq!(b.global_nonce(), 0);
        assert_eq!(b.last_updated_nonce(), 0);
        assert_eq!(b.current_timestamp(), 0);
        assert_eq!(b.submission_start_timestamp(), 0);
        assert_eq!(b.submission_end_timestamp(), W);
        assert_eq!(b.finalization_timestamp(), 2 * W);
        assert!(b.reports().is_empty());
        assert_eq!(b.status(), BucketStatus::Open);
    }

    #[test]
    fn test_with_config_rejects_invalid_geometry() {
        let config = BucketConfig {
            week_secs: 0,
            ..Default::default()
        };
        let result = Bucket::<u64>::with_config(BucketId::new(1), 0, config);
        assert!(matches!(result, Err(BucketError::InvalidConfig(_))));
    }

    #[test]
    fn test_warp_forward_accumulates() {
        let mut b = bucket();
        assert_eq!(b.warp_forward(10).unwrap(), 10);
        assert_eq!(b.warp_forward(0).unwrap(), 10);
        assert_eq!(b.warp_forward(5).unwrap(), 15);
    }

    #[test]
    fn test_warp_forward_rejects_negative() {
        let mut b = bucket();
        b.warp_forward(100).unwrap();
        let result = b.warp_forward(-1);
        assert_eq!(result, Err(BucketError::NegativeTimeAdvance { delta: -1 }));
        assert_eq!(b.current_timestamp(), 100);
    }

    #[test]
    fn test_warp_forward_rejects_overflow() {
        let mut b = bucket();
        b.warp_forward(i64::MAX).unwrap();
        b.warp_forward(i64::MAX).unwrap();
        let before = b.current_timestamp();
        assert!(matches!(
            b.warp_forward(i64::MAX),
            Err(BucketError::TimestampOverflow { .. })
        ));
        assert_eq!(b.current_timestamp(), before);
    }

    #[test]
    fn test_slash_records_current_timestamp() {
        let mut b = bucket();
        b.warp_forward(123).unwrap();
        assert_eq!(b.execute_slash_event(), 0);
        b.warp_forward(1).unwrap();
        assert_eq!(b.execute_slash_event(), 1);

        assert_eq!(b.global_nonce(), 2);
        assert_eq!(b.slash_timestamp(0), Some(123));
        assert_eq!(b.slash_timestamp(1), Some(124));
        // Window fields are untouched until recomputation.
        assert_eq!(b.submission_end_timestamp(), W);
        assert_eq!(b.finalization_timestamp(), 2 * W);
    }

    #[test]
    fn test_slash_nonces_start_at_origin() {
        let mut b: Bucket<u64> = Bucket::new(BucketId::new(9), 40);
        assert_eq!(b.execute_slash_event(), 40);
        assert_eq!(b.global_nonce(), 41);
        assert_eq!(b.last_updated_nonce(), 40);
    }

    #[test]
    fn test_calculate_without_slash_returns_end() {
        let mut b = bucket();
        assert_eq!(b.calculate_submission_start(), W);
        assert!(b.take_events().is_empty());
    }

    #[test]
    fn test_calculate_synchronized_uses_latest_slash() {
        let mut b = bucket();
        b.warp_forward(W as i64).unwrap();
        b.execute_slash_event();
        b.push_report(1).unwrap();
        assert_eq!(b.last_updated_nonce(), b.global_nonce());

        // Synchronized: window restarts after the most recent slash.
        assert_eq!(b.calculate_submission_start(), 3 * W);
        // A second report in the same epoch is accepted.
        assert_eq!(b.push_report(2).unwrap(), 2);
    }

    #[test]
    fn test_push_report_rejected_after_window() {
        let mut b = bucket();
        b.warp_forward(W as i64 + 1).unwrap();
        let result = b.push_report(7);
        assert_eq!(
            result,
            Err(BucketError::SubmissionWindowViolation {
                current_timestamp: W + 1,
                window_start: W,
            })
        );
        assert!(b.reports().is_empty());
    }

    #[test]
    fn test_push_report_at_boundary_accepted() {
        let mut b = bucket();
        b.warp_forward(W as i64).unwrap();
        assert_eq!(b.push_report(7).unwrap(), 1);
    }

    #[test]
    fn test_stale_store_cleared_on_push() {
        let mut b = bucket();
        b.push_report(1).unwrap();
        b.push_report(2).unwrap();
        b.execute_slash_event();
        b.execute_slash_event();

        assert_eq!(b.push_report(3).unwrap(), 1);
        assert_eq!(b.reports(), &[3]);
        assert_eq!(b.last_updated_nonce(), 2);
    }

    #[test]
    fn test_rejected_push_keeps_stale_store() {
        let mut b = bucket();
        b.push_report(1).unwrap();
        b.warp_forward(2 * W as i64).unwrap();
        b.execute_slash_event();

        assert!(b.push_report(2).is_err());
        assert_eq!(b.reports(), &[1]);
        assert_eq!(b.last_updated_nonce(), 0);
    }

    #[test]
    fn test_pending_slash_at_deadline_allows_finalization() {
        let mut b = bucket();
        b.warp_forward(2 * W as i64).unwrap();
        b.execute_slash_event();
        assert!(b.is_finalized());
        assert_eq!(b.status(), BucketStatus::Finalized);
    }

    #[test]
    fn test_pending_early_slash_blocks_finalization() {
        let mut b = bucket();
        b.warp_forward(W as i64).unwrap();
        b.execute_slash_event();
        b.warp_forward(10 * W as i64).unwrap();
        assert!(!b.is_finalized());
        assert_eq!(b.status(), BucketStatus::PendingFinalization);
    }

    #[test]
    fn test_status_transitions() {
        let mut b = bucket();
        assert_eq!(b.status(), BucketStatus::Open);
        b.warp_forward(W as i64 + 1).unwrap();
        assert_eq!(b.status(), BucketStatus::PendingFinalization);
        b.warp_forward(W as i64).unwrap();
        assert_eq!(b.status(), BucketStatus::Finalized);
    }

    #[test]
    fn test_events_are_queued_in_order() {
        let mut b = bucket().with_event_queue();
        b.push_report(1).unwrap();
        b.warp_forward(W as i64).unwrap();
        b.execute_slash_event();
        b.push_report(2).unwrap();

        let kinds: Vec<_> = b.take_events().iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                "report_accepted",
                "slash_recorded",
                "window_recomputed",
                "reports_invalidated",
                "report_accepted",
            ]
        );
        assert!(b.take_events().is_empty());
    }

    #[test]
    fn test_standalone_bucket_queues_nothing() {
        let mut b = bucket();
        assert!(!b.queues_events());
        b.warp_forward(10).unwrap();
        b.execute_slash_event();
        for _ in 0..100_000 {
            b.calculate_submission_start();
        }
        b.push_report(1).unwrap();
        assert!(b.pending_events.is_empty());
        assert_eq!(b.pending_events.capacity(), 0);
    }

    #[test]
    fn test_polled_queue_does_not_grow() {
        let mut b = bucket().with_event_queue();
        b.warp_forward(10).unwrap();
        b.execute_slash_event();
        for _ in 0..1_000 {
            b.calculate_submission_start();
            assert_eq!(b.take_events().len(), 1);
        }
        assert!(b.pending_events.is_empty());
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut b = bucket();
        b.push_report(1).unwrap();
        b.warp_forward(100).unwrap();
        b.execute_slash_event();

        let snap = b.snapshot();
        assert_eq!(snap.id, BucketId::new(0));
        assert_eq!(snap.global_nonce, 1);
        assert_eq!(snap.last_updated_nonce, 0);
        assert_eq!(snap.current_timestamp, 100);
        assert_eq!(snap.report_count, 1);
        assert_eq!(snap.pending_slashes, 1);
        assert!(!snap.finalized);
        assert_eq!(snap.status, BucketStatus::Open);
    }

    #[test]
    fn test_compaction_preserves_queries() {
        let mut b = bucket();
        for _ in 0..4 {
            b.warp_forward(10).unwrap();
            b.execute_slash_event();
        }
        b.push_report(1).unwrap();
        let window = b.calculate_submission_start();
        let finalized = b.is_finalized();

        assert_eq!(b.compact_slash_log(), 3);
        assert_eq!(b.slash_log().first_nonce(), 3);
        assert_eq!(b.calculate_submission_start(), window);
        assert_eq!(b.is_finalized(), finalized);
    }

    #[test]
    fn test_compaction_noop_before_any_sync() {
        let mut b = bucket();
        b.execute_slash_event();
        b.execute_slash_event();
        assert_eq!(b.compact_slash_log(), 0);
        assert_eq!(b.slash_log().len(), 2);
    }
}
