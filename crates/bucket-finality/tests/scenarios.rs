//! End-to-end bucket scenarios.
//!
//! Each scenario drives a single bucket through a scripted sequence of clock
//! advances, slashes and report submissions, checking the structural
//! invariants after every step.

use std::sync::Arc;

use bucket_finality::domain::check_bucket_invariants;
use bucket_finality::{
    Bucket, BucketApi, BucketConfig, BucketEvent, BucketId, BucketService, BucketStatus,
    RecordingObserver, ServiceConfig, WEEK_SECS,
};

const W: u64 = WEEK_SECS;

fn new_bucket() -> Bucket<u64> {
    Bucket::new(BucketId::new(0), 0)
}

fn checked(bucket: &Bucket<u64>) {
    check_bucket_invariants(bucket).unwrap();
}

// ============================================================================
// Scenario A: several slashes near the deadline
// ============================================================================

#[test]
fn scenario_multiple_slashes() {
    let mut bucket = new_bucket();

    bucket.warp_forward(2 * W as i64 - 10).unwrap();
    bucket.execute_slash_event();
    checked(&bucket);
    assert_eq!(bucket.calculate_submission_start(), 3 * W);
    assert!(!bucket.is_finalized());
    checked(&bucket);

    bucket.warp_forward(1).unwrap();
    bucket.execute_slash_event();
    assert_eq!(bucket.calculate_submission_start(), 3 * W);
    assert!(!bucket.is_finalized());
    checked(&bucket);

    bucket.warp_forward(50).unwrap();
    bucket.execute_slash_event();
    bucket.push_report(1).unwrap();
    checked(&bucket);

    bucket.warp_forward(4 * W as i64).unwrap();
    assert!(bucket.is_finalized());
    assert_eq!(bucket.status(), BucketStatus::Finalized);
    checked(&bucket);
}

#[test]
fn scenario_multiple_slashes_deadline_values() {
    let mut bucket = new_bucket();
    bucket.warp_forward(2 * W as i64 - 10).unwrap();
    bucket.execute_slash_event();
    bucket.calculate_submission_start();

    assert_eq!(bucket.submission_end_timestamp(), 3 * W);
    assert_eq!(bucket.finalization_timestamp(), 4 * W);
    // The replay anchor never moves.
    assert_eq!(bucket.submission_start_timestamp(), 0);
    assert_eq!(bucket.last_updated_nonce(), 0);
}

// ============================================================================
// Scenario B: no slashes
// ============================================================================

#[test]
fn scenario_no_slashes() {
    let mut bucket = new_bucket();

    bucket.warp_forward(W as i64).unwrap();
    assert!(!bucket.is_finalized());
    checked(&bucket);

    bucket.warp_forward(W as i64).unwrap();
    assert!(bucket.is_finalized());
    checked(&bucket);

    // A slash after the deadline does not reopen the bucket.
    bucket.execute_slash_event();
    assert!(bucket.is_finalized());
    checked(&bucket);
}

// ============================================================================
// Scenario C: resync across rounds
// ============================================================================

#[test]
fn scenario_resync_across_rounds() {
    let mut bucket = new_bucket();

    bucket.push_report(1).unwrap();
    assert_eq!(bucket.push_report(2).unwrap(), 2);
    checked(&bucket);

    bucket.warp_forward(W as i64).unwrap();
    bucket.execute_slash_event();
    assert_eq!(bucket.push_report(3).unwrap(), 1);
    assert_eq!(bucket.last_updated_nonce(), bucket.global_nonce());
    assert!(!bucket.is_finalized());
    checked(&bucket);

    for _ in 0..2 {
        bucket.warp_forward(100).unwrap();
        bucket.execute_slash_event();
        checked(&bucket);
    }
    assert_eq!(bucket.slash_timestamp(1), Some(W + 100));
    assert_eq!(bucket.slash_timestamp(2), Some(W + 200));
    assert_eq!(bucket.reports().len(), 1);
    assert_ne!(bucket.last_updated_nonce(), bucket.global_nonce());
    assert!(!bucket.is_finalized());

    bucket.push_report(4000).unwrap();
    assert_eq!(bucket.reports(), &[4000]);
    assert_eq!(bucket.last_updated_nonce(), bucket.global_nonce());
    assert_eq!(bucket.submission_end_timestamp(), 3 * W);
    assert_eq!(bucket.finalization_timestamp(), 4 * W);
    checked(&bucket);
}

// ============================================================================
// Non-zero origin nonce
// ============================================================================

#[test]
fn scenario_origin_nonce_offset() {
    let mut bucket: Bucket<u64> = Bucket::new(BucketId::new(7), 1_000);

    assert_eq!(bucket.calculate_submission_start(), W);
    bucket.warp_forward(10).unwrap();
    assert_eq!(bucket.execute_slash_event(), 1_000);
    assert_eq!(bucket.calculate_submission_start(), 2 * W);
    bucket.push_report(9).unwrap();
    assert_eq!(bucket.last_updated_nonce(), 1_001);
    checked(&bucket);
}

// ============================================================================
// Custom geometry
// ============================================================================

#[test]
fn scenario_short_period() {
    let mut bucket: Bucket<u64> =
        Bucket::with_config(BucketId::new(1), 0, BucketConfig::for_testing()).unwrap();

    bucket.warp_forward(150).unwrap();
    bucket.execute_slash_event();
    // floor(150 / 100) * 100 + 200
    assert_eq!(bucket.calculate_submission_start(), 300);
    assert_eq!(bucket.finalization_timestamp(), 400);
    bucket.push_report(1).unwrap();

    bucket.warp_forward(250).unwrap();
    assert!(bucket.is_finalized());
    checked(&bucket);
}

// ============================================================================
// Service-level scenario
// ============================================================================

#[test]
fn scenario_through_service() {
    let observer = Arc::new(RecordingObserver::new());
    let config = ServiceConfig {
        bucket: BucketConfig::default(),
        ..ServiceConfig::default()
    };
    let service: BucketService<u64, _> = BucketService::new(config, observer.clone()).unwrap();
    let id = BucketId::new(3);
    service.create_bucket(id, 0).unwrap();

    service.warp_forward(id, 2 * W as i64 - 10).unwrap();
    service.execute_slash_event(id).unwrap();
    assert_eq!(service.calculate_submission_start(id).unwrap(), 3 * W);
    service.push_report(id, 42).unwrap();
    service.warp_forward(id, 4 * W as i64).unwrap();
    assert!(service.is_finalized(id).unwrap());
    assert_eq!(service.status(id).unwrap(), BucketStatus::Finalized);

    let kinds: Vec<_> = observer.events().iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            "slash_recorded",
            "window_recomputed",
            "window_recomputed",
            "reports_invalidated",
            "report_accepted",
            "finalization_observed",
        ]
    );

    let last = observer.snapshots().last().cloned().unwrap();
    assert_eq!(last.id, id);
    assert!(last.finalized);
    assert_eq!(last.report_count, 1);

    match observer.events().last() {
        Some(BucketEvent::FinalizationObserved { timestamp, .. }) => {
            assert_eq!(*timestamp, 6 * W - 10)
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[test]
fn scenario_negative_warp_through_service() {
    let service: BucketService<u64, _> =
        BucketService::new(ServiceConfig::default(), Arc::new(RecordingObserver::new())).unwrap();
    let id = BucketId::new(1);
    service.create_bucket(id, 0).unwrap();
    service.warp_forward(id, 500).unwrap();

    assert!(service.warp_forward(id, -1).is_err());
    assert_eq!(service.snapshot(id).unwrap().current_timestamp, 500);
}
