//! Property-based tests for the bucket state machine.
//!
//! Properties:
//! - P1: the finalization deadline never decreases
//! - P2: recomputing twice with no state change is a no-op
//! - P3: the first report accepted after a slash sees an empty store
//! - P4: a synchronized bucket is never finalized before its deadline
//! - P5: negative clock advances are rejected without mutation
//! - P6: slash-log compaction does not change any query result
//! - P7: a replay that applies a slash leaves the deadline at least one
//!   period past the new window start

use proptest::prelude::*;

use bucket_finality::domain::{check_bucket_invariants, invariant_deadline_covers_window};
use bucket_finality::{Bucket, BucketEvent, BucketId, WEEK_SECS};

// ============================================================================
// Test configuration constants
// ============================================================================

/// Number of proptest cases per property.
const BUCKET_PROPTEST_CASES: u32 = 128;

/// Maximum number of operations in a generated sequence.
const MAX_OPS: usize = 40;

/// Largest single clock advance (three days).
const MAX_WARP: i64 = 3 * 86_400;

// ============================================================================
// Operation model
// ============================================================================

#[derive(Clone, Debug)]
enum Op {
    Warp(i64),
    Slash,
    Push(u64),
    Recompute,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..=MAX_WARP).prop_map(Op::Warp),
        2 => Just(Op::Slash),
        2 => any::<u64>().prop_map(Op::Push),
        1 => Just(Op::Recompute),
    ]
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op_strategy(), 1..MAX_OPS)
}

/// Apply one op, ignoring submission-window rejections.
fn apply(bucket: &mut Bucket<u64>, op: &Op) -> Option<usize> {
    match op {
        Op::Warp(delta) => {
            bucket.warp_forward(*delta).unwrap();
            None
        }
        Op::Slash => {
            bucket.execute_slash_event();
            None
        }
        Op::Push(value) => bucket.push_report(*value).ok(),
        Op::Recompute => {
            bucket.calculate_submission_start();
            None
        }
    }
}

fn run(ops: &[Op]) -> Bucket<u64> {
    let mut bucket = Bucket::new(BucketId::new(0), 0);
    for op in ops {
        apply(&mut bucket, op);
    }
    bucket
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(BUCKET_PROPTEST_CASES))]

    #[test]
    fn prop_p1_deadline_never_decreases(ops in ops_strategy()) {
        let mut bucket = Bucket::new(BucketId::new(0), 0);
        let mut deadline = bucket.finalization_timestamp();

        for op in &ops {
            apply(&mut bucket, op);
            prop_assert!(
                bucket.finalization_timestamp() >= deadline,
                "deadline moved back from {} to {} after {:?}",
                deadline,
                bucket.finalization_timestamp(),
                op
            );
            deadline = bucket.finalization_timestamp();
            prop_assert!(check_bucket_invariants(&bucket).is_ok());
        }
    }

    #[test]
    fn prop_p2_recompute_is_idempotent(ops in ops_strategy()) {
        let mut bucket = run(&ops);

        let first = bucket.calculate_submission_start();
        let end = bucket.submission_end_timestamp();
        let deadline = bucket.finalization_timestamp();

        let second = bucket.calculate_submission_start();
        prop_assert_eq!(first, second);
        prop_assert_eq!(bucket.submission_end_timestamp(), end);
        prop_assert_eq!(bucket.finalization_timestamp(), deadline);
    }

    #[test]
    fn prop_p3_slash_clears_stale_reports(ops in ops_strategy()) {
        let mut bucket = Bucket::new(BucketId::new(0), 0);
        let mut slashed_since_accept = false;

        for op in &ops {
            if matches!(op, Op::Slash) {
                slashed_since_accept = true;
            }
            if let Some(count) = apply(&mut bucket, op) {
                if slashed_since_accept {
                    prop_assert_eq!(count, 1);
                    slashed_since_accept = false;
                }
                prop_assert_eq!(bucket.last_updated_nonce(), bucket.global_nonce());
            }
        }
    }

    #[test]
    fn prop_p4_no_premature_finalization(ops in ops_strategy()) {
        let mut bucket = Bucket::new(BucketId::new(0), 0);

        for op in &ops {
            apply(&mut bucket, op);
            let synchronized = bucket.last_updated_nonce() == bucket.global_nonce();
            if synchronized && bucket.current_timestamp() < bucket.finalization_timestamp() {
                prop_assert!(!bucket.is_finalized());
            }
            if bucket.current_timestamp() < bucket.finalization_timestamp() {
                prop_assert!(!bucket.is_finalized());
            }
        }
    }

    #[test]
    fn prop_p5_negative_warp_rejected(ops in ops_strategy(), delta in i64::MIN..0) {
        let mut bucket = run(&ops);
        let before = bucket.snapshot();

        prop_assert!(bucket.warp_forward(delta).is_err());
        prop_assert_eq!(bucket.snapshot(), before);
    }

    #[test]
    fn prop_p6_compaction_preserves_queries(ops in ops_strategy()) {
        let mut original = run(&ops);
        let mut compacted = original.clone();
        compacted.compact_slash_log();

        prop_assert_eq!(compacted.is_finalized(), original.is_finalized());
        prop_assert_eq!(compacted.status(), original.status());
        prop_assert_eq!(
            compacted.calculate_submission_start(),
            original.calculate_submission_start()
        );
        prop_assert_eq!(compacted.snapshot(), original.snapshot());
        prop_assert!(check_bucket_invariants(&compacted).is_ok());
    }

    #[test]
    fn prop_p7_applied_replay_extends_deadline(ops in ops_strategy()) {
        let mut bucket = Bucket::new(BucketId::new(0), 0).with_event_queue();

        for op in ops.iter().chain(std::iter::once(&Op::Recompute)) {
            apply(&mut bucket, op);
            for event in bucket.take_events() {
                if let BucketEvent::WindowRecomputed {
                    window_start,
                    finalization_timestamp,
                    applied,
                    ..
                } = event
                {
                    if applied == 0 {
                        continue;
                    }
                    prop_assert!(invariant_deadline_covers_window(
                        window_start,
                        finalization_timestamp,
                        WEEK_SECS
                    )
                    .is_ok());
                    prop_assert_eq!(bucket.submission_end_timestamp(), window_start);
                    prop_assert!(
                        bucket.finalization_timestamp()
                            >= bucket.submission_end_timestamp() + WEEK_SECS,
                        "deadline {} too close to window end {} after {:?}",
                        bucket.finalization_timestamp(),
                        bucket.submission_end_timestamp(),
                        op
                    );
                }
            }
        }
    }
}

#[test]
fn test_week_ceiling_is_week_aligned() {
    for ts in [0, 1, WEEK_SECS - 1, WEEK_SECS, 5 * WEEK_SECS + 17] {
        let ceiling = bucket_finality::week_ceiling_submission_start(ts);
        assert_eq!(ceiling % WEEK_SECS, 0);
        assert!(ceiling > ts);
        assert!(ceiling - ts > WEEK_SECS);
    }
}
