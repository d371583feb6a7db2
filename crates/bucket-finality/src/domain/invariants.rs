//! # Domain Invariants
//!
//! Rules that must hold for every bucket between operations. The bucket
//! upholds them structurally; these checks exist for tests and for callers
//! that want to assert state after replaying an external event stream.

use super::bucket::Bucket;
use super::errors::{BucketError, BucketResult};
use super::value_objects::{Nonce, Timestamp};

/// Invariant: the report epoch never runs ahead of the global nonce.
pub fn invariant_nonce_order(
    bucket_origin_nonce: Nonce,
    last_updated_nonce: Nonce,
    global_nonce: Nonce,
) -> BucketResult<()> {
    if last_updated_nonce < bucket_origin_nonce {
        return Err(BucketError::InvariantViolation(format!(
            "last_updated_nonce {} is below origin nonce {}",
            last_updated_nonce, bucket_origin_nonce
        )));
    }
    if last_updated_nonce > global_nonce {
        return Err(BucketError::InvariantViolation(format!(
            "last_updated_nonce {} exceeds global nonce {}",
            last_updated_nonce, global_nonce
        )));
    }
    Ok(())
}

/// Invariant: the finalization deadline is never before the window end.
pub fn invariant_deadline_after_window(
    submission_end: Timestamp,
    finalization: Timestamp,
) -> BucketResult<()> {
    if finalization < submission_end {
        return Err(BucketError::InvariantViolation(format!(
            "finalization {} precedes submission end {}",
            finalization, submission_end
        )));
    }
    Ok(())
}

/// Invariant: after a replay that applied a slash, the deadline is at least
/// one period past the new window start.
pub fn invariant_deadline_covers_window(
    window_start: Timestamp,
    finalization: Timestamp,
    period: u64,
) -> BucketResult<()> {
    let required = window_start.saturating_add(period);
    if finalization < required {
        return Err(BucketError::InvariantViolation(format!(
            "finalization {} is less than one period ({}) after window start {}",
            finalization, period, window_start
        )));
    }
    Ok(())
}

/// Invariant: the clock never moves backwards.
pub fn invariant_clock_monotonic(previous: Timestamp, current: Timestamp) -> BucketResult<()> {
    if current < previous {
        return Err(BucketError::InvariantViolation(format!(
            "clock moved backwards: {} -> {}",
            previous, current
        )));
    }
    Ok(())
}

/// Invariant: the slash log covers a dense nonce range ending at
/// `global_nonce - 1`, starting no earlier than the origin nonce.
pub fn invariant_slash_log_dense<R>(bucket: &Bucket<R>) -> BucketResult<()> {
    let log = bucket.slash_log();
    if log.first_nonce() < bucket.bucket_origin_nonce() {
        return Err(BucketError::InvariantViolation(format!(
            "slash log starts at {} before origin nonce {}",
            log.first_nonce(),
            bucket.bucket_origin_nonce()
        )));
    }
    let expected = bucket.global_nonce() - log.first_nonce();
    if log.len() as u64 != expected {
        return Err(BucketError::InvariantViolation(format!(
            "slash log holds {} entries, expected {}",
            log.len(),
            expected
        )));
    }
    Ok(())
}

/// Invariant: recorded slash timestamps are non-decreasing by nonce and
/// never ahead of the clock.
pub fn invariant_slash_log_ordered<R>(bucket: &Bucket<R>) -> BucketResult<()> {
    let log = bucket.slash_log();
    let mut previous = 0;
    for (nonce, ts) in log.range(log.first_nonce(), bucket.global_nonce()) {
        if ts < previous || ts > bucket.current_timestamp() {
            return Err(BucketError::InvariantViolation(format!(
                "slash {} at {} out of order",
                nonce, ts
            )));
        }
        previous = ts;
    }
    Ok(())
}

/// Run every structural invariant against a bucket.
pub fn check_bucket_invariants<R>(bucket: &Bucket<R>) -> BucketResult<()> {
    invariant_nonce_order(
        bucket.bucket_origin_nonce(),
        bucket.last_updated_nonce(),
        bucket.global_nonce(),
    )?;
    invariant_deadline_after_window(
        bucket.submission_end_timestamp(),
        bucket.finalization_timestamp(),
    )?;
    invariant_slash_log_dense(bucket)?;
    invariant_slash_log_ordered(bucket)?;
    Ok(())
}
