//! # Window Replay
//!
//! Folds pending slash events into the submission window.
//!
//! Slashes are replayed in nonce order. A slash inside the window currently
//! in force, `[window_start, finalization)`, restarts the window at its
//! week-ceiling and pushes finalization to at least one period after that.
//! The first slash outside the window stops the replay; it and every later
//! nonce are left for a future pass.

use crate::domain::{week_ceiling_with_period, Nonce, Timestamp};

/// Result of one replay pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayOutcome {
    /// Window start after the pass.
    pub window_start: Timestamp,
    /// Finalization deadline after the pass.
    pub finalization_timestamp: Timestamp,
    /// Slash entries folded into the window.
    pub applied: u64,
    /// First nonce left unresolved, if the pass stopped early.
    pub deferred_from: Option<Nonce>,
}

/// Half-open interval test `bottom <= value < top`.
pub fn within_window(bottom: Timestamp, value: Timestamp, top: Timestamp) -> bool {
    bottom <= value && value < top
}

/// Replay `slashes` (nonce order) against a starting window.
pub fn replay_slash_window<I>(
    slashes: I,
    window_start: Timestamp,
    finalization_timestamp: Timestamp,
    period: u64,
) -> ReplayOutcome
where
    I: IntoIterator<Item = (Nonce, Timestamp)>,
{
    let mut outcome = ReplayOutcome {
        window_start,
        finalization_timestamp,
        applied: 0,
        deferred_from: None,
    };

    for (nonce, slash_ts) in slashes {
        if !within_window(outcome.window_start, slash_ts, outcome.finalization_timestamp) {
            outcome.deferred_from = Some(nonce);
            break;
        }
        outcome.window_start = week_ceiling_with_period(slash_ts, period);
        outcome.finalization_timestamp = outcome
            .window_start
            .saturating_add(period)
            .max(outcome.finalization_timestamp);
        outcome.applied += 1;
    }

    outcome
}
