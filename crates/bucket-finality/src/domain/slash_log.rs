//! # Slash Log
//!
//! Append-only record of slash events, keyed by the nonce each event
//! consumed. Nonces are dense, so the log is a `Vec` offset by the first
//! retained nonce.

use super::value_objects::{Nonce, Timestamp};

/// Nonce-keyed slash timestamps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashLog {
    /// Nonce of `timestamps[0]`.
    first_nonce: Nonce,
    /// Slash timestamps in nonce order.
    timestamps: Vec<Timestamp>,
}

impl SlashLog {
    /// Create an empty log whose first slash will consume `origin_nonce`.
    pub fn new(origin_nonce: Nonce) -> Self {
        Self {
            first_nonce: origin_nonce,
            timestamps: Vec::new(),
        }
    }

    /// Nonce the next slash will consume (the global nonce).
    pub fn next_nonce(&self) -> Nonce {
        self.first_nonce + self.timestamps.len() as u64
    }

    /// Lowest nonce still held.
    pub fn first_nonce(&self) -> Nonce {
        self.first_nonce
    }

    /// Record a slash at `timestamp`, returning the nonce it consumed.
    pub fn record(&mut self, timestamp: Timestamp) -> Nonce {
        let nonce = self.next_nonce();
        self.timestamps.push(timestamp);
        nonce
    }

    /// Timestamp of the slash that consumed `nonce`.
    pub fn get(&self, nonce: Nonce) -> Option<Timestamp> {
        let idx = nonce.checked_sub(self.first_nonce)?;
        self.timestamps.get(usize::try_from(idx).ok()?).copied()
    }

    /// Most recent slash.
    pub fn latest(&self) -> Option<(Nonce, Timestamp)> {
        let ts = *self.timestamps.last()?;
        Some((self.next_nonce() - 1, ts))
    }

    /// Entries with `from <= nonce < to`, in nonce order.
    pub fn range(&self, from: Nonce, to: Nonce) -> impl Iterator<Item = (Nonce, Timestamp)> + '_ {
        let start = from.max(self.first_nonce);
        let end = to.min(self.next_nonce());
        (start..end).filter_map(move |nonce| self.get(nonce).map(|ts| (nonce, ts)))
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// True if no entries are retained.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Drop every entry with a nonce below `nonce`.
    ///
    /// Returns the number of entries removed. `next_nonce` is unchanged.
    pub fn prune_before(&mut self, nonce: Nonce) -> usize {
        let cutoff = nonce.min(self.next_nonce());
        if cutoff <= self.first_nonce {
            return 0;
        }
        let removed = (cutoff - self.first_nonce) as usize;
        self.timestamps.drain(..removed);
        self.first_nonce = cutoff;
        removed
    }
}
