//! # Report Store
//!
//! Reports accumulated for a single nonce epoch. Moving to a newer epoch
//! discards everything held for the old one.

use super::value_objects::Nonce;

/// Epoch-versioned report buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportStore<R> {
    epoch: Nonce,
    reports: Vec<R>,
}

impl<R> ReportStore<R> {
    /// Create an empty store synchronized to `epoch`.
    pub fn new(epoch: Nonce) -> Self {
        Self {
            epoch,
            reports: Vec::new(),
        }
    }

    /// Epoch the held reports belong to.
    pub fn epoch(&self) -> Nonce {
        self.epoch
    }

    /// Clear all reports and move to `epoch`. Returns the discarded count.
    pub fn reset_to(&mut self, epoch: Nonce) -> usize {
        let discarded = self.reports.len();
        self.reports.clear();
        self.epoch = epoch;
        discarded
    }

    /// Append a report to the current epoch.
    pub fn push(&mut self, report: R) -> usize {
        self.reports.push(report);
        self.reports.len()
    }

    /// Reports in submission order.
    pub fn reports(&self) -> &[R] {
        &self.reports
    }

    /// Number of reports held.
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    /// True if no reports are held.
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}
