//! Outcome accounting for a backfill run.

use std::fmt;
use std::time::Duration;

/// One document that could not be embedded
#[derive(Debug, Clone, PartialEq)]
pub struct BackfillFailure {
    /// Printable document key (`_id`)
    pub key: String,
    pub title: String,
    pub reason: String,
}

/// What a backfill run did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackfillReport {
    /// Documents selected for embedding
    pub pending: usize,
    /// Documents attempted, successful or not
    pub processed: usize,
    /// Documents that now carry an embedding
    pub embedded: usize,
    pub failures: Vec<BackfillFailure>,
    /// Set when fail-fast stopped the run before all pending documents
    pub stopped_early: bool,
    pub elapsed: Duration,
}

impl BackfillReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Documents selected but never attempted
    pub fn skipped(&self) -> usize {
        self.pending.saturating_sub(self.processed)
    }
}

impl fmt::Display for BackfillReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} pending documents embedded, {} failed",
            self.embedded, self.pending, self.failed()
        )?;
        if self.stopped_early {
            write!(f, ", {} skipped after first failure", self.skipped())?;
        }
        write!(f, " ({:.1?})", self.elapsed)
    }
}
