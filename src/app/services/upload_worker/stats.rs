//! Upload worker statistics

use serde::{Deserialize, Serialize};
use std::fmt;

/// Counters collected by the worker over its lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSummary {
    /// Records taken off the queue, discarded ones included
    pub received: usize,
    /// Records published
    pub posted: usize,
    /// Records dropped after the last attempt failed
    pub failed: usize,
    /// Records skipped by the post interval
    pub skipped_interval: usize,
    /// Records skipped as stale
    pub skipped_stale: usize,
    /// Records formatted but not sent
    pub skipped_upload: usize,
    /// Records discarded to respect the backlog limit
    pub discarded_backlog: usize,
    /// Records sent without their supplemental values
    pub augment_failures: usize,
    /// HTTP attempts made, retries included
    pub attempts: usize,
}

impl WorkerSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that never reached the endpoint by choice
    pub fn skipped(&self) -> usize {
        self.skipped_interval + self.skipped_stale + self.skipped_upload + self.discarded_backlog
    }

    /// Posted records as a percentage of records that were sent
    pub fn success_rate(&self) -> f64 {
        let sent = self.posted + self.failed;
        if sent == 0 {
            100.0
        } else {
            (self.posted as f64 / sent as f64) * 100.0
        }
    }

    /// Whether every record is accounted for
    pub fn is_consistent(&self) -> bool {
        self.received == self.posted + self.failed + self.skipped()
    }
}

impl fmt::Display for WorkerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} received, {} posted, {} failed, {} skipped ({} interval, {} stale, {} not uploaded, {} backlog), {} attempts",
            self.received,
            self.posted,
            self.failed,
            self.skipped(),
            self.skipped_interval,
            self.skipped_stale,
            self.skipped_upload,
            self.discarded_backlog,
            self.attempts
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_accounting() {
        let summary = WorkerSummary {
            received: 10,
            posted: 4,
            failed: 1,
            skipped_interval: 2,
            skipped_stale: 1,
            skipped_upload: 0,
            discarded_backlog: 2,
            augment_failures: 0,
            attempts: 7,
        };

        assert_eq!(summary.skipped(), 5);
        assert!(summary.is_consistent());
        assert!((summary.success_rate() - 80.0).abs() < 1e-9);
        assert!(summary.to_string().starts_with("10 received, 4 posted, 1 failed"));
    }

    #[test]
    fn test_empty_summary() {
        let summary = WorkerSummary::new();
        assert_eq!(summary.success_rate(), 100.0);
        assert!(summary.is_consistent());
    }
}
