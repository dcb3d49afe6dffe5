//! Upload events and their logging
//!
//! The worker reports everything it decides through an [`UploadObserver`].
//! [`TracingObserver`] is the default and turns events into log lines,
//! honouring the `log_success` / `log_failure` switches.

use crate::app::services::request_formatter::format_timestamp;
use tracing::{debug, error, info, warn};

/// Something the worker did with a record
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    /// Record published
    Posted { date_time: i64, attempts: u32 },
    /// Record dropped after every attempt failed
    Failed { date_time: i64, error: String },
    /// One attempt failed; more may follow
    AttemptFailed {
        date_time: i64,
        attempt: u32,
        error: String,
    },
    /// Too close to the previously posted record
    SkippedInterval { date_time: i64, last_post: i64 },
    /// Older than the staleness limit
    SkippedStale { date_time: i64, age_secs: i64 },
    /// Formatted but not sent because uploads are disabled
    SkippedUpload { date_time: i64 },
    /// Oldest queued records dropped to respect the backlog limit
    BacklogDiscarded { count: usize },
    /// Supplemental source failed; the record went out unaugmented
    AugmentFailed { date_time: i64, error: String },
}

/// Receives upload events from the worker task
pub trait UploadObserver: Send + Sync {
    fn on_event(&self, protocol: &str, event: &UploadEvent);
}

/// Logs upload events through `tracing`
#[derive(Debug, Clone, Copy)]
pub struct TracingObserver {
    log_success: bool,
    log_failure: bool,
}

impl TracingObserver {
    pub fn new(log_success: bool, log_failure: bool) -> Self {
        Self {
            log_success,
            log_failure,
        }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new(true, true)
    }
}

fn stamp(date_time: i64) -> String {
    format_timestamp(date_time).unwrap_or_else(|_| date_time.to_string())
}

impl UploadObserver for TracingObserver {
    fn on_event(&self, protocol: &str, event: &UploadEvent) {
        match event {
            UploadEvent::Posted { date_time, .. } => {
                if self.log_success {
                    info!("{}: Published record {}", protocol, stamp(*date_time));
                }
            }
            UploadEvent::Failed { date_time, error } => {
                if self.log_failure {
                    error!(
                        "{}: Failed to publish record {}: {}",
                        protocol,
                        stamp(*date_time),
                        error
                    );
                }
            }
            UploadEvent::AttemptFailed {
                date_time,
                attempt,
                error,
            } => debug!(
                "{}: Attempt {} for record {} failed: {}",
                protocol,
                attempt,
                stamp(*date_time),
                error
            ),
            UploadEvent::SkippedInterval {
                date_time,
                last_post,
            } => debug!(
                "{}: Wait interval ({}s since last post) not passed for record {}",
                protocol,
                date_time.saturating_sub(*last_post),
                stamp(*date_time)
            ),
            UploadEvent::SkippedStale {
                date_time,
                age_secs,
            } => info!(
                "{}: Record {} is stale ({}s old)",
                protocol,
                stamp(*date_time),
                age_secs
            ),
            UploadEvent::SkippedUpload { date_time } => {
                info!("{}: skipping upload of record {}", protocol, stamp(*date_time))
            }
            UploadEvent::BacklogDiscarded { count } => {
                warn!("{}: Backlog too large, discarded {} oldest record(s)", protocol, count)
            }
            UploadEvent::AugmentFailed { date_time, error } => debug!(
                "{}: Could not augment record {}: {}",
                protocol,
                stamp(*date_time),
                error
            ),
        }
    }
}
