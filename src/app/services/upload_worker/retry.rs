//! Bounded retry of update requests

use crate::app::adapters::http::{TransportResponse, UploadTransport};
use crate::app::services::request_formatter::UploadRequest;
use crate::config::WorkerConfig;
use crate::constants::FAILED_POST_BODY;
use crate::{Error, Result};
use std::time::Duration;

/// Attempt count, spacing and per-attempt bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_tries: u32,
    pub retry_wait: Duration,
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &WorkerConfig) -> Self {
        Self {
            max_tries: config.max_tries,
            retry_wait: config.retry_wait,
            timeout: config.timeout,
        }
    }
}

/// Check the body of a 2xx response
///
/// The update endpoint answers `0` when it refused the entry (bad key, rate
/// limit) and the new entry id otherwise.
pub fn check_response(body: &str) -> Result<()> {
    if body.trim_end() == FAILED_POST_BODY {
        return Err(Error::logical_failure(format!(
            "server returned '{FAILED_POST_BODY}'"
        )));
    }
    Ok(())
}

fn check_transport_response(response: &TransportResponse) -> Result<()> {
    if !response.is_success() {
        return Err(Error::http_status(response.status));
    }
    check_response(&response.body)
}

/// Send a request until it succeeds or the attempts run out
///
/// Every attempt is bounded by `policy.timeout`. Attempts are separated by
/// `policy.retry_wait`; there is no wait after the last one.
///
/// # Arguments
///
/// * `transport` - Transport to send with
/// * `request` - Formatted update request
/// * `policy` - Retry policy
/// * `on_failed_attempt` - Called with the attempt number and error of every failed attempt
///
/// # Returns
///
/// The number of attempts used, or `Error::RetriesExhausted`
pub async fn post_with_retries(
    transport: &dyn UploadTransport,
    request: &UploadRequest,
    policy: &RetryPolicy,
    mut on_failed_attempt: impl FnMut(u32, &Error),
) -> Result<u32> {
    for attempt in 1..=policy.max_tries {
        let outcome = match tokio::time::timeout(policy.timeout, transport.send(request)).await {
            Ok(Ok(response)) => check_transport_response(&response),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(Error::timeout(policy.timeout.as_secs())),
        };

        match outcome {
            Ok(()) => return Ok(attempt),
            Err(e) => on_failed_attempt(attempt, &e),
        }

        if attempt < policy.max_tries {
            tokio::time::sleep(policy.retry_wait).await;
        }
    }

    Err(Error::retries_exhausted(policy.max_tries))
}
