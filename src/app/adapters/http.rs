//! HTTP transport for update requests
//!
//! The worker only sees the [`UploadTransport`] trait, so tests can swap in a
//! scripted transport. [`ReqwestTransport`] is the real one.

use crate::app::services::request_formatter::UploadRequest;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Status and body of an endpoint response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one update request and reports what came back
///
/// Any response, whatever its status, is `Ok`. Only failures to obtain a
/// response at all (connection, DNS, TLS, timeout, body read) are errors.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    async fn send(&self, request: &UploadRequest) -> Result<TransportResponse>;
}

/// reqwest-backed transport with a per-request timeout
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Build the HTTP client
    ///
    /// # Arguments
    ///
    /// * `timeout` - Upper bound for one request, connect through body read
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(crate::constants::USER_AGENT)
            .build()
            .map_err(|e| Error::configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl UploadTransport for ReqwestTransport {
    async fn send(&self, request: &UploadRequest) -> Result<TransportResponse> {
        debug!("Sending {}", request);

        let mut builder = self.client.get(request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        let response = builder.send().await.map_err(|e| self.map_error(e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.map_error(e))?;

        Ok(TransportResponse { status, body })
    }
}

impl ReqwestTransport {
    fn map_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::timeout(self.timeout.as_secs())
        } else if error.is_connect() {
            Error::transport(format!("Connection failed: {error}"))
        } else {
            Error::from(error)
        }
    }
}
