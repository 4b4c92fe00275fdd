//! # Publish Transport
//!
//! The single network seam of the client. [`HttpTransport`] sends the
//! request with reqwest over rustls; tests substitute their own
//! [`Transport`] to script responses and failures.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use thiserror::Error;
use tracing::debug;

use shared::error::{ClientError, ClientResult};

/// One fully-prepared single-event POST
#[derive(Clone)]
pub struct PublishRequest {
    /// `https://<namespace-host>/<event hub>/messages`
    pub url: String,

    /// SAS token value for the `Authorization` header
    pub authorization: String,

    /// Value for the `Content-Type` header
    pub content_type: &'static str,

    /// Event body, forwarded untouched
    pub body: Vec<u8>,

    /// Bound on the whole exchange
    pub timeout: Duration,
}

impl fmt::Debug for PublishRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishRequest")
            .field("url", &self.url)
            .field("authorization", &"<redacted>")
            .field("content_type", &self.content_type)
            .field("body_len", &self.body.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// What came back from the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// No HTTP response was received
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The exchange did not finish within the request bound
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// DNS, TCP or TLS setup failed
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Any other failure while sending or receiving
    #[error("Request failed: {0}")]
    Request(String),
}

/// Sends a prepared publish request
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, request: PublishRequest) -> Result<TransportResponse, TransportError>;
}

// =============================================================================
// REQWEST TRANSPORT
// =============================================================================

/// Production transport backed by a reqwest client
///
/// The client has no cookie store, so nothing observable carries over
/// between publishes beyond pooled connections.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: reqwest::Client,

    /// Response body bytes kept; the rest is left unread
    max_body_bytes: usize,
}

impl HttpTransport {
    /// Build an HTTPS-only transport
    ///
    /// At most `max_body_bytes` of each response body are read, plus one
    /// byte so that truncation stays detectable downstream.
    pub fn new(connect_timeout: Duration, max_body_bytes: usize) -> ClientResult<Self> {
        Self::build(connect_timeout, max_body_bytes, true)
    }

    /// Same as [`HttpTransport::new`] but also accepts plain `http://` URLs
    #[cfg(test)]
    pub(crate) fn allowing_plain_http(connect_timeout: Duration, max_body_bytes: usize) -> ClientResult<Self> {
        Self::build(connect_timeout, max_body_bytes, false)
    }

    fn build(connect_timeout: Duration, max_body_bytes: usize, https_only: bool) -> ClientResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("device-client/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .https_only(https_only)
            .build()
            .map_err(|e| ClientError::HttpClientError(e.to_string()))?;

        Ok(Self {
            http_client,
            max_body_bytes,
        })
    }

    /// Read the body chunk by chunk, stopping past `max_body_bytes`
    ///
    /// A read error ends the body; its description is appended so the
    /// failure detail still says what happened.
    async fn read_body(&self, mut response: reqwest::Response) -> String {
        let limit = self.max_body_bytes.saturating_add(1);
        let mut body = Vec::new();
        let mut read_error = None;

        while body.len() < limit {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let take = chunk.len().min(limit - body.len());
                    body.extend_from_slice(&chunk[..take]);
                }
                Ok(None) => break,
                Err(e) => {
                    read_error = Some(e);
                    break;
                }
            }
        }

        let mut text = String::from_utf8_lossy(&body).into_owned();
        if let Some(e) = read_error {
            debug!(error = %e, "Failed to read response body");
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&format!("[failed to read response body: {}]", e));
        }
        text
    }

    fn classify(err: reqwest::Error, timeout: Duration) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(timeout)
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: PublishRequest) -> Result<TransportResponse, TransportError> {
        let timeout = request.timeout;

        debug!(url = %request.url, bytes = request.body.len(), "Sending event");

        let response = self
            .http_client
            .post(&request.url)
            .header(AUTHORIZATION, request.authorization)
            .header(CONTENT_TYPE, request.content_type)
            .body(request.body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Self::classify(e, timeout))?;

        let status = response.status().as_u16();
        let body = self.read_body(response).await;

        Ok(TransportResponse { status, body })
    }
}
