//! # Publish Client
//!
//! Sends one serialized event to an Event Hub and classifies the result.
//!
//! ## Request Flow
//!
//! ```text
//! descriptor + hub ──► resource URI ──► SAS token (fresh, 1h)
//!                                          │
//!   POST https://<host>/<hub>/messages ◄───┘  Authorization: <token>
//!                                             Content-Type: application/json; charset=utf-8
//!        │
//!        ├─ 201           → succeeded
//!        ├─ other status  → rejected, detail = response body
//!        ├─ no response   → transport failure, status 0
//!        └─ cancelled     → cancelled, status 0
//! ```
//!
//! Exactly one attempt is made per call. The client holds no per-call
//! state, so `publish` may run concurrently from many tasks.

pub mod observer;
pub mod transport;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use shared::{
    config::{validate_event_hub_name, PublisherConfig},
    constants::*,
    error::ClientResult,
    types::{PublishOutcome, TelemetryEvent},
};

use crate::connection::ConnectionDescriptor;
use crate::sas::SasTokenIssuer;

pub use observer::{NoopObserver, PublishObserver, TracingObserver};
pub use transport::{HttpTransport, PublishRequest, Transport, TransportError, TransportResponse};

/// Authenticated single-event publisher for one namespace
pub struct PublishClient {
    /// Parsed connection string, immutable for the client's lifetime
    descriptor: Arc<ConnectionDescriptor>,

    /// Network seam
    transport: Arc<dyn Transport>,

    /// Where lifecycle events are reported
    observer: Arc<dyn PublishObserver>,

    /// Token lifetime
    issuer: SasTokenIssuer,

    /// Bound on each request
    request_timeout: Duration,

    /// Maximum response body kept in a failure detail
    max_detail_bytes: usize,
}

impl PublishClient {
    /// Create a client that talks HTTPS through reqwest
    pub fn new(descriptor: ConnectionDescriptor, config: &PublisherConfig) -> ClientResult<Self> {
        let transport = HttpTransport::new(config.request_timeout(), config.max_detail_bytes)?;
        Self::with_transport(descriptor, Arc::new(transport), config)
    }

    /// Create a client from the connection string held in `config`
    pub fn from_config(config: &PublisherConfig) -> ClientResult<Self> {
        let descriptor = ConnectionDescriptor::parse(config.connection_string()?)?;
        Self::new(descriptor, config)
    }

    /// Create a client over an arbitrary transport
    pub fn with_transport(
        descriptor: ConnectionDescriptor,
        transport: Arc<dyn Transport>,
        config: &PublisherConfig,
    ) -> ClientResult<Self> {
        config.validate()?;

        Ok(Self {
            descriptor: Arc::new(descriptor),
            transport,
            observer: Arc::new(TracingObserver),
            issuer: SasTokenIssuer::new(config.token_ttl_secs)?,
            request_timeout: config.request_timeout(),
            max_detail_bytes: config.max_detail_bytes,
        })
    }

    /// Replace the observer
    pub fn with_observer(mut self, observer: Arc<dyn PublishObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    /// Publish `payload` to `event_hub_name`
    ///
    /// Only a hub name that is not a single path segment or a token that
    /// cannot be signed is returned as an error; every network result,
    /// good or bad, is a [`PublishOutcome`].
    pub async fn publish(&self, event_hub_name: &str, payload: &[u8]) -> ClientResult<PublishOutcome> {
        let request = self.prepare(event_hub_name, payload)?;

        let outcome = match tokio::time::timeout(self.request_timeout, self.transport.post(request)).await {
            Ok(Ok(response)) => self.classify(response),
            Ok(Err(err)) => PublishOutcome::transport_failure(&err.to_string(), self.max_detail_bytes),
            Err(_) => PublishOutcome::transport_failure(
                &TransportError::Timeout(self.request_timeout).to_string(),
                self.max_detail_bytes,
            ),
        };

        self.observer.on_outcome(event_hub_name, &outcome);
        Ok(outcome)
    }

    /// Publish, aborting the request as soon as `cancel` fires
    ///
    /// The in-flight request is dropped on cancellation, which releases
    /// its connection.
    pub async fn publish_cancellable(
        &self,
        event_hub_name: &str,
        payload: &[u8],
        cancel: &CancellationToken,
    ) -> ClientResult<PublishOutcome> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                let outcome = PublishOutcome::cancelled();
                self.observer.on_outcome(event_hub_name, &outcome);
                Ok(outcome)
            }
            result = self.publish(event_hub_name, payload) => result,
        }
    }

    /// Serialize `event` as JSON and publish it
    pub async fn publish_event(
        &self,
        event_hub_name: &str,
        event: &TelemetryEvent,
    ) -> ClientResult<PublishOutcome> {
        let body = event.to_json_bytes()?;
        self.publish(event_hub_name, &body).await
    }

    /// Sign a fresh token and build the request for one publish
    fn prepare(&self, event_hub_name: &str, payload: &[u8]) -> ClientResult<PublishRequest> {
        validate_event_hub_name(event_hub_name)?;

        let resource_uri = self.descriptor.resource_uri(event_hub_name);
        let token = self.issuer.issue_now(&self.descriptor, &resource_uri)?;

        self.observer
            .on_token_issued(&resource_uri, token.expires_at_epoch_secs());

        let url = self.descriptor.publish_url(event_hub_name);
        debug!(url = %url, "Prepared publish request");

        Ok(PublishRequest {
            url,
            authorization: token.into_value(),
            content_type: CONTENT_TYPE_JSON,
            body: payload.to_vec(),
            timeout: self.request_timeout,
        })
    }

    fn classify(&self, response: TransportResponse) -> PublishOutcome {
        if response.status == STATUS_CREATED {
            PublishOutcome::success()
        } else {
            PublishOutcome::rejected(response.status, &response.body, self.max_detail_bytes)
        }
    }
}
