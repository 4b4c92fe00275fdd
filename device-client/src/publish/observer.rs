//! # Publish Observer
//!
//! Callbacks a [`PublishClient`](super::PublishClient) reports to. The
//! client never configures global logging itself; it tells its observer
//! and the observer decides what to do. [`TracingObserver`] forwards to
//! `tracing`.

use tracing::{debug, error, info, warn};

use shared::types::PublishOutcome;

/// Receives events from a publish client
///
/// Implementations must never be handed secrets: only resource URIs,
/// expiries and outcomes cross this boundary.
pub trait PublishObserver: Send + Sync {
    /// A token was derived for `resource_uri`
    fn on_token_issued(&self, _resource_uri: &str, _expires_at_epoch_secs: u64) {}

    /// A publish to `event_hub_name` finished
    fn on_outcome(&self, _event_hub_name: &str, _outcome: &PublishOutcome) {}
}

/// Logs every event through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PublishObserver for TracingObserver {
    fn on_token_issued(&self, resource_uri: &str, expires_at_epoch_secs: u64) {
        debug!(
            resource = %resource_uri,
            expires_at = expires_at_epoch_secs,
            "SAS token issued"
        );
    }

    fn on_outcome(&self, event_hub_name: &str, outcome: &PublishOutcome) {
        if outcome.succeeded {
            info!(event_hub = %event_hub_name, status = outcome.status_code, "✓ Message sent successfully");
        } else if outcome.cancelled {
            warn!(event_hub = %event_hub_name, "Publish cancelled");
        } else if outcome.is_rejection() {
            error!(
                event_hub = %event_hub_name,
                status = outcome.status_code,
                response = %outcome.detail,
                "✗ Failed to send message"
            );
        } else {
            error!(
                event_hub = %event_hub_name,
                error = %outcome.detail,
                "✗ Network error sending message"
            );
        }
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PublishObserver for NoopObserver {}
