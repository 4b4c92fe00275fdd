//! # Configuration for the Event Hubs Telemetry Simulator
//!
//! This module handles configuration loading and validation,
//! supporting both environment variables and serialized configuration.

use crate::constants::*;
use crate::error::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

// =============================================================================
// PUBLISHER CONFIGURATION
// =============================================================================

/// Configuration for the telemetry publisher
#[derive(Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Event Hub that receives the events
    pub event_hub_name: String,

    /// Interval between two simulated readings in seconds
    pub send_interval_secs: u64,

    /// Bound on a single publish request in seconds
    pub request_timeout_secs: u64,

    /// Lifetime of each SAS token in seconds
    pub token_ttl_secs: u64,

    /// Maximum bytes of response body kept in a failure detail
    pub max_detail_bytes: usize,

    /// Raw connection string (should come from env var in production)
    #[serde(skip_serializing)]
    pub connection_string: Option<String>,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            event_hub_name: DEFAULT_EVENT_HUB_NAME.into(),
            send_interval_secs: DEFAULT_SEND_INTERVAL_SECS,
            request_timeout_secs: PUBLISH_TIMEOUT_SECS,
            token_ttl_secs: SAS_TOKEN_TTL_SECS,
            max_detail_bytes: MAX_DETAIL_BYTES,
            connection_string: None,
        }
    }
}

impl std::fmt::Debug for PublisherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublisherConfig")
            .field("event_hub_name", &self.event_hub_name)
            .field("send_interval_secs", &self.send_interval_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("max_detail_bytes", &self.max_detail_bytes)
            .field(
                "connection_string",
                &self.connection_string.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl PublisherConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ClientResult<Self> {
        let mut config = Self::default();

        // Connection string (optional here, required at client construction)
        if let Ok(conn_str) = env::var(ENV_EVENTHUB_CONNECTION_STRING) {
            if !conn_str.trim().is_empty() {
                config.connection_string = Some(conn_str);
            }
        }

        if let Ok(name) = env::var(ENV_EVENTHUB_NAME) {
            config.event_hub_name = name;
        }

        if let Ok(interval) = env::var(ENV_SEND_INTERVAL_SECS) {
            config.send_interval_secs = interval.trim().parse().map_err(|_| {
                ClientError::ConfigurationError(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_SEND_INTERVAL_SECS, interval
                ))
            })?;
        }

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ClientResult<()> {
        validate_event_hub_name(&self.event_hub_name)?;
        if self.send_interval_secs == 0 {
            return Err(ClientError::ConfigurationError(
                "send interval must be at least one second".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ClientError::ConfigurationError(
                "request timeout must be at least one second".into(),
            ));
        }
        if self.token_ttl_secs == 0 {
            return Err(ClientError::ConfigurationError(
                "token lifetime must be at least one second".into(),
            ));
        }
        Ok(())
    }

    /// Get the raw connection string
    pub fn connection_string(&self) -> ClientResult<&str> {
        self.connection_string
            .as_deref()
            .ok_or_else(|| ClientError::MissingEnvVar(ENV_EVENTHUB_CONNECTION_STRING.into()))
    }

    /// Send interval as a `Duration`
    pub fn send_interval(&self) -> Duration {
        Duration::from_secs(self.send_interval_secs)
    }

    /// Request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Check that `name` can stand as a single path segment
///
/// The hub name appears percent-encoded inside the signed resource and
/// raw in the request path, so it must not contain anything a URL parser
/// would treat as structure or decode: `/`, `?`, `#`, `%`, whitespace or
/// control characters.
pub fn validate_event_hub_name(name: &str) -> ClientResult<()> {
    if name.trim().is_empty() {
        return Err(ClientError::ConfigurationError(
            "event hub name must not be empty".into(),
        ));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| matches!(c, '/' | '?' | '#' | '%') || c.is_whitespace() || c.is_control())
    {
        return Err(ClientError::ConfigurationError(format!(
            "event hub name {:?} must not contain {:?}",
            name, bad
        )));
    }
    if name == "." || name == ".." {
        return Err(ClientError::ConfigurationError(format!(
            "event hub name {:?} is not a valid path segment",
            name
        )));
    }
    Ok(())
}
