//! # Error Types for the Event Hubs Telemetry Simulator
//!
//! Configuration and signing problems are returned as typed errors so
//! callers can tell them apart from per-request publish failures, which
//! travel as a [`PublishOutcome`](crate::types::PublishOutcome) value.
//!
//! No error message produced here ever carries the shared access key.

use thiserror::Error;

// =============================================================================
// CONNECTION STRING ERRORS
// =============================================================================

/// Failure to turn a raw connection string into a descriptor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A required key is absent or its value is empty after trimming
    #[error("Connection string missing {0}")]
    MissingField(&'static str),
}

// =============================================================================
// SIGNING ERRORS
// =============================================================================

/// Failure to derive a SAS token
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    /// The keyed hash was handed an empty key
    #[error("Signing key is empty")]
    EmptyKey,

    /// The keyed hash rejected the key
    #[error("Signing key rejected: {0}")]
    InvalidKey(String),

    /// A zero lifetime would produce an already-expired token
    #[error("Token lifetime must be greater than zero")]
    InvalidTtl,

    /// `now + ttl` does not fit in the expiry field
    #[error("Token expiry overflows: now={now}, ttl={ttl_secs}")]
    ExpiryOverflow { now: u64, ttl_secs: u64 },
}

// =============================================================================
// CLIENT ERRORS
// =============================================================================

/// Main error type for client construction and configuration
#[derive(Error, Debug)]
pub enum ClientError {
    /// Connection string could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Token could not be signed
    #[error(transparent)]
    Signing(#[from] SigningError),

    /// The HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    HttpClientError(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Missing required environment variable
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Result type alias using ClientError
pub type ClientResult<T> = Result<T, ClientError>;

// =============================================================================
// ERROR CONVERSIONS
// =============================================================================

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::SerializationError(err.to_string())
    }
}

// =============================================================================
// ERROR CATEGORIES (for logging)
// =============================================================================

impl ClientError {
    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            ClientError::Parse(_) => "connection_string",
            ClientError::Signing(_) => "signing",
            ClientError::HttpClientError(_) => "transport",
            ClientError::ConfigurationError(_) | ClientError::MissingEnvVar(_) => "config",
            ClientError::SerializationError(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_message_names_key() {
        let err = ParseError::MissingField("Endpoint");
        assert_eq!(err.to_string(), "Connection string missing Endpoint");
    }

    #[test]
    fn test_error_category() {
        let err: ClientError = ParseError::MissingField("SharedAccessKey").into();
        assert_eq!(err.category(), "connection_string");

        let err: ClientError = SigningError::EmptyKey.into();
        assert_eq!(err.category(), "signing");

        let err = ClientError::MissingEnvVar("EVENTHUB_CONNECTION_STRING".into());
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_http_and_serialization_categories() {
        let err = ClientError::HttpClientError("tls backend unavailable".into());
        assert_eq!(err.category(), "transport");

        let err: ClientError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert_eq!(err.category(), "internal");
    }

    #[test]
    fn test_transparent_display() {
        let err: ClientError = ParseError::MissingField("Endpoint").into();
        assert_eq!(err.to_string(), "Connection string missing Endpoint");
    }
}
