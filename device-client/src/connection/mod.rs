//! # Connection Descriptor
//!
//! Parses an Event Hubs connection string into the three pieces needed
//! to authenticate:
//!
//! ```text
//! Endpoint=sb://<namespace>.servicebus.windows.net/;SharedAccessKeyName=<name>;SharedAccessKey=<key>
//! ```
//!
//! Segments are `;`-separated `key=value` pairs. Unknown keys and segments
//! without `=` are ignored. The descriptor is immutable once built and is
//! shared by every publish made through a client.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use zeroize::{Zeroize, ZeroizeOnDrop};

use shared::{
    constants::*,
    error::ParseError,
};

// =============================================================================
// SHARED ACCESS KEY
// =============================================================================

/// The symmetric signing key, wiped from memory on drop
///
/// `Debug` never prints the key.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SharedAccessKey(String);

impl SharedAccessKey {
    /// Raw key bytes fed to the keyed hash
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// The key as text, for serializing back into a connection string
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SharedAccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedAccessKey(<redacted>)")
    }
}

// =============================================================================
// CONNECTION DESCRIPTOR
// =============================================================================

/// Structured form of an Event Hubs connection string
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    /// Scheme and host of the namespace, without trailing `/`
    endpoint: String,

    /// Name of the shared access policy
    shared_access_key_name: String,

    /// Signing key of that policy
    shared_access_key: SharedAccessKey,
}

impl ConnectionDescriptor {
    /// Build a descriptor from its parts
    ///
    /// Values are trimmed and the endpoint loses any trailing `/`. Every
    /// part must be non-empty afterwards.
    pub fn new(
        endpoint: impl AsRef<str>,
        shared_access_key_name: impl AsRef<str>,
        shared_access_key: impl AsRef<str>,
    ) -> Result<Self, ParseError> {
        let endpoint = endpoint.as_ref().trim().trim_end_matches('/');
        if endpoint.is_empty() {
            return Err(ParseError::MissingField(CONN_KEY_ENDPOINT));
        }

        let key_name = shared_access_key_name.as_ref().trim();
        if key_name.is_empty() {
            return Err(ParseError::MissingField(CONN_KEY_SHARED_ACCESS_KEY_NAME));
        }

        let key = shared_access_key.as_ref().trim();
        if key.is_empty() {
            return Err(ParseError::MissingField(CONN_KEY_SHARED_ACCESS_KEY));
        }

        Ok(Self {
            endpoint: endpoint.to_string(),
            shared_access_key_name: key_name.to_string(),
            shared_access_key: SharedAccessKey(key.to_string()),
        })
    }

    /// Parse a raw connection string
    ///
    /// Fails with [`ParseError::MissingField`] naming the first required key
    /// (in `Endpoint`, `SharedAccessKeyName`, `SharedAccessKey` order) that
    /// is absent or empty.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let mut parts: HashMap<&str, &str> = HashMap::new();

        for segment in raw.split(CONN_SEGMENT_SEPARATOR) {
            if let Some((key, value)) = segment.split_once(CONN_KEY_VALUE_SEPARATOR) {
                parts.insert(key.trim(), value.trim());
            }
        }

        let field = |name: &'static str| match parts.get(name) {
            Some(value) if !value.is_empty() => Ok(*value),
            _ => Err(ParseError::MissingField(name)),
        };

        let endpoint = field(CONN_KEY_ENDPOINT)?;
        let key_name = field(CONN_KEY_SHARED_ACCESS_KEY_NAME)?;
        let key = field(CONN_KEY_SHARED_ACCESS_KEY)?;

        Self::new(endpoint, key_name, key)
    }

    /// Scheme and host of the namespace (e.g. `sb://ns.servicebus.windows.net`)
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Namespace host without scheme (e.g. `ns.servicebus.windows.net`)
    pub fn namespace_host(&self) -> &str {
        strip_endpoint_scheme(&self.endpoint)
    }

    /// Name of the shared access policy
    pub fn shared_access_key_name(&self) -> &str {
        &self.shared_access_key_name
    }

    /// The signing key
    pub fn shared_access_key(&self) -> &SharedAccessKey {
        &self.shared_access_key
    }

    /// Resource URI a token for `event_hub_name` is signed for
    pub fn resource_uri(&self, event_hub_name: &str) -> String {
        format!("{}/{}", self.endpoint, event_hub_name)
    }

    /// HTTPS target of a single-event publish to `event_hub_name`
    pub fn publish_url(&self, event_hub_name: &str) -> String {
        format!(
            "https://{}/{}/{}",
            self.namespace_host(),
            event_hub_name,
            MESSAGES_PATH
        )
    }

    /// Serialize back into connection-string form
    ///
    /// The result contains the shared access key.
    pub fn to_connection_string(&self) -> String {
        format!(
            "{}={}/;{}={};{}={}",
            CONN_KEY_ENDPOINT,
            self.endpoint,
            CONN_KEY_SHARED_ACCESS_KEY_NAME,
            self.shared_access_key_name,
            CONN_KEY_SHARED_ACCESS_KEY,
            self.shared_access_key.expose_secret()
        )
    }
}

impl FromStr for ConnectionDescriptor {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("endpoint", &self.endpoint)
            .field("shared_access_key_name", &self.shared_access_key_name)
            .field("shared_access_key", &self.shared_access_key)
            .finish()
    }
}
