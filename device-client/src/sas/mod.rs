//! # SAS Token Issuer
//!
//! Derives Shared Access Signature tokens from a connection descriptor.
//!
//! ## Token Construction
//!
//! ```text
//! sr           = percent-encode(resource URI)
//! se           = now + ttl                        (Unix seconds)
//! string-to-sign = sr + "\n" + se
//! sig          = percent-encode(base64(HMAC-SHA256(key, string-to-sign)))
//!
//! SharedAccessSignature sr=<sr>&sig=<sig>&se=<se>&skn=<key name>
//! ```
//!
//! Percent-encoding treats the whole value as one opaque component: only
//! `A-Z a-z 0-9 - _ . ~` are left as-is.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use shared::{constants::*, error::SigningError};

use crate::connection::ConnectionDescriptor;

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// SIGNED TOKEN
// =============================================================================

/// A time-limited authorization header value
///
/// Created fresh for every publish and dropped afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedToken {
    value: String,
    expires_at_epoch_secs: u64,
}

impl SignedToken {
    /// Full `Authorization` header value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Unix time after which the service refuses the token
    pub fn expires_at_epoch_secs(&self) -> u64 {
        self.expires_at_epoch_secs
    }

    /// Whether the token is no longer valid at `now` (Unix seconds)
    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.expires_at_epoch_secs
    }

    pub fn into_value(self) -> String {
        self.value
    }
}

impl fmt::Debug for SignedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedToken")
            .field("value", &"<redacted>")
            .field("expires_at_epoch_secs", &self.expires_at_epoch_secs)
            .finish()
    }
}

// =============================================================================
// ISSUER
// =============================================================================

/// Issues SAS tokens with a fixed forward validity window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SasTokenIssuer {
    ttl_secs: u64,
}

impl Default for SasTokenIssuer {
    fn default() -> Self {
        Self {
            ttl_secs: SAS_TOKEN_TTL_SECS,
        }
    }
}

impl SasTokenIssuer {
    /// Create an issuer whose tokens live `ttl_secs` seconds
    pub fn new(ttl_secs: u64) -> Result<Self, SigningError> {
        if ttl_secs == 0 {
            return Err(SigningError::InvalidTtl);
        }
        Ok(Self { ttl_secs })
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Issue a token for `resource_uri`, valid from `now` (Unix seconds)
    pub fn issue(
        &self,
        descriptor: &ConnectionDescriptor,
        resource_uri: &str,
        now: u64,
    ) -> Result<SignedToken, SigningError> {
        issue(descriptor, resource_uri, now, self.ttl_secs)
    }

    /// Issue a token valid from the current wall-clock time
    pub fn issue_now(
        &self,
        descriptor: &ConnectionDescriptor,
        resource_uri: &str,
    ) -> Result<SignedToken, SigningError> {
        self.issue(descriptor, resource_uri, unix_now())
    }
}

/// Issue a SAS token for `resource_uri` valid for `ttl_secs` from `now`
///
/// Deterministic: identical inputs give byte-identical tokens.
pub fn issue(
    descriptor: &ConnectionDescriptor,
    resource_uri: &str,
    now: u64,
    ttl_secs: u64,
) -> Result<SignedToken, SigningError> {
    if ttl_secs == 0 {
        return Err(SigningError::InvalidTtl);
    }

    let expiry = now
        .checked_add(ttl_secs)
        .ok_or(SigningError::ExpiryOverflow { now, ttl_secs })?;

    let encoded_resource = urlencoding::encode(resource_uri);
    let signature = sign(
        descriptor.shared_access_key().as_bytes(),
        &string_to_sign(&encoded_resource, expiry),
    )?;

    let value = format!(
        "{} sr={}&sig={}&se={}&skn={}",
        SAS_TOKEN_PREFIX,
        encoded_resource,
        urlencoding::encode(&signature),
        expiry,
        descriptor.shared_access_key_name()
    );

    debug!(resource = %resource_uri, expires_at = expiry, "Issued SAS token");

    Ok(SignedToken {
        value,
        expires_at_epoch_secs: expiry,
    })
}

/// The exact text that gets signed: encoded resource, newline, expiry
fn string_to_sign(encoded_resource: &str, expiry: u64) -> String {
    format!("{}\n{}", encoded_resource, expiry)
}

/// Base64 HMAC-SHA256 of `message` under `key`
fn sign(key: &[u8], message: &str) -> Result<String, SigningError> {
    if key.is_empty() {
        return Err(SigningError::EmptyKey);
    }

    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| SigningError::InvalidKey(e.to_string()))?;
    mac.update(message.as_bytes());

    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Current Unix time in whole seconds
pub fn unix_now() -> u64 {
    // Pre-epoch clocks clamp to zero
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TEST_KEY: &str = "dGVzdGtleXRlc3RrZXl0ZXN0a2V5dGVzdGtleQ==";
    const RESOURCE: &str = "sb://demo-ns.servicebus.windows.net/telemetry-data";
    const NOW: u64 = 1_700_000_000;

    fn descriptor() -> ConnectionDescriptor {
        ConnectionDescriptor::new(
            "sb://demo-ns.servicebus.windows.net/",
            "RootManageSharedAccessKey",
            TEST_KEY,
        )
        .unwrap()
    }

    #[test]
    fn test_known_token() {
        let token = issue(&descriptor(), RESOURCE, NOW, 3600).unwrap();

        assert_eq!(
            token.value(),
            "SharedAccessSignature sr=sb%3A%2F%2Fdemo-ns.servicebus.windows.net%2Ftelemetry-data\
             &sig=phak%2BHyb0IwYtTMEwdfiSfGU%2BTr7yz8t6F0rRlEOHQ4%3D\
             &se=1700003600&skn=RootManageSharedAccessKey"
        );
        assert_eq!(token.expires_at_epoch_secs(), 1_700_003_600);
    }

    #[test]
    fn test_string_to_sign_layout() {
        assert_eq!(
            string_to_sign("sb%3A%2F%2Fns%2Fhub", 1_700_003_600),
            "sb%3A%2F%2Fns%2Fhub\n1700003600"
        );
    }

    #[test]
    fn test_token_is_deterministic() {
        let first = issue(&descriptor(), RESOURCE, NOW, 3600).unwrap();
        let second = issue(&descriptor(), RESOURCE, NOW, 3600).unwrap();
        assert_eq!(first.value(), second.value());
    }

    #[test]
    fn test_different_time_different_signature() {
        let first = issue(&descriptor(), RESOURCE, NOW, 3600).unwrap();
        let second = issue(&descriptor(), RESOURCE, NOW + 1, 3600).unwrap();
        assert_ne!(first.value(), second.value());
    }

    #[test]
    fn test_token_shape() {
        let token = issue(&descriptor(), RESOURCE, NOW, 3600).unwrap();
        let body = token
            .value()
            .strip_prefix("SharedAccessSignature ")
            .expect("prefix");

        let pairs: Vec<(&str, &str)> = body
            .split('&')
            .map(|pair| pair.split_once('=').expect("key=value"))
            .collect();
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, ["sr", "sig", "se", "skn"]);

        for (key, value) in &pairs[..2] {
            assert!(!value.contains(' '), "{} has a space", key);
            assert!(!value.contains('='), "{} has a raw '='", key);
            assert!(!value.contains('/'), "{} has a raw '/'", key);
        }
        assert!(pairs[2].1.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(pairs[3].1, "RootManageSharedAccessKey");
    }

    #[test]
    fn test_zero_ttl_rejected() {
        assert_eq!(
            issue(&descriptor(), RESOURCE, NOW, 0).unwrap_err(),
            SigningError::InvalidTtl
        );
        assert_eq!(SasTokenIssuer::new(0).unwrap_err(), SigningError::InvalidTtl);
    }

    #[test]
    fn test_expiry_overflow_rejected() {
        let err = issue(&descriptor(), RESOURCE, u64::MAX, 1).unwrap_err();
        assert!(matches!(err, SigningError::ExpiryOverflow { .. }));
    }

    #[test]
    fn test_empty_key_rejected_by_signer() {
        assert_eq!(sign(b"", "anything").unwrap_err(), SigningError::EmptyKey);
    }

    #[test]
    fn test_issuer_default_ttl() {
        let issuer = SasTokenIssuer::default();
        assert_eq!(issuer.ttl_secs(), 3600);

        let token = issuer.issue(&descriptor(), RESOURCE, NOW).unwrap();
        assert_eq!(token.expires_at_epoch_secs(), NOW + 3600);
        assert!(!token.is_expired_at(NOW));
        assert!(token.is_expired_at(NOW + 3600));
    }

    #[test]
    fn test_issue_now_is_in_the_future() {
        let before = unix_now();
        let token = SasTokenIssuer::default().issue_now(&descriptor(), RESOURCE).unwrap();
        assert!(token.expires_at_epoch_secs() >= before + 3600);
    }

    #[test]
    fn test_token_never_contains_key() {
        let token = issue(&descriptor(), RESOURCE, NOW, 3600).unwrap();
        assert!(!token.value().contains(TEST_KEY));
        assert!(!format!("{:?}", token).contains(TEST_KEY));
    }

    proptest! {
        #[test]
        fn prop_expiry_is_now_plus_ttl(now in 0u64..4_000_000_000, ttl in 1u64..10_000_000) {
            let token = issue(&descriptor(), RESOURCE, now, ttl).unwrap();
            prop_assert_eq!(token.expires_at_epoch_secs(), now + ttl);
            prop_assert!(token.expires_at_epoch_secs() > now);
            let expiry_suffix = format!("&se={}&skn=", now + ttl);
            prop_assert!(token.value().contains(&expiry_suffix));
        }
    }
}
