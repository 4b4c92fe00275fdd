//! # Shared Data Types for the Event Hubs Telemetry Simulator
//!
//! This module defines the telemetry payload shape and the structured
//! result of a single publish attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    SIMULATED_LATITUDE, SIMULATED_LONGITUDE, STATUS_CREATED, STATUS_NO_RESPONSE, TEST_DEVICE_ID,
};

// =============================================================================
// TELEMETRY EVENT
// =============================================================================

/// One simulated sensor reading, serialized as the event body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEvent {
    /// Device identifier (e.g. "device-042")
    pub device_id: String,

    /// Time the reading was taken
    pub timestamp: DateTime<Utc>,

    /// Temperature in degrees Celsius
    pub temperature: f64,

    /// Relative humidity in percent
    pub humidity: f64,

    /// Air pressure in hPa
    pub pressure: f64,

    /// Where the device is installed
    pub location: Location,

    /// Hardware and firmware description
    pub metadata: DeviceMetadata,
}

impl TelemetryEvent {
    /// The fixed event used to check that the Event Hub is reachable
    pub fn connectivity_test(timestamp: DateTime<Utc>) -> Self {
        Self {
            device_id: TEST_DEVICE_ID.into(),
            timestamp,
            temperature: 25.5,
            humidity: 60.2,
            pressure: 1013.25,
            location: Location::default(),
            metadata: DeviceMetadata {
                sensor_type: "DHT22".into(),
                firmware: "v1.2.3".into(),
            },
        }
    }

    /// Serialize to the UTF-8 JSON body sent on the wire
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Geographic position of a device
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            lat: SIMULATED_LATITUDE,
            lon: SIMULATED_LONGITUDE,
        }
    }
}

/// Device hardware description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetadata {
    pub sensor_type: String,
    pub firmware: String,
}

// =============================================================================
// PUBLISH OUTCOME
// =============================================================================

/// Result of exactly one publish attempt
///
/// `status_code` is `0` whenever no HTTP response was received, which is
/// the case for both transport failures and cancellation; `cancelled`
/// tells the two apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishOutcome {
    /// Whether the service accepted the event
    pub succeeded: bool,

    /// HTTP status of the response, `0` when none was received
    pub status_code: u16,

    /// Response body or error description; empty on success
    pub detail: String,

    /// Whether the attempt was aborted by the caller
    pub cancelled: bool,
}

impl PublishOutcome {
    /// The service answered 201 Created
    pub fn success() -> Self {
        Self {
            succeeded: true,
            status_code: STATUS_CREATED,
            detail: String::new(),
            cancelled: false,
        }
    }

    /// The service answered with any other status
    pub fn rejected(status_code: u16, body: &str, max_detail_bytes: usize) -> Self {
        Self {
            succeeded: false,
            status_code,
            detail: truncate_detail(body, max_detail_bytes),
            cancelled: false,
        }
    }

    /// No response was received
    pub fn transport_failure(description: &str, max_detail_bytes: usize) -> Self {
        Self {
            succeeded: false,
            status_code: STATUS_NO_RESPONSE,
            detail: truncate_detail(description, max_detail_bytes),
            cancelled: false,
        }
    }

    /// The caller aborted the attempt before a response arrived
    pub fn cancelled() -> Self {
        Self {
            succeeded: false,
            status_code: STATUS_NO_RESPONSE,
            detail: "publish cancelled".into(),
            cancelled: true,
        }
    }

    /// Whether the service itself rejected the request
    pub fn is_rejection(&self) -> bool {
        !self.succeeded && self.status_code != STATUS_NO_RESPONSE
    }

    /// Whether the request failed before any response was received
    pub fn is_transport_failure(&self) -> bool {
        !self.succeeded && !self.cancelled && self.status_code == STATUS_NO_RESPONSE
    }
}

impl std::fmt::Display for PublishOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.succeeded {
            write!(f, "accepted ({})", self.status_code)
        } else if self.cancelled {
            write!(f, "cancelled")
        } else if self.status_code == STATUS_NO_RESPONSE {
            write!(f, "transport error: {}", self.detail)
        } else {
            write!(f, "rejected ({}): {}", self.status_code, self.detail)
        }
    }
}

const TRUNCATION_MARKER: &str = "...[truncated]";

/// Cut `text` to at most `max_bytes` bytes on a char boundary
fn truncate_detail(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }

    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}{}", &text[..end], TRUNCATION_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_event_serializes_camel_case() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let event = TelemetryEvent::connectivity_test(ts);
        let json: serde_json::Value = serde_json::from_slice(&event.to_json_bytes().unwrap()).unwrap();

        assert_eq!(json["deviceId"], "test-device");
        assert_eq!(json["timestamp"], "2024-05-01T12:00:00Z");
        assert_eq!(json["pressure"], 1013.25);
        assert_eq!(json["location"]["lat"], 47.6062);
        assert_eq!(json["metadata"]["sensorType"], "DHT22");
        assert_eq!(json["metadata"]["firmware"], "v1.2.3");
    }

    #[test]
    fn test_outcome_classification() {
        let ok = PublishOutcome::success();
        assert!(ok.succeeded);
        assert_eq!(ok.status_code, 201);

        let rejected = PublishOutcome::rejected(401, "Unauthorized", 4096);
        assert!(rejected.is_rejection());
        assert!(!rejected.is_transport_failure());
        assert_eq!(rejected.detail, "Unauthorized");

        let failed = PublishOutcome::transport_failure("connection refused", 4096);
        assert!(failed.is_transport_failure());
        assert_eq!(failed.status_code, 0);

        let cancelled = PublishOutcome::cancelled();
        assert!(cancelled.cancelled);
        assert_eq!(cancelled.status_code, 0);
        assert!(!cancelled.is_transport_failure());
        assert!(!cancelled.is_rejection());
    }

    #[test]
    fn test_detail_truncated_on_char_boundary() {
        let body = "é".repeat(10); // 20 bytes
        let outcome = PublishOutcome::rejected(500, &body, 5);
        assert!(outcome.detail.starts_with("éé"));
        assert!(outcome.detail.ends_with(TRUNCATION_MARKER));
        assert_eq!(outcome.detail.len(), 4 + TRUNCATION_MARKER.len());
    }

    #[test]
    fn test_short_detail_untouched() {
        assert_eq!(truncate_detail("short", 4096), "short");
    }

    #[test]
    fn test_display() {
        assert_eq!(PublishOutcome::success().to_string(), "accepted (201)");
        assert_eq!(
            PublishOutcome::rejected(404, "no such hub", 64).to_string(),
            "rejected (404): no such hub"
        );
    }
}
