//! # Constants for the Event Hubs Telemetry Simulator
//!
//! This module contains all constants used throughout the system:
//! connection-string keys, SAS token parameters, wire-protocol values
//! and simulator defaults.

// =============================================================================
// CONNECTION STRING KEYS
// =============================================================================

/// Key holding the namespace endpoint (e.g. `sb://ns.servicebus.windows.net/`)
pub const CONN_KEY_ENDPOINT: &str = "Endpoint";

/// Key holding the name of the shared access policy
pub const CONN_KEY_SHARED_ACCESS_KEY_NAME: &str = "SharedAccessKeyName";

/// Key holding the shared access key itself
pub const CONN_KEY_SHARED_ACCESS_KEY: &str = "SharedAccessKey";

/// Separator between connection-string segments
pub const CONN_SEGMENT_SEPARATOR: char = ';';

/// Separator between a segment's key and value
pub const CONN_KEY_VALUE_SEPARATOR: char = '=';

/// Endpoint schemes stripped to obtain the namespace host
pub const ENDPOINT_SCHEMES: [&str; 2] = ["sb://", "https://"];

// =============================================================================
// SAS TOKEN
// =============================================================================

/// Prefix of every SAS authorization header value
pub const SAS_TOKEN_PREFIX: &str = "SharedAccessSignature";

/// Default token lifetime (1 hour)
pub const SAS_TOKEN_TTL_SECS: u64 = 60 * 60;

// =============================================================================
// PUBLISH PROTOCOL
// =============================================================================

/// Path suffix of the single-event publish endpoint
pub const MESSAGES_PATH: &str = "messages";

/// Content type of the forwarded event body
pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";

/// Status the service answers with when an event was accepted
pub const STATUS_CREATED: u16 = 201;

/// Status code reported when no HTTP response was received
pub const STATUS_NO_RESPONSE: u16 = 0;

/// Request timeout for a single publish (seconds)
pub const PUBLISH_TIMEOUT_SECS: u64 = 30;

/// Upper bound on the response body kept in a failure detail (4 KB)
pub const MAX_DETAIL_BYTES: usize = 4 * 1024;

// =============================================================================
// SIMULATOR DEFAULTS
// =============================================================================

/// Default Event Hub receiving the telemetry
pub const DEFAULT_EVENT_HUB_NAME: &str = "telemetry-data";

/// Default interval between two simulated readings (seconds)
pub const DEFAULT_SEND_INTERVAL_SECS: u64 = 5;

/// Number of simulated devices (`device-001` .. `device-100`)
pub const SIMULATED_DEVICE_COUNT: u32 = 100;

/// Fixed location reported by every simulated device
pub const SIMULATED_LATITUDE: f64 = 47.6062;

/// Fixed location reported by every simulated device
pub const SIMULATED_LONGITUDE: f64 = -122.3321;

/// Sensor models a simulated device may report
pub const SENSOR_TYPES: [&str; 5] = ["DHT22", "BME280", "SHT30", "AM2302", "DS18B20"];

/// Firmware versions a simulated device may report
pub const FIRMWARE_VERSIONS: [&str; 5] = ["v1.2.3", "v1.3.0", "v1.2.5", "v1.4.1", "v1.1.9"];

/// Device id used by the connectivity test event
pub const TEST_DEVICE_ID: &str = "test-device";

// =============================================================================
// ENVIRONMENT VARIABLE NAMES
// =============================================================================

/// Environment variable holding the raw connection string
pub const ENV_EVENTHUB_CONNECTION_STRING: &str = "EVENTHUB_CONNECTION_STRING";

/// Environment variable overriding the Event Hub name
pub const ENV_EVENTHUB_NAME: &str = "EVENTHUB_NAME";

/// Environment variable overriding the send interval
pub const ENV_SEND_INTERVAL_SECS: &str = "SEND_INTERVAL_SECS";

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Strip a known scheme (`sb://`, `https://`) from an endpoint, leaving the host
pub fn strip_endpoint_scheme(endpoint: &str) -> &str {
    ENDPOINT_SCHEMES
        .iter()
        .find_map(|scheme| endpoint.strip_prefix(scheme))
        .unwrap_or(endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_endpoint_scheme() {
        assert_eq!(
            strip_endpoint_scheme("sb://ns.servicebus.windows.net"),
            "ns.servicebus.windows.net"
        );
        assert_eq!(
            strip_endpoint_scheme("https://ns.servicebus.windows.net"),
            "ns.servicebus.windows.net"
        );
        assert_eq!(strip_endpoint_scheme("ns.local"), "ns.local");
    }

    #[test]
    fn test_simulator_lists_are_populated() {
        assert!(SENSOR_TYPES.iter().all(|s| !s.is_empty()));
        assert!(FIRMWARE_VERSIONS.iter().all(|f| f.starts_with('v')));
    }
}
