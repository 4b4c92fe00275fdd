//! # Device Client for Azure Event Hubs Telemetry
//!
//! This crate provides the device side of the telemetry simulator:
//! - Connection-string parsing into a signing descriptor
//! - SAS token derivation (HMAC-SHA256, time-limited)
//! - Authenticated single-event publishing over HTTPS
//! - Random telemetry generation and a periodic, cancellable driver
//!
//! ## Event Hubs over HTTPS
//!
//! Events are sent with the Event Hubs REST interface rather than AMQP:
//! one `POST https://<namespace>/<hub>/messages` per event, authorized by
//! a fresh `SharedAccessSignature` token, answered with `201 Created`.

pub mod connection;
pub mod driver;
pub mod publish;
pub mod sas;
pub mod telemetry;

// Re-export commonly used types
pub use connection::{ConnectionDescriptor, SharedAccessKey};
pub use driver::{DriverSummary, TelemetryDriver};
pub use publish::{HttpTransport, PublishClient, PublishObserver, Transport, TracingObserver};
pub use sas::{SasTokenIssuer, SignedToken};
pub use telemetry::TelemetryGenerator;
