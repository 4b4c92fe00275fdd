//! # Shared Module for the Event Hubs Telemetry Simulator
//!
//! This crate provides common types, errors, and configuration used by
//! the device client and its command-line driver.
//!
//! ## Architecture
//!
//! A simulated IoT device publishes telemetry to Azure Event Hubs over
//! plain HTTPS instead of AMQP:
//! - A **connection string** names the namespace and its signing key
//! - A **SAS token** is derived per request from that key
//! - Each event is one `POST .../messages` answered with `201 Created`

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

// Re-exports for convenience
pub use config::*;
pub use constants::*;
pub use error::*;
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
