//! # Telemetry Generator
//!
//! Produces random sensor readings for the simulated fleet:
//! `device-001` .. `device-100`, each reporting temperature, humidity and
//! pressure from a fixed location.

use chrono::{DateTime, Utc};
use rand::Rng;

use shared::{
    constants::*,
    types::{DeviceMetadata, Location, TelemetryEvent},
};

/// Random reading source
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryGenerator;

impl TelemetryGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate one reading stamped with the current time
    pub fn generate(&self) -> TelemetryEvent {
        self.generate_with(&mut rand::thread_rng(), Utc::now())
    }

    /// Generate one reading from `rng`, stamped with `timestamp`
    pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R, timestamp: DateTime<Utc>) -> TelemetryEvent {
        let device = rng.gen_range(1..=SIMULATED_DEVICE_COUNT);

        TelemetryEvent {
            device_id: format!("device-{:03}", device),
            timestamp,
            temperature: round_to(rng.gen_range(20.0..=40.0), 1),
            humidity: round_to(rng.gen_range(30.0..=80.0), 1),
            pressure: round_to(rng.gen_range(1000.0..=1100.0), 2),
            location: Location::default(),
            metadata: DeviceMetadata {
                sensor_type: pick(rng, &SENSOR_TYPES).to_string(),
                firmware: pick(rng, &FIRMWARE_VERSIONS).to_string(),
            },
        }
    }
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, options: &[&'a str]) -> &'a str {
    options[rng.gen_range(0..options.len())]
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_readings_stay_in_range() {
        let generator = TelemetryGenerator::new();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..500 {
            let event = generator.generate_with(&mut rng, Utc::now());

            assert!((20.0..=40.0).contains(&event.temperature));
            assert!((30.0..=80.0).contains(&event.humidity));
            assert!((1000.0..=1100.0).contains(&event.pressure));

            let n: u32 = event.device_id.strip_prefix("device-").unwrap().parse().unwrap();
            assert!((1..=100).contains(&n));
            assert_eq!(event.device_id.len(), "device-000".len());

            assert!(SENSOR_TYPES.contains(&event.metadata.sensor_type.as_str()));
            assert!(FIRMWARE_VERSIONS.contains(&event.metadata.firmware.as_str()));
            assert_eq!(event.location, Location::default());
        }
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round_to(21.349, 1), 21.3);
        assert_eq!(round_to(1013.256, 2), 1013.26);
    }

    #[test]
    fn test_seeded_generation_is_repeatable() {
        let generator = TelemetryGenerator::new();
        let ts = Utc::now();

        let a = generator.generate_with(&mut StdRng::seed_from_u64(42), ts);
        let b = generator.generate_with(&mut StdRng::seed_from_u64(42), ts);
        assert_eq!(a, b);
    }

    #[test]
    fn test_generate_serializes() {
        let event = TelemetryGenerator::new().generate();
        let json: serde_json::Value = serde_json::from_slice(&event.to_json_bytes().unwrap()).unwrap();
        assert!(json["deviceId"].as_str().unwrap().starts_with("device-"));
        assert!(json["metadata"]["sensorType"].is_string());
    }
}
