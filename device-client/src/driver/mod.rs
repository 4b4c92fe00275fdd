//! # Telemetry Driver
//!
//! Cancellable timer task: on every tick it generates one reading and
//! publishes it through a single long-lived [`PublishClient`]. Ticks are
//! independent; only the counters in [`DriverSummary`] carry over.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use shared::{
    error::{ClientError, ClientResult},
    types::TelemetryEvent,
};

use crate::publish::PublishClient;
use crate::telemetry::TelemetryGenerator;

/// What a driver run did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DriverSummary {
    /// Ticks that attempted a publish
    pub ticks: u64,
    /// Publishes the service accepted
    pub succeeded: u64,
    /// Publishes that were rejected, failed in transport or could not be signed
    pub failed: u64,
}

/// Periodic telemetry sender
pub struct TelemetryDriver {
    client: Arc<PublishClient>,
    generator: TelemetryGenerator,
    event_hub_name: String,
    interval: Duration,
    max_ticks: Option<u64>,
    print_samples: bool,
}

impl TelemetryDriver {
    /// Create a driver publishing to `event_hub_name` every `interval`
    ///
    /// A zero interval is rejected; the timer needs a non-zero period.
    pub fn new(
        client: Arc<PublishClient>,
        event_hub_name: impl Into<String>,
        interval: Duration,
    ) -> ClientResult<Self> {
        if interval.is_zero() {
            return Err(ClientError::ConfigurationError(
                "send interval must be greater than zero".into(),
            ));
        }

        Ok(Self {
            client,
            generator: TelemetryGenerator::new(),
            event_hub_name: event_hub_name.into(),
            interval,
            max_ticks: None,
            print_samples: false,
        })
    }

    /// Stop after `max_ticks` publishes
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    /// Print each generated reading to stdout before sending it
    pub fn with_sample_printing(mut self, enabled: bool) -> Self {
        self.print_samples = enabled;
        self
    }

    /// Run until `cancel` fires or the tick limit is reached
    ///
    /// The first reading is sent immediately.
    pub async fn run(self, cancel: CancellationToken) -> DriverSummary {
        info!(
            event_hub = %self.event_hub_name,
            interval_secs = self.interval.as_secs(),
            "Starting continuous data generation"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut summary = DriverSummary::default();

        loop {
            if self.max_ticks.is_some_and(|max| summary.ticks >= max) {
                break;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let event = self.generator.generate();
            if self.print_samples {
                print_sample(&event);
            }

            summary.ticks += 1;
            match self.send(&event, &cancel).await {
                Some(true) => summary.succeeded += 1,
                Some(false) => summary.failed += 1,
                None => break,
            }
        }

        info!(
            ticks = summary.ticks,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Stopping data generation"
        );
        summary
    }

    /// Publish one event; `None` when the run was cancelled mid-flight
    async fn send(&self, event: &TelemetryEvent, cancel: &CancellationToken) -> Option<bool> {
        let body = match event.to_json_bytes() {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "Failed to serialize telemetry");
                return Some(false);
            }
        };

        match self
            .client
            .publish_cancellable(&self.event_hub_name, &body, cancel)
            .await
        {
            Ok(outcome) if outcome.cancelled => {
                // The attempt was counted as a tick but is neither outcome
                None
            }
            Ok(outcome) => Some(outcome.succeeded),
            Err(e) => {
                error!(category = e.category(), error = %e, "Failed to prepare publish request");
                Some(false)
            }
        }
    }
}

fn print_sample(event: &TelemetryEvent) {
    match serde_json::to_string_pretty(event) {
        Ok(json) => println!("\nSample telemetry data:\n{}", json),
        Err(e) => error!(error = %e, "Failed to render telemetry"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionDescriptor;
    use crate::publish::{NoopObserver, PublishRequest, Transport, TransportError, TransportResponse};
    use async_trait::async_trait;
    use shared::config::PublisherConfig;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Answers each request with the next status from a fixed cycle
    struct CyclingTransport {
        statuses: Vec<u16>,
        calls: AtomicU64,
        delay: Duration,
    }

    #[async_trait]
    impl Transport for CyclingTransport {
        async fn post(&self, _request: PublishRequest) -> Result<TransportResponse, TransportError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            tokio::time::sleep(self.delay).await;
            Ok(TransportResponse {
                status: self.statuses[n % self.statuses.len()],
                body: String::new(),
            })
        }
    }

    fn client(statuses: Vec<u16>, delay: Duration) -> (Arc<PublishClient>, Arc<CyclingTransport>) {
        let transport = Arc::new(CyclingTransport {
            statuses,
            calls: AtomicU64::new(0),
            delay,
        });
        let descriptor = ConnectionDescriptor::parse(
            "Endpoint=sb://demo-ns.servicebus.windows.net/;SharedAccessKeyName=send;SharedAccessKey=a2V5",
        )
        .unwrap();
        let client = PublishClient::with_transport(descriptor, transport.clone(), &PublisherConfig::default())
            .unwrap()
            .with_observer(Arc::new(NoopObserver));
        (Arc::new(client), transport)
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_until_tick_limit() {
        let (client, transport) = client(vec![201, 503], Duration::ZERO);
        let driver = TelemetryDriver::new(client, "telemetry-data", Duration::from_secs(5))
            .unwrap()
            .with_max_ticks(4);

        let summary = driver.run(CancellationToken::new()).await;

        assert_eq!(
            summary,
            DriverSummary {
                ticks: 4,
                succeeded: 2,
                failed: 2
            }
        );
        assert_eq!(transport.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_follow_interval() {
        let (client, transport) = client(vec![201], Duration::ZERO);
        let driver = TelemetryDriver::new(client, "telemetry-data", Duration::from_secs(5)).unwrap();
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(driver.run(cancel.clone()));

        // Ticks at t=0, 5, 10
        tokio::time::sleep(Duration::from_secs(12)).await;
        cancel.cancel();

        let summary = handle.await.unwrap();
        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_publish_stops_run() {
        let (client, _transport) = client(vec![201], Duration::from_secs(20));
        let driver = TelemetryDriver::new(client, "telemetry-data", Duration::from_secs(5)).unwrap();
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(driver.run(cancel.clone()));

        tokio::time::sleep(Duration::from_secs(2)).await;
        cancel.cancel();

        let summary = handle.await.unwrap();
        assert_eq!(summary.ticks, 1);
        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_sends_nothing() {
        let (client, transport) = client(vec![201], Duration::ZERO);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = TelemetryDriver::new(client, "telemetry-data", Duration::from_secs(5))
            .unwrap()
            .run(cancel)
            .await;

        assert_eq!(summary, DriverSummary::default());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let (client, _transport) = client(vec![201], Duration::ZERO);
        let err = TelemetryDriver::new(client, "telemetry-data", Duration::ZERO)
            .err()
            .unwrap();
        assert_eq!(err.category(), "config");
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_hub_name_counts_as_failure() {
        let (client, transport) = client(vec![201], Duration::ZERO);
        let summary = TelemetryDriver::new(client, "hub?x", Duration::from_secs(5))
            .unwrap()
            .with_max_ticks(2)
            .run(CancellationToken::new())
            .await;

        assert_eq!(
            summary,
            DriverSummary {
                ticks: 2,
                succeeded: 0,
                failed: 2
            }
        );
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }
}
