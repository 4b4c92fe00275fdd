//! # Event Hubs Device Client CLI
//!
//! Command-line tool simulating an IoT device:
//! - Check that the Event Hub is reachable
//! - Stream random telemetry on an interval
//! - Inspect the connection string and the tokens derived from it
//!
//! ## Usage
//!
//! ```bash
//! export EVENTHUB_CONNECTION_STRING="Endpoint=sb://<ns>.servicebus.windows.net/;SharedAccessKeyName=<name>;SharedAccessKey=<key>"
//!
//! # Send one test event
//! device-client test
//!
//! # Send a reading every 5 seconds until Ctrl-C
//! device-client run --interval 5
//!
//! # Show the parsed connection string (the key is never printed)
//! device-client show
//!
//! # Print a SAS token valid for 10 minutes
//! device-client token --ttl 600
//! ```

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use device_client::{ConnectionDescriptor, PublishClient, SasTokenIssuer, TelemetryDriver};
use shared::{
    config::PublisherConfig,
    constants::ENV_EVENTHUB_CONNECTION_STRING,
    error::{ClientError, ClientResult},
    types::TelemetryEvent,
};

#[derive(Parser)]
#[command(name = "device-client")]
#[command(about = "Simulated IoT device sending telemetry to Azure Event Hubs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Event Hub to publish to (overrides EVENTHUB_NAME)
    #[arg(long, global = true)]
    event_hub: Option<String>,

    /// Connection string (overrides EVENTHUB_CONNECTION_STRING)
    #[arg(long, global = true)]
    connection_string: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a single test event to check connectivity
    Test,

    /// Send random telemetry periodically until interrupted
    Run {
        /// Seconds between readings (overrides SEND_INTERVAL_SECS)
        #[arg(long, short = 'i')]
        interval: Option<u64>,

        /// Stop after this many readings
        #[arg(long, short = 'n')]
        count: Option<u64>,

        /// Skip the initial connectivity test
        #[arg(long)]
        skip_test: bool,
    },

    /// Print a freshly issued SAS token
    Token {
        /// Token lifetime in seconds
        #[arg(long)]
        ttl: Option<u64>,
    },

    /// Show the parsed connection string
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    println!("Azure Event Hub Sample Data Generator (REST API)");
    println!("{}", "=".repeat(60));
    info!("device-client v{}", shared::VERSION);

    // Build config: environment first, flags on top
    let mut config = logged(PublisherConfig::from_env())?;
    if let Some(event_hub) = cli.event_hub {
        config.event_hub_name = event_hub;
    }
    if let Some(connection_string) = cli.connection_string {
        config.connection_string = Some(connection_string);
    }
    if let Commands::Run { interval: Some(interval), .. } = cli.command {
        config.send_interval_secs = interval;
    }
    if let Commands::Token { ttl: Some(ttl) } = cli.command {
        config.token_ttl_secs = ttl;
    }
    logged(config.validate())?;

    if config.connection_string.is_none() {
        config.connection_string = Some(prompt_connection_string()?);
    } else {
        info!("Using connection string from environment or command line");
    }

    match cli.command {
        Commands::Test => {
            let client = logged(PublishClient::from_config(&config))?;
            if !test_connectivity(&client, &config).await? {
                print_connectivity_hints();
                bail!("Connectivity test failed");
            }
        }
        Commands::Run { count, skip_test, .. } => {
            run(&config, count, skip_test).await?;
        }
        Commands::Token { .. } => {
            print_token(&config)?;
        }
        Commands::Show => {
            show_descriptor(&config)?;
        }
    }

    Ok(())
}

async fn test_connectivity(client: &PublishClient, config: &PublisherConfig) -> Result<bool> {
    info!("Testing Event Hub connectivity...");

    let event = TelemetryEvent::connectivity_test(Utc::now());
    let outcome = logged(client.publish_event(&config.event_hub_name, &event).await)?;

    if outcome.succeeded {
        println!("✓ Test message sent successfully! Event Hub is reachable.");
    } else {
        println!("✗ Test message failed: {}", outcome);
    }

    Ok(outcome.succeeded)
}

async fn run(config: &PublisherConfig, count: Option<u64>, skip_test: bool) -> Result<()> {
    let client = Arc::new(logged(PublishClient::from_config(config))?);

    if !skip_test && !test_connectivity(&client, config).await? {
        print_connectivity_hints();
        bail!("Connectivity test failed");
    }

    println!(
        "\nStarting continuous data generation (every {} seconds)",
        config.send_interval_secs
    );
    println!("Press Ctrl+C to stop...");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\n⏹️  Stopping data generation...");
            on_interrupt.cancel();
        }
    });

    let mut driver = logged(TelemetryDriver::new(
        client,
        config.event_hub_name.clone(),
        config.send_interval(),
    ))?
    .with_sample_printing(true);
    if let Some(count) = count {
        driver = driver.with_max_ticks(count);
    }

    let summary = driver.run(cancel).await;

    println!(
        "\nSent {} readings: {} accepted, {} failed",
        summary.ticks, summary.succeeded, summary.failed
    );
    if summary.failed > 0 {
        warn!(failed = summary.failed, "Some readings were not delivered");
    }

    Ok(())
}

fn print_token(config: &PublisherConfig) -> Result<()> {
    let descriptor = load_descriptor(config)?;
    let issuer = logged(SasTokenIssuer::new(config.token_ttl_secs).map_err(ClientError::from))?;

    let resource_uri = descriptor.resource_uri(&config.event_hub_name);
    let token = logged(issuer.issue_now(&descriptor, &resource_uri).map_err(ClientError::from))?;

    let expires_at = i64::try_from(token.expires_at_epoch_secs())
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

    println!("\nResource: {}", resource_uri);
    match expires_at {
        Some(at) => println!("Expires:  {} ({})", at.to_rfc3339(), token.expires_at_epoch_secs()),
        None => println!("Expires:  {}", token.expires_at_epoch_secs()),
    }
    println!("\n{}", token.value());

    Ok(())
}

fn show_descriptor(config: &PublisherConfig) -> Result<()> {
    let descriptor = load_descriptor(config)?;

    println!("\nConnection:");
    println!("  Endpoint:    {}", descriptor.endpoint());
    println!("  Namespace:   {}", descriptor.namespace_host());
    println!("  Key name:    {}", descriptor.shared_access_key_name());
    println!("  Event Hub:   {}", config.event_hub_name);
    println!("  Resource:    {}", descriptor.resource_uri(&config.event_hub_name));
    println!("  Publish URL: {}", descriptor.publish_url(&config.event_hub_name));

    Ok(())
}

fn load_descriptor(config: &PublisherConfig) -> ClientResult<ConnectionDescriptor> {
    logged(
        config
            .connection_string()
            .and_then(|raw| ConnectionDescriptor::parse(raw).map_err(ClientError::from)),
    )
}

/// Log a client error with its category before it is propagated
fn logged<T>(result: ClientResult<T>) -> ClientResult<T> {
    if let Err(e) = &result {
        error!(category = e.category(), error = %e, "Client error");
    }
    result
}

fn prompt_connection_string() -> Result<String> {
    println!("\nEvent Hub connection string not found in {}.", ENV_EVENTHUB_CONNECTION_STRING);
    println!("Please provide your Event Hub connection string.");
    println!("You can get it from Azure portal > Event Hubs > Shared access policies");
    println!("\nConnection string format:");
    println!("Endpoint=sb://your-namespace.servicebus.windows.net/;SharedAccessKeyName=RootManageSharedAccessKey;SharedAccessKey=your-key");

    let stdin = io::stdin();
    let mut lines = stdin.lock();

    loop {
        print!("\nEnter connection string: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if lines.read_line(&mut line)? == 0 {
            bail!("No connection string provided");
        }

        let line = line.trim();
        if !line.is_empty() {
            return Ok(line.to_string());
        }
        println!("Connection string cannot be empty. Please try again.");
    }
}

fn print_connectivity_hints() {
    println!("\n❌ Connectivity test failed. Please check:");
    println!("1. Your connection string is correct");
    println!("2. Your Event Hub exists and is accessible");
    println!("3. Your network connection is working");
}
