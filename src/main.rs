//! Demo driver: repeatedly fetches a flaky upstream through the resilient
//! client and reports what the breaker saw.
//!
//! ```text
//!  driver loop ──▶ ResilientClient::fetch ──▶ Breaker::allow ──▶ GET upstream
//!       ▲                  │                        ▲                 │
//!       │                  ▼                        │                 ▼
//!   log / print ◀── body or FetchError ◀── on_success/on_failure ◀── classify
//! ```

use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use resilient_fetch::config::{load_or_default, revalidate};
use resilient_fetch::lifecycle::{signals, Shutdown};
use resilient_fetch::observability::init_tracing;
use resilient_fetch::resilience::BreakerSnapshot;
use resilient_fetch::{BreakerRegistry, ResilientClient};

#[derive(Parser)]
#[command(name = "resilient-fetch")]
#[command(about = "Fetch a flaky upstream with retries and a circuit breaker", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Upstream URL (overrides driver.target_url).
    #[arg(short, long)]
    url: Option<String>,

    /// Number of fetches (overrides driver.iterations).
    #[arg(short = 'n', long)]
    iterations: Option<u32>,

    /// Pause between fetches in milliseconds (overrides driver.interval_ms).
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Retry without a circuit breaker.
    #[arg(long)]
    retry_only: bool,

    /// Print one JSON line per fetch instead of plain text.
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct FetchReport {
    iteration: u32,
    breaker: Option<BreakerSnapshot>,
    body: Option<String>,
    error: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = load_or_default(cli.config.as_deref())?;

    init_tracing(&config.observability);

    if let Some(url) = cli.url {
        config.driver.target_url = url;
    }
    if let Some(iterations) = cli.iterations {
        config.driver.iterations = iterations;
    }
    if let Some(interval_ms) = cli.interval_ms {
        config.driver.interval_ms = interval_ms;
    }
    let config = revalidate(config)?;

    tracing::info!(
        url = %config.driver.target_url,
        iterations = config.driver.iterations,
        trip_threshold = config.breaker.trip_threshold,
        cooldown_secs = config.breaker.cooldown_secs,
        max_attempts = config.retry.max_attempts,
        retry_only = cli.retry_only,
        "Configuration loaded"
    );

    let registry = BreakerRegistry::new(config.breaker.clone());
    let client = if cli.retry_only {
        ResilientClient::retry_only(config.retry.clone())?
    } else {
        let breaker = registry.breaker_for(&config.driver.target_url)?;
        ResilientClient::new(config.retry.clone(), breaker)?
    };

    let shutdown = Shutdown::new();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::trigger_on_ctrl_c(&signal_shutdown).await;
    });
    let mut stop = shutdown.subscribe();
    let interval = Duration::from_millis(config.driver.interval_ms);

    for iteration in 0..config.driver.iterations {
        if shutdown.is_triggered() {
            break;
        }

        let result = client.fetch(&config.driver.target_url).await;
        let snapshot = client.breaker().map(|b| b.snapshot());

        if let Some(snapshot) = snapshot {
            tracing::info!(
                state = %snapshot.state,
                consecutive_failures = snapshot.consecutive_failures,
                "Breaker status"
            );
        }
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Fetch failed");
        }

        let (body, error) = match result {
            Ok(body) => (Some(body), None),
            Err(e) => (None, Some(e.to_string())),
        };

        if cli.json {
            let report = FetchReport {
                iteration,
                breaker: snapshot,
                body,
                error,
            };
            println!("{}", serde_json::to_string(&report)?);
        } else {
            println!("{}", body.unwrap_or_default());
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = stop.recv() => break,
        }
    }

    tracing::info!("Driver finished");
    Ok(())
}
