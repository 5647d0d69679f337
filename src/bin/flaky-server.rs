//! Flaky demo upstream: `GET /example` answers 502 for a share of requests.

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use resilient_fetch::config::{load_or_default, revalidate};
use resilient_fetch::http::FlakyServer;
use resilient_fetch::lifecycle::{signals, Shutdown};
use resilient_fetch::observability::init_tracing;

#[derive(Parser)]
#[command(name = "flaky-server")]
#[command(about = "HTTP upstream that randomly fails with 502 Bad Gateway", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides server.bind_address).
    #[arg(short, long)]
    bind: Option<String>,

    /// Failure probability in [0, 1] (overrides server.failure_rate).
    #[arg(short, long)]
    failure_rate: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = load_or_default(cli.config.as_deref())?;

    init_tracing(&config.observability);

    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }
    if let Some(rate) = cli.failure_rate {
        config.server.failure_rate = rate;
    }
    let config = revalidate(config)?;

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = FlakyServer::new(config.server.clone());
    let server_shutdown = shutdown.subscribe();

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::trigger_on_ctrl_c(&signal_shutdown).await;
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
