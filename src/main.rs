//! Backend relay.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                BACKEND RELAY                 │
//!   Client Request     │  ┌────────┐   ┌──────────────┐               │
//!   ───────────────────┼─▶│  http  │──▶│    relay     │               │
//!                      │  │ server │   │ path/upload/ │               │
//!                      │  └────────┘   │   resource   │               │
//!                      │               └──────┬───────┘               │
//!                      │                      ▼                       │
//!                      │  ┌──────────┐   ┌──────────────┐             │
//!                      │  │ upstream │──▶│  dispatcher  │─────────────┼──▶ Backend
//!                      │  │ endpoint │   │ (redirects)  │◀────────────┼───
//!                      │  └──────────┘   └──────────────┘             │
//!   Client Response    │                                              │
//!   ◀──────────────────┼── stream / passthrough / JSON error          │
//!                      │                                              │
//!                      │  config · observability · lifecycle          │
//!                      └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use backend_relay::config::loader::{load_config, load_from_env, ConfigError};
use backend_relay::config::validation::validate_config;
use backend_relay::observability::{logging, metrics};
use backend_relay::{RelayServer, Shutdown};

#[derive(Parser)]
#[command(name = "backend-relay")]
#[command(about = "Same-origin relay in front of a single HTTP backend", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults plus environment when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Force the in-cluster backend host.
    #[arg(long)]
    containerized: bool,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };
    if cli.containerized {
        config.backend.containerized = true;
    }
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init(&config.observability);
    tracing::info!("backend-relay v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        max_hops = config.redirects.max_hops,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = RelayServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
