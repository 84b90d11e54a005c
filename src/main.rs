//! Drawing analysis gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                       GATEWAY                         │
//!   POST /analyze     │  ┌────────┐    ┌──────────────┐    ┌──────────────┐  │
//!   ──────────────────┼─▶│  http  │───▶│ orchestrator │───▶│   analysis   │──┼──▶ Analysis
//!                     │  │ server │    │              │    │   provider   │  │    Service
//!                     │  └───┬────┘    └──────┬───────┘    └──────────────┘  │
//!                     │      │                │ policy                        │
//!                     │      │                ▼                               │
//!                     │      │         ┌──────────────┐    ┌──────────────┐  │
//!                     │      │         │    reward    │───▶│  blockchain  │──┼──▶ Chain RPC
//!                     │      │         │   provider   │    │ (tx builder) │  │
//!                     │      │         └──────────────┘    └──────────────┘  │
//!                     │      ▼                                                │
//!                     │  ┌──────────────────────────┐                        │
//!                     │  │ history writer (tracked) │──▶ data/<prefix>-DAY.json
//!                     │  └──────────────────────────┘                        │
//!                     └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use drawing_gateway::classify::KeywordClassifier;
use drawing_gateway::config::{load_config, load_config_str, GatewayConfig};
use drawing_gateway::history::HistoryWriter;
use drawing_gateway::http::{tls, AppState, GatewayServer};
use drawing_gateway::lifecycle::{wait_for_signal, Shutdown};
use drawing_gateway::observability::{logging, metrics};
use drawing_gateway::orchestrator::Orchestrator;
use drawing_gateway::provider::Registry;

#[derive(Parser)]
#[command(name = "drawing-gateway")]
#[command(about = "Drawing analysis gateway with on-chain rewards", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config/gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let _ = dotenv::dotenv();
    let args = Args::parse();

    let config_found = args.config.exists();
    let config: GatewayConfig = if config_found {
        load_config(&args.config)?
    } else {
        load_config_str("")?
    };

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "drawing-gateway starting");
    if !config_found {
        tracing::warn!(path = ?args.config, "Config file not found, using defaults");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        analysis_timeout_ms = config.analysis.timeout_ms,
        reward_enabled = config.reward.enabled,
        reward_threshold = config.reward.threshold,
        data_dir = %config.history.data_dir,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let registry = Registry::from_config(&config)?;
    let history = HistoryWriter::from_config(&config.history);
    let orchestrator = Orchestrator::from_registry(&registry, &config, history.clone())?;
    let state = AppState::new(orchestrator, Arc::new(KeywordClassifier), registry.names());
    let server = GatewayServer::new(state, &config);

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.trigger();
    });

    match &config.listener.tls {
        Some(tls_config) => {
            let addr: SocketAddr = config.listener.bind_address.parse()?;
            let rustls = tls::load_tls_config(tls_config).await?;
            server.run_tls(addr, rustls, shutdown).await?;
        }
        None => {
            let listener = TcpListener::bind(&config.listener.bind_address).await?;
            tracing::info!(address = %listener.local_addr()?, "Listening for connections");
            server.run(listener, shutdown).await?;
        }
    }

    history
        .drain(Duration::from_secs(config.history.drain_timeout_secs))
        .await;

    tracing::info!("Shutdown complete");
    Ok(())
}
