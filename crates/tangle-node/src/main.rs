//! # Tangle Node
//!
//! Starts the HTTP API over an in-memory graph store and the CPU
//! proof-of-work engine.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (`TANGLE_CONFIG` file if set, then environment)
//! 2. Initialize logging from the `[logging]` section, `RUST_LOG` wins
//! 3. Build the store, milestone tracker, PoW engine and peer prober
//! 4. Serve until Ctrl+C

use anyhow::{Context, Result};
use std::sync::Arc;
use tangle_api::domain::config::ENV_CONFIG_PATH;
use tangle_api::{ApiServer, MilestoneTracker, NodeConfig, NodeContext, TcpPeerProber};
use tangle_pow::CpuPowEngine;
use tangle_storage::InMemoryGraphStore;
use tokio::sync::oneshot;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn load_config() -> Result<NodeConfig> {
    let mut config = match std::env::var(ENV_CONFIG_PATH) {
        Ok(path) => NodeConfig::load(&path)
            .with_context(|| format!("loading configuration from {}", path))?,
        Err(_) => NodeConfig::default(),
    };
    config
        .apply_env()
        .context("applying environment overrides")?;
    config.validate().context("validating configuration")?;
    Ok(config)
}

fn init_logging(config: &NodeConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.filter))
        .context("building log filter")?;

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
            .context("installing JSON subscriber")?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
            .context("installing subscriber")?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    init_logging(&config)?;

    let pow = CpuPowEngine::new(config.pow.threads, config.pow.check_interval)
        .context("starting proof-of-work workers")?;
    info!(threads = config.pow.threads, "proof-of-work engine ready");

    let context = NodeContext::new(
        &config,
        Arc::new(InMemoryGraphStore::new()),
        Arc::new(MilestoneTracker::new()),
        Arc::new(pow),
        Arc::new(TcpPeerProber),
    )
    .context("building node state")?;

    let server = ApiServer::new(&config, Arc::new(context)).context("building API server")?;
    let listener = server.bind().await?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl+C received, shutting down");
                let _ = shutdown_tx.send(());
            }
            Err(e) => {
                error!(error = %e, "failed to listen for Ctrl+C");
                // Dropping the sender would stop the server.
                std::future::pending::<()>().await
            }
        }
    });

    info!(version = tangle_api::VERSION, "Node is running. Press Ctrl+C to stop.");
    server.serve(listener, shutdown_rx).await?;
    Ok(())
}
