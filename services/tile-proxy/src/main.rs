//! Tile proxy service.
//!
//! Relays bbox-addressed image requests for services without CORS support
//! and serves local MBTiles vector tiles.

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tile_proxy::{config::Args, metrics, router, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("Invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    let prometheus_handle = metrics::install_recorder().context("Failed to install Prometheus recorder")?;
    info!("Prometheus metrics exporter initialized");

    let state = Arc::new(AppState::new(&args).await?);
    for tileset in state.tiles.list() {
        info!(tileset = %tileset.name, available = tileset.available, "Tileset configured");
    }
    if state.allowed_hosts.is_empty() {
        warn!("No upstream allowlist, proxy will contact any public host");
    }

    let app = router(state, prometheus_handle);

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", args.listen))?;
    info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
