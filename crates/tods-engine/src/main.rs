//! Server binary for the Tods simulation.
//!
//! Wires the authoritative world to a wall-clock ticker and exposes it
//! through the HTTP transport.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `tods-config.yaml` (defaults when absent)
//! 2. Initialize structured logging (tracing)
//! 3. Create the server world
//! 4. Spawn the world ticker task
//! 5. Start the HTTP transport
//! 6. Wait for Ctrl-C, then stop the ticker and the transport

mod error;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tods_api::{AppState, ServerConfig, spawn_api};
use tods_core::config::CONFIG_FILE;
use tods_core::{TickerControl, TodsConfig, run_ticker};
use tods_server::ServerSim;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration, the transport, or shutdown fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    let config = load_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        tick_interval_ms = config.world.tick_interval_ms,
        ships_per_player = config.world.ships_per_player,
        map_width = config.world.map_width,
        map_height = config.world.map_height,
        seed = ?config.world.seed,
        "tods-engine starting"
    );

    let mut sim = ServerSim::new(&config);
    let handle = sim.handle();

    let control = Arc::new(TickerControl::new());
    let interval = Duration::from_millis(config.world.tick_interval_ms.max(1));
    let ticker = {
        let control = Arc::clone(&control);
        tokio::spawn(async move { run_ticker(&mut sim, interval, &control).await })
    };

    let api = spawn_api(ServerConfig::from(&config.api), Arc::new(AppState::new(handle)))?;
    info!(host = config.api.host, port = config.api.port, "Engine running, Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    control.request_stop();
    let ticks = ticker.await.map_err(|e| EngineError::Ticker {
        message: format!("{e}"),
    })?;
    api.abort();

    info!(ticks, "tods-engine stopped");
    Ok(())
}

/// Load configuration from `tods-config.yaml`, falling back to defaults,
/// then apply environment overrides.
fn load_config() -> Result<TodsConfig, EngineError> {
    let mut config = TodsConfig::load_or_default(Path::new(CONFIG_FILE))?;
    config.apply_env_overrides();
    Ok(config)
}
