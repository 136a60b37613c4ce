//! Headless observer client for the Tods simulation.
//!
//! Registers a player with the server named by `client.server_url`, then
//! polls and renders at the configured cadence, logging whenever the
//! mirror changes. Ctrl-C unregisters and exits. A transport failure ends
//! the client with an error.
//!
//! The player id comes from `TODS_PLAYER_ID` or is generated.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tods_client::{ClientSession, Connector, HttpConnector};
use tods_core::config::CONFIG_FILE;
use tods_core::{TickerControl, TodsConfig};
use tods_types::PlayerId;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = TodsConfig::load_or_default(Path::new(CONFIG_FILE))
        .context("loading configuration")?;
    config.apply_env_overrides();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    let player = std::env::var("TODS_PLAYER_ID").map_or_else(|_| PlayerId::random(), PlayerId::from);
    info!(
        %player,
        server_url = config.client.server_url,
        render_tick_ms = config.client.render_tick_ms,
        "tods-client starting"
    );

    let connector = Connector::Http(HttpConnector::new(config.client.server_url.clone()));
    let mut session = ClientSession::new(player, connector, config.client.render_tick_ms);
    session.register().await.context("registering with the server")?;

    let control = Arc::new(TickerControl::new());
    {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, leaving");
                    control.request_stop();
                }
                Err(e) => warn!(error = %e, "Cannot listen for Ctrl-C"),
            }
        });
    }

    let frames = session.run(&control).await.context("event loop")?;
    if let Err(e) = session.leave().await {
        warn!(error = %e, "Unregister failed");
    }
    info!(frames, ships = session.world().ship_count(), "tods-client stopped");
    Ok(())
}
