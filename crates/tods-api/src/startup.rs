//! Launch the transport on a background Tokio task.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{ServerConfig, ServerError};
use crate::state::AppState;

/// Validate the bind address, then serve on a background task.
///
/// The returned handle can be aborted on shutdown. Bind failures that
/// happen after spawning are logged from inside the task.
pub fn spawn_api(config: ServerConfig, state: Arc<AppState>) -> Result<JoinHandle<()>, ServerError> {
    let addr = config.socket_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = crate::server::start_server(&config, state).await {
            tracing::error!(error = %e, "Transport exited with error");
        }
    });

    tracing::info!(%addr, "Transport spawned on background task");

    Ok(handle)
}
