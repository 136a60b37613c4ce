//! Shared application state for the transport handlers.

use chrono::{DateTime, Utc};
use tods_server::ServerHandle;

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Entry point into the authoritative world.
    pub handle: ServerHandle,
    /// When the transport was created.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Wrap a server handle.
    pub fn new(handle: ServerHandle) -> Self {
        Self {
            handle,
            started_at: Utc::now(),
        }
    }
}
