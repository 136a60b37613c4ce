//! Request handlers for the four transport operations.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Server status (player counts, uptime) |
//! | `GET` | `/register/{player_id}` | Create or reactivate a session |
//! | `GET` | `/unregister/{player_id}` | Mark a session offline |
//! | `POST` | `/post` | Queue a command event (JSON body) |
//! | `GET` | `/poll/{player_id}` | Drain the player's pending events |

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use chrono::Utc;
use serde::Serialize;
use tods_types::{Event, PlayerId};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Body of `GET /`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    /// Service name.
    pub name: &'static str,
    /// Sessions ever registered.
    pub players: usize,
    /// Sessions currently online.
    pub online: usize,
    /// Seconds since the transport started.
    pub uptime_seconds: i64,
}

/// Report player counts and uptime.
pub async fn index(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let status = state.handle.status();
    Json(StatusResponse {
        name: "tods",
        players: status.players,
        online: status.online,
        uptime_seconds: Utc::now()
            .signed_duration_since(state.started_at)
            .num_seconds(),
    })
}

/// `GET /register/{player_id}`.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<String>,
) -> Json<bool> {
    Json(state.handle.register(&PlayerId::from(player_id)))
}

/// `GET /unregister/{player_id}`.
pub async fn unregister(
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<String>,
) -> Json<bool> {
    Json(state.handle.unregister(&PlayerId::from(player_id)))
}

/// `POST /post` with a JSON [`Event`] body.
pub async fn post(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<bool>, ApiError> {
    let command: Event = serde_json::from_slice(&body)?;
    debug!(%command, "Command posted");
    Ok(Json(state.handle.post(command)))
}

/// `GET /poll/{player_id}`.
pub async fn poll(
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<String>,
) -> Json<Vec<Event>> {
    Json(state.handle.poll(&PlayerId::from(player_id)))
}
