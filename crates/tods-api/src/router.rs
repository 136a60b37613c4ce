//! Axum router construction for the transport.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete router.
///
/// CORS allows any origin so browser observers can poll directly.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/register/{player_id}", get(handlers::register))
        .route("/unregister/{player_id}", get(handlers::unregister))
        .route("/post", post(handlers::post))
        .route("/poll/{player_id}", get(handlers::poll))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
