//! Error types for the HTTP transport.
//!
//! [`ApiError`] converts into an Axum response carrying a small JSON body
//! via its [`IntoResponse`](axum::response::IntoResponse) implementation.
//! Unknown players and illegal commands are not errors at this layer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The posted body is not a valid event.
    #[error("invalid event: {0}")]
    InvalidEvent(#[from] serde_json::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::InvalidEvent(e) => (StatusCode::BAD_REQUEST, format!("invalid event: {e}")),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
