//! HTTP transport for the Tods simulation.
//!
//! A thin Axum shim over [`ServerHandle`]: each route maps to one of the
//! four synchronous operations (register, unregister, post, poll) and
//! returns its result as JSON. The shim holds no game state of its own.
//!
//! [`ServerHandle`]: tods_server::ServerHandle

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::spawn_api;
pub use state::AppState;
