//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and shutdown so
//! `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: tods_core::ConfigError,
    },

    /// The HTTP transport could not be started.
    #[error("transport error: {source}")]
    Transport {
        /// The underlying server error.
        #[from]
        source: tods_api::ServerError,
    },

    /// The world ticker task did not shut down cleanly.
    #[error("ticker task failed: {message}")]
    Ticker {
        /// Description of the failure.
        message: String,
    },

    /// Waiting for the shutdown signal failed.
    #[error("signal error: {source}")]
    Signal {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
