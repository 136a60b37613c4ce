//! Error types for the client.
//!
//! Only a transport failure is fatal for a client: the session loop stops
//! instead of retrying. Illegal commands never produce an error; they just
//! never produce events either.

/// Errors that can occur while talking to the authoritative side.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server could not be reached or answered with a failure status.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a body that is not the expected JSON.
    #[error("decode error: {0}")]
    Decode(String),
}
