//! Connections to the authoritative side.
//!
//! Uses enum dispatch instead of trait objects because async methods are
//! not dyn-compatible. [`Connector::Http`] talks to the transport shim with
//! `reqwest`; [`Connector::Local`] calls a [`ServerHandle`] in the same
//! process, which is how tests and single-process play run.

use tods_server::ServerHandle;
use tods_types::{Event, PlayerId};

use crate::error::ClientError;

/// A way of reaching the four transport operations.
#[derive(Debug, Clone)]
pub enum Connector {
    /// An in-process server.
    Local(ServerHandle),
    /// A remote server behind the HTTP transport.
    Http(HttpConnector),
}

impl Connector {
    /// Register `player` and start its join sequence.
    pub async fn register(&self, player: &PlayerId) -> Result<bool, ClientError> {
        match self {
            Self::Local(handle) => Ok(handle.register(player)),
            Self::Http(http) => http.get_bool("register", player).await,
        }
    }

    /// Mark `player` offline.
    pub async fn unregister(&self, player: &PlayerId) -> Result<bool, ClientError> {
        match self {
            Self::Local(handle) => Ok(handle.unregister(player)),
            Self::Http(http) => http.get_bool("unregister", player).await,
        }
    }

    /// Send a command event.
    pub async fn post(&self, command: &Event) -> Result<bool, ClientError> {
        match self {
            Self::Local(handle) => Ok(handle.post(command.clone())),
            Self::Http(http) => http.post(command).await,
        }
    }

    /// Fetch every event waiting for `player`.
    pub async fn poll(&self, player: &PlayerId) -> Result<Vec<Event>, ClientError> {
        match self {
            Self::Local(handle) => Ok(handle.poll(player)),
            Self::Http(http) => http.poll(player).await,
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::Local(_) => "local",
            Self::Http(_) => "http",
        }
    }
}

/// Client for the HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    client: reqwest::Client,
    base_url: String,
}

impl HttpConnector {
    /// Create a connector for the server at `base_url`
    /// (e.g. `http://127.0.0.1:13579`).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// The server address requests go to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_bool(&self, route: &str, player: &PlayerId) -> Result<bool, ClientError> {
        let url = format!("{}/{route}/{player}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("{route} request failed: {e}")))?;
        decode(route, response).await
    }

    async fn post(&self, command: &Event) -> Result<bool, ClientError> {
        let url = format!("{}/post", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(command)
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("post request failed: {e}")))?;
        decode("post", response).await
    }

    async fn poll(&self, player: &PlayerId) -> Result<Vec<Event>, ClientError> {
        let url = format!("{}/poll/{player}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("poll request failed: {e}")))?;
        decode("poll", response).await
    }
}

/// Check the status and decode a JSON body.
async fn decode<T>(route: &str, response: reqwest::Response) -> Result<T, ClientError>
where
    T: serde::de::DeserializeOwned,
{
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error body".to_owned());
        return Err(ClientError::Transport(format!(
            "{route} returned {status}: {body}"
        )));
    }
    response
        .json()
        .await
        .map_err(|e| ClientError::Decode(format!("{route} response parse failed: {e}")))
}
