//! WebSocket client for the backend's live update endpoint.
//!
//! [`LiveClient`] holds the connection configuration. Call
//! [`LiveClient::connect`] to establish a [`WsStream`].

use std::sync::Arc;

use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use logitrack_core::session::SessionStore;

/// Address used when none is configured.
pub const DEFAULT_WS_URL: &str = "ws://localhost:3000";

/// A live WebSocket connection to the backend.
pub type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Configuration handle for the live endpoint.
#[derive(Clone)]
pub struct LiveClient {
    ws_url: String,
    session: Option<Arc<SessionStore>>,
}

impl LiveClient {
    /// * `ws_url` - e.g. `ws://localhost:3000`.
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            session: None,
        }
    }

    /// Send the session's token as a bearer header on every handshake.
    pub fn with_session(mut self, session: Arc<SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// Open a connection.
    ///
    /// The token is read at call time, so a reconnect after re-login
    /// carries the new credential.
    pub async fn connect(&self) -> Result<WsStream, LiveClientError> {
        let mut request = self
            .ws_url
            .as_str()
            .into_client_request()
            .map_err(|e| LiveClientError::InvalidUrl(format!("{}: {e}", self.ws_url)))?;

        if let Some(token) = self.session.as_ref().and_then(|s| s.token()) {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| LiveClientError::Connection(format!("invalid token header: {e}")))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let (ws_stream, _response) = connect_async(request).await.map_err(|e| {
            LiveClientError::Connection(format!(
                "Failed to connect to live endpoint at {}: {e}",
                self.ws_url
            ))
        })?;

        tracing::info!(url = %self.ws_url, "Live channel connected");
        Ok(ws_stream)
    }
}

/// Errors that can occur when connecting the live channel.
#[derive(Debug, thiserror::Error)]
pub enum LiveClientError {
    #[error("Invalid live endpoint URL: {0}")]
    InvalidUrl(String),

    /// Failed to establish the WebSocket connection.
    #[error("Connection error: {0}")]
    Connection(String),
}
