//! Transport-level errors shared by REST and WebSocket connectivity.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SocketError {
    #[error("failed to build request: {0}")]
    BuildRequest(String),

    #[error("http transport error: {0}")]
    Http(String),

    #[error("failed to (de)serialize payload: {0}")]
    Serialization(String),

    #[error("websocket connect failed: {0}")]
    WebSocketConnect(String),

    #[error("websocket closed")]
    WebSocketClosed,

    #[error("rate limited: retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("request to {exchange} timed out after {elapsed_ms}ms")]
    Timeout { exchange: String, elapsed_ms: u64 },
}

impl From<reqwest::Error> for SocketError {
    fn from(value: reqwest::Error) -> Self {
        SocketError::Http(value.to_string())
    }
}

impl From<serde_json::Error> for SocketError {
    fn from(value: serde_json::Error) -> Self {
        SocketError::Serialization(value.to_string())
    }
}
