//! Thin wrapper over `tokio-tungstenite`. The WebSocket Pool (crate
//! `conduit-data`, component C12) owns connection state/reconnect
//! policy; this module only knows how to open a socket and frame
//! messages.

use crate::error::SocketError;
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::{
    connect_async,
    tungstenite::Message as TungsteniteMessage,
    MaybeTlsStream, WebSocketStream,
};

pub type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

#[derive(Debug, Clone)]
pub enum WsMessage {
    Text(String),
    Binary(Vec<u8>),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close,
}

impl From<TungsteniteMessage> for WsMessage {
    fn from(value: TungsteniteMessage) -> Self {
        match value {
            TungsteniteMessage::Text(t) => WsMessage::Text(t.to_string()),
            TungsteniteMessage::Binary(b) => WsMessage::Binary(b.to_vec()),
            TungsteniteMessage::Ping(p) => WsMessage::Ping(p.to_vec()),
            TungsteniteMessage::Pong(p) => WsMessage::Pong(p.to_vec()),
            TungsteniteMessage::Close(_) => WsMessage::Close,
            TungsteniteMessage::Frame(_) => WsMessage::Close,
        }
    }
}

impl From<WsMessage> for TungsteniteMessage {
    fn from(value: WsMessage) -> Self {
        match value {
            WsMessage::Text(t) => TungsteniteMessage::Text(t.into()),
            WsMessage::Binary(b) => TungsteniteMessage::Binary(b.into()),
            WsMessage::Ping(p) => TungsteniteMessage::Ping(p.into()),
            WsMessage::Pong(p) => TungsteniteMessage::Pong(p.into()),
            WsMessage::Close => TungsteniteMessage::Close(None),
        }
    }
}

/// Opens a WebSocket connection. Callers (the WebSocket Pool) are
/// responsible for registering the connection only *after* this
/// succeeds (spec §4.12's "register only after the handshake succeeds"
/// invariant) — this function has no side effect on any registry.
pub async fn connect(url: &str) -> Result<WsStream, SocketError> {
    let (stream, _response) = connect_async(url)
        .await
        .map_err(|e| SocketError::WebSocketConnect(e.to_string()))?;
    Ok(stream)
}

pub async fn send(stream: &mut WsStream, message: WsMessage) -> Result<(), SocketError> {
    stream
        .send(message.into())
        .await
        .map_err(|e| SocketError::WebSocketConnect(e.to_string()))
}

pub async fn recv(stream: &mut WsStream) -> Option<Result<WsMessage, SocketError>> {
    stream.next().await.map(|result| {
        result
            .map(WsMessage::from)
            .map_err(|e| SocketError::WebSocketConnect(e.to_string()))
    })
}
