//! Wire protocols: signed HTTP/REST and raw WebSocket framing.

pub mod http;
pub mod websocket;
