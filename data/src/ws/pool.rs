//! WebSocket Pool (spec §4.12, component C12).
//!
//! Two independent registries, each behind its own lock, per spec §5's
//! separation of concerns: the connection registry (one entry per
//! socket, state-machine driven) and the subscription registry
//! (refcounted topic interest, so two strategies quoting the same
//! symbol share one upstream subscription and unsubscribing one
//! doesn't drop the feed for the other).

use crate::ws::state::{backoff_delay_ms, ConnectionMeta, ConnectionState, MAX_RECONNECT_ATTEMPTS};
use conduit_integration::{
    collection::FnvIndexMap,
    error::SocketError,
    protocol::websocket::{self, WsStream},
};
use parking_lot::RwLock;
use std::time::Duration;
use tracing::{info, warn};

pub type ConnectionId = String;

#[derive(Debug)]
pub struct WsPool {
    connections: RwLock<FnvIndexMap<ConnectionId, ConnectionMeta>>,
    subscriptions: RwLock<FnvIndexMap<String, u32>>,
}

impl Default for WsPool {
    fn default() -> Self {
        Self::new()
    }
}

impl WsPool {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(FnvIndexMap::default()),
            subscriptions: RwLock::new(FnvIndexMap::default()),
        }
    }

    /// Dials `url` and, only on a successful handshake, registers the
    /// connection under `id`. A failed dial never creates a ghost entry
    /// in the registry (spec §4.12).
    pub async fn connect(&self, id: impl Into<String>, url: impl Into<String>) -> Result<WsStream, SocketError> {
        let id = id.into();
        let url = url.into();
        let stream = websocket::connect(&url).await?;

        let mut meta = ConnectionMeta::new(id.clone(), url);
        meta.mark_connecting();
        meta.mark_connected();
        self.connections.write().insert(id, meta);
        Ok(stream)
    }

    /// Runs the reconnect policy after a live connection breaks:
    /// exponential backoff, capped at [`MAX_RECONNECT_ATTEMPTS`], after
    /// which the entry is removed from the registry rather than retried
    /// forever.
    pub async fn reconnect_with_backoff<F, Fut>(&self, id: &str, mut dial: F)
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<WsStream, SocketError>>,
    {
        // `RECONNECTING` is only reachable from `ERROR` or `DISCONNECTED`
        // (spec §4.12); a caller invoking this after some other kind of
        // break (e.g. a still-`CONNECTED` socket whose health check
        // failed) first routes through `ERROR` so the loop below's
        // `mark_reconnecting()` is always a valid transition.
        {
            let mut connections = self.connections.write();
            if let Some(meta) = connections.get_mut(id) {
                if !matches!(
                    meta.state,
                    ConnectionState::Error | ConnectionState::Disconnected | ConnectionState::Reconnecting
                ) {
                    meta.mark_error("connection lost, entering reconnect loop");
                }
            }
        }

        loop {
            let attempt = {
                let mut connections = self.connections.write();
                let Some(meta) = connections.get_mut(id) else {
                    return;
                };
                meta.mark_reconnecting();
                meta.reconnect_attempts
            };

            if attempt > MAX_RECONNECT_ATTEMPTS {
                warn!(connection = id, "giving up after exhausting reconnect attempts");
                self.connections.write().shift_remove(id);
                return;
            }

            tokio::time::sleep(Duration::from_millis(backoff_delay_ms(attempt))).await;

            match dial().await {
                Ok(_stream) => {
                    if let Some(meta) = self.connections.write().get_mut(id) {
                        meta.mark_connected();
                    }
                    info!(connection = id, attempt, "reconnected");
                    return;
                }
                Err(err) => {
                    if let Some(meta) = self.connections.write().get_mut(id) {
                        meta.mark_error(err.to_string());
                    }
                }
            }
        }
    }

    pub fn mark_disconnecting(&self, id: &str) {
        if let Some(meta) = self.connections.write().get_mut(id) {
            meta.mark_disconnecting();
        }
    }

    pub fn mark_disconnected(&self, id: &str) {
        if let Some(meta) = self.connections.write().get_mut(id) {
            meta.mark_disconnected();
        }
    }

    pub fn mark_error(&self, id: &str, error: impl Into<String>) {
        if let Some(meta) = self.connections.write().get_mut(id) {
            meta.mark_error(error);
        }
    }

    pub fn is_healthy(&self, id: &str) -> bool {
        self.connections
            .read()
            .get(id)
            .map(ConnectionMeta::is_healthy)
            .unwrap_or(false)
    }

    pub fn state(&self, id: &str) -> Option<ConnectionState> {
        self.connections.read().get(id).map(|meta| meta.state)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.read().len()
    }

    pub fn healthy_count(&self) -> usize {
        self.connections
            .read()
            .values()
            .filter(|meta| meta.is_healthy())
            .count()
    }

    /// Increments the refcount for `topic`, returning `true` if this is
    /// the first subscriber (caller must actually send the upstream
    /// subscribe message in that case).
    pub fn subscribe(&self, topic: impl Into<String>) -> bool {
        let mut subs = self.subscriptions.write();
        let topic = topic.into();
        match subs.get_mut(&topic) {
            Some(count) => {
                *count += 1;
                false
            }
            None => {
                subs.insert(topic, 1);
                true
            }
        }
    }

    /// Decrements the refcount for `topic`, returning `true` if it just
    /// dropped to zero (caller must send the upstream unsubscribe
    /// message in that case).
    pub fn unsubscribe(&self, topic: &str) -> bool {
        let mut subs = self.subscriptions.write();
        let Some(count) = subs.get_mut(topic) else {
            return false;
        };
        *count -= 1;
        if *count == 0 {
            subs.shift_remove(topic);
            true
        } else {
            false
        }
    }

    pub fn subscriber_count(&self, topic: &str) -> u32 {
        self.subscriptions.read().get(topic).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_subscriber_triggers_upstream_subscribe() {
        let pool = WsPool::new();
        assert!(pool.subscribe("binance:spot:BTCUSDT"));
        assert!(!pool.subscribe("binance:spot:BTCUSDT"));
        assert_eq!(pool.subscriber_count("binance:spot:BTCUSDT"), 2);
    }

    #[test]
    fn last_unsubscribe_triggers_upstream_unsubscribe() {
        let pool = WsPool::new();
        pool.subscribe("binance:spot:BTCUSDT");
        pool.subscribe("binance:spot:BTCUSDT");
        assert!(!pool.unsubscribe("binance:spot:BTCUSDT"));
        assert!(pool.unsubscribe("binance:spot:BTCUSDT"));
        assert_eq!(pool.subscriber_count("binance:spot:BTCUSDT"), 0);
    }

    #[test]
    fn unknown_connection_reports_unhealthy() {
        let pool = WsPool::new();
        assert!(!pool.is_healthy("nope"));
        assert!(pool.state("nope").is_none());
    }

    #[tokio::test]
    async fn failed_dial_never_registers_a_ghost_connection() {
        let pool = WsPool::new();
        let err = pool.connect("c1", "ws://127.0.0.1:1").await;
        assert!(err.is_err());
        assert_eq!(pool.connection_count(), 0);
    }
}
