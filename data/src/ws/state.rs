//! Connection state machine (spec §4.12).
//!
//! ```text
//! DISCONNECTED --connect()--> CONNECTING --handshake ok--> CONNECTED
//! CONNECTED --close()--> DISCONNECTING --> DISCONNECTED
//! CONNECTING --handshake err--> ERROR --schedule retry--> RECONNECTING --> CONNECTING
//! CONNECTED --read/write err--> ERROR --schedule retry--> RECONNECTING --> CONNECTING
//! DISCONNECTING --read/write err--> ERROR --schedule retry--> RECONNECTING --> CONNECTING
//! DISCONNECTED --schedule retry--> RECONNECTING --> CONNECTING
//! RECONNECTING --attempts exhausted--> DISCONNECTED (connection removed)
//! ```
//!
//! Every edge not drawn above is invalid; attempting it forces `ERROR`
//! instead of the requested state (spec §4.12, testable property #9).

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
    Error,
    Reconnecting,
}

impl ConnectionState {
    /// Healthiness is a property of [`ConnectionMeta`] (it also depends
    /// on ping/message freshness, spec §4.12), not of the state alone —
    /// this only answers "is the link at least nominally up".
    pub fn is_healthy(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// Whether `self -> to` is an edge in the spec §4.12 transition
    /// table. `ERROR` is reachable from every transient (non-resting)
    /// state; `RECONNECTING` is reachable from `ERROR` or
    /// `DISCONNECTED`.
    fn allows(&self, to: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, to),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connected, Disconnecting)
                | (Disconnecting, Disconnected)
                | (Connecting, Error)
                | (Connected, Error)
                | (Disconnecting, Error)
                | (Reconnecting, Error)
                | (Error, Reconnecting)
                | (Disconnected, Reconnecting)
                | (Reconnecting, Connecting)
                | (Reconnecting, Disconnected)
        )
    }
}

/// Per-connection metadata (spec §4.12): ping/message freshness for
/// `is_healthy()`, byte counters and attempt counts for observability.
#[derive(Debug, Clone)]
pub struct ConnectionMeta {
    pub id: String,
    pub url: String,
    pub state: ConnectionState,
    pub connected_at: Option<DateTime<Utc>>,
    pub last_ping_time: Option<DateTime<Utc>>,
    pub last_message_time: Option<DateTime<Utc>>,
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub reconnect_attempts: u32,
    pub connection_attempt_count: u32,
    pub last_error: Option<String>,
}

/// `is_healthy()` freshness windows (spec §4.12).
const PING_FRESHNESS: chrono::Duration = chrono::Duration::seconds(60);
const MESSAGE_FRESHNESS: chrono::Duration = chrono::Duration::seconds(120);

impl ConnectionMeta {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            state: ConnectionState::Disconnected,
            connected_at: None,
            last_ping_time: None,
            last_message_time: None,
            bytes_received: 0,
            bytes_sent: 0,
            reconnect_attempts: 0,
            connection_attempt_count: 0,
            last_error: None,
        }
    }

    /// `is_healthy()` = `CONNECTED && last_ping within 60s && last_message
    /// within 120s` (spec §4.12) — a socket that is nominally `Connected`
    /// but has gone quiet is not healthy.
    pub fn is_healthy(&self) -> bool {
        if !self.state.is_healthy() {
            return false;
        }
        let now = Utc::now();
        let ping_fresh = self.last_ping_time.is_some_and(|t| now - t <= PING_FRESHNESS);
        let message_fresh = self.last_message_time.is_some_and(|t| now - t <= MESSAGE_FRESHNESS);
        ping_fresh && message_fresh
    }

    /// Records a heartbeat/pong, refreshing the ping-freshness window.
    pub fn record_ping(&mut self) {
        self.last_ping_time = Some(Utc::now());
    }

    /// Records an inbound frame, refreshing the message-freshness window
    /// and the received-bytes counter.
    pub fn record_message(&mut self, bytes: u64) {
        self.last_message_time = Some(Utc::now());
        self.bytes_received += bytes;
    }

    /// Records an outbound frame's byte count.
    pub fn record_sent(&mut self, bytes: u64) {
        self.bytes_sent += bytes;
    }

    /// Applies `requested` if it is a valid edge from the current state;
    /// otherwise forces `ERROR` (spec §4.12 "invalid transition attempts
    /// force ERROR", testable property #9). Returns the state actually
    /// entered.
    fn transition(&mut self, requested: ConnectionState) -> ConnectionState {
        let next = if self.state.allows(requested) {
            requested
        } else {
            if requested != ConnectionState::Error {
                self.last_error = Some(format!(
                    "invalid transition {:?} -> {:?}; forced to Error",
                    self.state, requested
                ));
            }
            ConnectionState::Error
        };
        self.state = next;
        next
    }

    pub fn mark_connecting(&mut self) {
        if self.transition(ConnectionState::Connecting) == ConnectionState::Connecting {
            self.connection_attempt_count += 1;
        }
    }

    pub fn mark_connected(&mut self) {
        if self.transition(ConnectionState::Connected) == ConnectionState::Connected {
            self.connected_at = Some(Utc::now());
            self.last_ping_time = Some(Utc::now());
            self.last_message_time = Some(Utc::now());
            self.reconnect_attempts = 0;
            self.last_error = None;
        }
    }

    pub fn mark_disconnecting(&mut self) {
        self.transition(ConnectionState::Disconnecting);
    }

    pub fn mark_disconnected(&mut self) {
        if self.transition(ConnectionState::Disconnected) == ConnectionState::Disconnected {
            self.connected_at = None;
        }
    }

    pub fn mark_error(&mut self, error: impl Into<String>) {
        self.transition(ConnectionState::Error);
        self.last_error = Some(error.into());
        self.connected_at = None;
    }

    pub fn mark_reconnecting(&mut self) {
        if self.transition(ConnectionState::Reconnecting) == ConnectionState::Reconnecting {
            self.reconnect_attempts += 1;
        }
    }
}

/// Exponential backoff, capped at 10 attempts (spec §4.12): after the
/// 10th failed attempt the connection is removed from the pool rather
/// than retried indefinitely.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 10;

const INITIAL_BACKOFF_MS: u64 = 1_000;
const MAX_BACKOFF_MS: u64 = 60_000;

/// 1s, doubling each attempt, capped at 60s (spec §4.12).
pub fn backoff_delay_ms(attempt: u32) -> u64 {
    let shift = attempt.saturating_sub(1).min(6);
    (INITIAL_BACKOFF_MS.saturating_mul(1u64 << shift)).min(MAX_BACKOFF_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_then_plateaus() {
        let d1 = backoff_delay_ms(1);
        let d2 = backoff_delay_ms(2);
        let d10 = backoff_delay_ms(10);
        let d20 = backoff_delay_ms(20);
        assert!(d2 > d1);
        assert_eq!(d10, d20, "attempts beyond the cap shouldn't keep growing");
    }

    #[test]
    fn fresh_connection_starts_disconnected_and_unhealthy() {
        let meta = ConnectionMeta::new("binance-spot-0", "wss://example.invalid");
        assert_eq!(meta.state, ConnectionState::Disconnected);
        assert!(!meta.is_healthy());
    }

    #[test]
    fn connect_then_error_then_reconnect_cycle() {
        let mut meta = ConnectionMeta::new("c1", "wss://example.invalid");
        meta.mark_connecting();
        assert_eq!(meta.state, ConnectionState::Connecting);
        meta.mark_connected();
        assert!(meta.is_healthy());

        meta.mark_error("socket reset");
        assert!(!meta.is_healthy());
        assert_eq!(meta.last_error.as_deref(), Some("socket reset"));

        meta.mark_reconnecting();
        assert_eq!(meta.reconnect_attempts, 1);
        meta.mark_connecting();
        meta.mark_connected();
        assert_eq!(meta.reconnect_attempts, 0, "a successful connect resets the counter");
    }

    #[test]
    fn invalid_transition_is_forced_to_error() {
        // DISCONNECTED -> CONNECTED is not an edge in the spec §4.12
        // table (must pass through CONNECTING); the attempt must land
        // in ERROR, not silently succeed.
        let mut meta = ConnectionMeta::new("c1", "wss://example.invalid");
        assert_eq!(meta.state, ConnectionState::Disconnected);
        meta.mark_connected();
        assert_eq!(meta.state, ConnectionState::Error);
        assert!(meta.last_error.is_some());
    }

    #[test]
    fn every_transition_not_in_the_table_routes_to_error() {
        // CONNECTED -> CONNECTING is not an edge either.
        let mut meta = ConnectionMeta::new("c1", "wss://example.invalid");
        meta.mark_connecting();
        meta.mark_connected();
        assert_eq!(meta.state, ConnectionState::Connected);
        meta.mark_connecting();
        assert_eq!(meta.state, ConnectionState::Error);

        // DISCONNECTING -> CONNECTED is not an edge.
        let mut meta = ConnectionMeta::new("c2", "wss://example.invalid");
        meta.mark_connecting();
        meta.mark_connected();
        meta.mark_disconnecting();
        assert_eq!(meta.state, ConnectionState::Disconnecting);
        meta.mark_connected();
        assert_eq!(meta.state, ConnectionState::Error);
    }

    #[test]
    fn connected_but_stale_ping_is_unhealthy() {
        let mut meta = ConnectionMeta::new("c1", "wss://example.invalid");
        meta.mark_connecting();
        meta.mark_connected();
        assert!(meta.is_healthy());

        meta.last_ping_time = Some(Utc::now() - chrono::Duration::seconds(61));
        assert!(!meta.is_healthy(), "ping older than 60s must be unhealthy");
    }

    #[test]
    fn connected_but_stale_message_is_unhealthy() {
        let mut meta = ConnectionMeta::new("c1", "wss://example.invalid");
        meta.mark_connecting();
        meta.mark_connected();
        assert!(meta.is_healthy());

        meta.last_message_time = Some(Utc::now() - chrono::Duration::seconds(121));
        assert!(!meta.is_healthy(), "message older than 120s must be unhealthy");
    }

    #[test]
    fn never_connected_is_unhealthy_even_if_state_is_somehow_connected() {
        let meta = ConnectionMeta::new("c1", "wss://example.invalid");
        assert!(!meta.is_healthy());
    }

    #[test]
    fn connection_attempt_count_tracks_every_connecting_transition() {
        let mut meta = ConnectionMeta::new("c1", "wss://example.invalid");
        meta.mark_connecting();
        assert_eq!(meta.connection_attempt_count, 1);
        meta.mark_connected();
        meta.mark_error("reset");
        meta.mark_reconnecting();
        meta.mark_connecting();
        assert_eq!(meta.connection_attempt_count, 2);
    }

    #[test]
    fn byte_and_message_counters_accumulate() {
        let mut meta = ConnectionMeta::new("c1", "wss://example.invalid");
        meta.mark_connecting();
        meta.mark_connected();
        meta.record_message(128);
        meta.record_message(64);
        meta.record_sent(32);
        meta.record_ping();
        assert_eq!(meta.bytes_received, 192);
        assert_eq!(meta.bytes_sent, 32);
        assert!(meta.last_ping_time.is_some());
    }
}
