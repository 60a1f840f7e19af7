#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::too_many_arguments)]

//! # Integration — connectivity primitives
//!
//! Low-level, protocol-agnostic glue every concrete [`ExchangeAdapter`]
//! (crate `conduit-execution`) and the WebSocket Pool (crate
//! `conduit-data`) build on: signed REST requests, a pluggable rate
//! limiter, a thin WebSocket connect helper, and the Server-Sent Events
//! wire format the Event Emitter (C10) serializes into.
//!
//! Nothing in this crate knows about strategies, accounts or orders —
//! it is the same kind of "translate raw bytes on the wire into/out of
//! a typed model" layer the teacher framework calls its `integration`
//! crate, scoped down to what this system's adapters actually need.

pub mod collection;
pub mod error;
pub mod rate_limit;
pub mod protocol;
pub mod sse;

pub use error::SocketError;
pub use rate_limit::RateLimiter;
