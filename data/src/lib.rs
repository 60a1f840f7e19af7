#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! # Data — price cache and WebSocket connection pool
//!
//! Owns the two pieces of market-data plumbing shared by every
//! exchange adapter: the TTL price cache (component C4) that the
//! quantity calculator and order execution paths read from, and the
//! WebSocket connection pool (component C12) that keeps public price
//! feeds and the per-account fill feed alive.
//!
//! This crate deliberately does not depend on `conduit-execution`: the
//! price cache's API fallback is expressed as the [`price_cache::TickerSource`]
//! trait, implemented by whatever owns exchange connectivity.

pub mod price_cache;
pub mod ws;

pub use price_cache::{PriceCache, PriceDetails, PriceKey, PriceSource, TickerSource};
pub use ws::{
    feed_price_cache, BinanceDataNormalizer, BybitDataNormalizer, ConnectionState, DataNormalizer,
    PriceQuote, WsPool,
};
