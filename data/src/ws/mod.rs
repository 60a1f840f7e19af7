//! WebSocket Pool (spec §4.12, component C12): connection state
//! machine, reconnect policy, and refcounted subscriptions.

pub mod normalizer;
pub mod pool;
pub mod state;

pub use normalizer::{feed_price_cache, BinanceDataNormalizer, BybitDataNormalizer, DataNormalizer, PriceQuote};
pub use pool::{ConnectionId, WsPool};
pub use state::{ConnectionMeta, ConnectionState};
