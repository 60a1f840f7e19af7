//! Price Cache (spec §4.4, component C4).
//!
//! TTL-keyed cache of last-known prices. Reads prefer the cache; on a
//! miss or stale entry (and when `fallback_to_api=true`) the caller's
//! [`TickerSource`] (normally an `ExchangeAdapter::fetch_ticker`) is
//! consulted and the result is written back. The public WebSocket price
//! feed (crate `conduit-data::ws`) eagerly repopulates entries as
//! quotes arrive, so in steady state most reads never fall back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use conduit_markets::{ExchangeId, MarketType};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::{collections::HashMap, sync::Arc, time::Duration};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PriceKey {
    pub exchange: ExchangeId,
    pub market: MarketType,
    pub symbol: String,
}

impl PriceKey {
    pub fn new(exchange: ExchangeId, market: MarketType, symbol: impl Into<String>) -> Self {
        Self {
            exchange,
            market,
            symbol: symbol.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    Cache,
    Api,
    WebSocket,
}

#[derive(Debug, Clone, Copy)]
pub struct PriceDetails {
    pub price: Decimal,
    pub source: PriceSource,
    pub age_seconds: f64,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    price: Decimal,
    source: PriceSource,
    recorded_at: DateTime<Utc>,
}

/// Fetches a last-trade/ticker price when the cache can't satisfy a
/// request on its own. Implemented by whatever owns exchange
/// connectivity (crate `conduit-execution`'s adapters); kept as a trait
/// here so `conduit-data` never depends on `conduit-execution`.
#[async_trait]
pub trait TickerSource: Send + Sync {
    async fn fetch_ticker(&self, key: &PriceKey) -> Option<Decimal>;
}

#[derive(Debug)]
pub struct PriceCache {
    ttl: Duration,
    entries: RwLock<HashMap<PriceKey, Entry>>,
}

impl PriceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Called by the public WebSocket price feed as quotes arrive —
    /// lock-free-for-readers: writers take a short write lock, readers
    /// otherwise only ever read (spec §5 "Price cache: lock-free read
    /// via immutable snapshots per key; writers CAS the entry" — modeled
    /// here with a short-lived write lock rather than a literal CAS,
    /// since `parking_lot::RwLock` already gives readers an
    /// uncontended fast path and this system has no single hot key
    /// contended enough to need true lock-free CAS).
    pub fn put(&self, key: PriceKey, price: Decimal, source: PriceSource) {
        self.entries.write().insert(
            key,
            Entry {
                price,
                source,
                recorded_at: Utc::now(),
            },
        );
    }

    fn read_fresh(&self, key: &PriceKey) -> Option<PriceDetails> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        let age = Utc::now().signed_duration_since(entry.recorded_at);
        let age_seconds = age.num_milliseconds() as f64 / 1000.0;
        if age_seconds < 0.0 || age.to_std().unwrap_or(Duration::MAX) > self.ttl {
            return None;
        }
        Some(PriceDetails {
            price: entry.price,
            source: entry.source,
            age_seconds,
        })
    }

    /// `get_price(..., fallback_to_api)` (spec §4.4): serves the cache
    /// when fresh, otherwise calls `source.fetch_ticker` (if
    /// `fallback_to_api`) and populates the cache with the result.
    pub async fn get_price(
        &self,
        key: &PriceKey,
        fallback_to_api: bool,
        source: &Arc<dyn TickerSource>,
    ) -> Option<PriceDetails> {
        if let Some(details) = self.read_fresh(key) {
            return Some(details);
        }
        if !fallback_to_api {
            return None;
        }
        let price = source.fetch_ticker(key).await?;
        self.put(key.clone(), price, PriceSource::Api);
        Some(PriceDetails {
            price,
            source: PriceSource::Api,
            age_seconds: 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    struct AlwaysReturns(Decimal);

    #[async_trait]
    impl TickerSource for AlwaysReturns {
        async fn fetch_ticker(&self, _key: &PriceKey) -> Option<Decimal> {
            Some(self.0)
        }
    }

    struct NeverReturns;

    #[async_trait]
    impl TickerSource for NeverReturns {
        async fn fetch_ticker(&self, _key: &PriceKey) -> Option<Decimal> {
            None
        }
    }

    fn key() -> PriceKey {
        PriceKey::new(ExchangeId::Binance, MarketType::Spot, "BTC/USDT")
    }

    #[tokio::test]
    async fn serves_a_fresh_cached_value_without_calling_the_fallback() {
        let cache = PriceCache::new(Duration::from_secs(5));
        cache.put(key(), dec!(50000), PriceSource::WebSocket);

        let source: Arc<dyn TickerSource> = Arc::new(NeverReturns);
        let details = cache.get_price(&key(), true, &source).await.unwrap();
        assert_eq!(details.price, dec!(50000));
        assert_eq!(details.source, PriceSource::WebSocket);
    }

    #[tokio::test]
    async fn falls_back_to_api_on_miss_when_allowed() {
        let cache = PriceCache::new(Duration::from_secs(5));
        let source: Arc<dyn TickerSource> = Arc::new(AlwaysReturns(dec!(123)));
        let details = cache.get_price(&key(), true, &source).await.unwrap();
        assert_eq!(details.price, dec!(123));
        assert_eq!(details.source, PriceSource::Api);
    }

    #[tokio::test]
    async fn miss_without_fallback_returns_none() {
        let cache = PriceCache::new(Duration::from_secs(5));
        let source: Arc<dyn TickerSource> = Arc::new(AlwaysReturns(dec!(123)));
        assert!(cache.get_price(&key(), false, &source).await.is_none());
    }

    #[tokio::test]
    async fn expired_entry_is_treated_as_a_miss() {
        let cache = PriceCache::new(Duration::from_millis(1));
        cache.put(key(), dec!(999), PriceSource::Api);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let source: Arc<dyn TickerSource> = Arc::new(AlwaysReturns(dec!(5)));
        let details = cache.get_price(&key(), true, &source).await.unwrap();
        assert_eq!(details.price, dec!(5));
    }
}
