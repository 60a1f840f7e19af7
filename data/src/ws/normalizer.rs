//! Per-exchange normalization of raw WebSocket payloads into the one
//! quote type the rest of the system understands (spec §4.12's "Data
//! Normalizer (strategy pattern, one implementation per exchange)").
//! Grounded on `original_source/.../services/websocket/data_normalizers.py`,
//! which defines exactly this strategy-pattern split: one normalizer per
//! exchange, each recognising its own frame shape and returning `None`
//! for anything else (subscription acks, heartbeats, other topics).

use crate::price_cache::{PriceCache, PriceKey, PriceSource};
use chrono::{DateTime, Utc};
use conduit_markets::{ExchangeId, MarketType};
use rust_decimal::Decimal;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct PriceQuote {
    pub exchange: ExchangeId,
    pub market: MarketType,
    pub symbol: String,
    pub price: Decimal,
    pub observed_at: DateTime<Utc>,
    pub volume: Option<Decimal>,
    pub change_24h: Option<Decimal>,
}

/// Implemented once per exchange's public market-data feed. Kept
/// separate from the private per-account fill feed, which is consumed
/// directly by the execution crate's order manager rather than feeding
/// the price cache (spec §4.12: "a dedicated per-account fill feed
/// bypasses the MARKET-order polling path").
pub trait DataNormalizer: Send + Sync + std::fmt::Debug {
    fn exchange(&self) -> ExchangeId;

    /// Parses one raw text frame, if it carries a price update.
    /// Anything else (subscription acks, heartbeats) returns `None`.
    fn normalize(&self, raw: &str) -> Option<PriceQuote>;
}

/// Writes a freshly-normalized quote into the price cache (spec §4.4:
/// "Cache is eagerly repopulated by the WebSocket price feed"). The
/// caller loops this over every inbound frame on the public price
/// socket for each subscribed normalizer.
pub fn feed_price_cache(cache: &PriceCache, quote: &PriceQuote) {
    let key = PriceKey::new(quote.exchange, quote.market, quote.symbol.clone());
    cache.put(key, quote.price, PriceSource::WebSocket);
}

fn parse_decimal(value: Option<&Value>) -> Option<Decimal> {
    value.and_then(Value::as_str).and_then(|s| s.parse::<Decimal>().ok())
}

/// Binance public `24hrTicker` stream frame, e.g.
/// `{"e":"24hrTicker","s":"BTCUSDT","c":"50123.45","E":1700000000000,"v":"1234.5","P":"1.23"}`.
/// Grounded on `BinanceDataNormalizer.normalize` in
/// `original_source/.../data_normalizers.py`: recognise the event type,
/// parse price/volume/change as numeric strings (Binance sends them as
/// JSON strings, not numbers), fall back to the local clock if the
/// venue's event timestamp is absent. Any parse failure is a `None`,
/// mirroring the original's `except (ValueError, TypeError, KeyError)`.
#[derive(Debug, Default)]
pub struct BinanceDataNormalizer;

impl DataNormalizer for BinanceDataNormalizer {
    fn exchange(&self) -> ExchangeId {
        ExchangeId::Binance
    }

    fn normalize(&self, raw: &str) -> Option<PriceQuote> {
        let frame: Value = serde_json::from_str(raw).ok()?;
        if frame.get("e").and_then(Value::as_str) != Some("24hrTicker") {
            return None;
        }
        let symbol = frame.get("s").and_then(Value::as_str)?.to_string();
        let price = parse_decimal(frame.get("c"))?;
        let observed_at = frame
            .get("E")
            .and_then(Value::as_i64)
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or_else(Utc::now);

        Some(PriceQuote {
            exchange: ExchangeId::Binance,
            market: MarketType::Spot,
            symbol,
            price,
            observed_at,
            volume: parse_decimal(frame.get("v")),
            change_24h: parse_decimal(frame.get("P")),
        })
    }
}

/// Bybit public `tickers` topic frame, e.g.
/// `{"topic":"tickers","data":[{"symbol":"BTCUSDT","lastPrice":"50123.45","volume24h":"999.1","turnover24h":"12345678.9"}]}`.
/// Grounded on `BybitDataNormalizer.normalize`: Bybit's linear/spot
/// ticker push wraps the payload in a one-element array (or, for some
/// topics, a bare object); both shapes are accepted. Bybit carries no
/// per-tick timestamp in this payload, so (as the original does) the
/// quote is stamped with the local clock.
#[derive(Debug, Default)]
pub struct BybitDataNormalizer;

impl DataNormalizer for BybitDataNormalizer {
    fn exchange(&self) -> ExchangeId {
        ExchangeId::Bybit
    }

    fn normalize(&self, raw: &str) -> Option<PriceQuote> {
        let frame: Value = serde_json::from_str(raw).ok()?;
        if frame.get("topic").and_then(Value::as_str) != Some("tickers") {
            return None;
        }
        let data = frame.get("data")?;
        let item = match data {
            Value::Array(items) => items.first()?,
            other => other,
        };
        let symbol = item.get("symbol").and_then(Value::as_str)?.to_string();
        let price = parse_decimal(item.get("lastPrice"))?;

        Some(PriceQuote {
            exchange: ExchangeId::Bybit,
            market: MarketType::Spot,
            symbol,
            price,
            observed_at: Utc::now(),
            volume: parse_decimal(item.get("volume24h")),
            change_24h: parse_decimal(item.get("turnover24h")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn binance_normalizes_a_24hr_ticker_frame() {
        let normalizer = BinanceDataNormalizer;
        let raw = r#"{"e":"24hrTicker","s":"BTCUSDT","c":"50123.45","E":1700000000000,"v":"1234.5","P":"1.23"}"#;
        let quote = normalizer.normalize(raw).expect("valid frame");
        assert_eq!(quote.exchange, ExchangeId::Binance);
        assert_eq!(quote.symbol, "BTCUSDT");
        assert_eq!(quote.price, "50123.45".parse::<Decimal>().unwrap());
        assert_eq!(quote.volume, Some("1234.5".parse::<Decimal>().unwrap()));
        assert_eq!(quote.change_24h, Some("1.23".parse::<Decimal>().unwrap()));
    }

    #[test]
    fn binance_ignores_non_ticker_frames() {
        let normalizer = BinanceDataNormalizer;
        assert!(normalizer.normalize(r#"{"e":"aggTrade","s":"BTCUSDT"}"#).is_none());
        assert!(normalizer.normalize("not json").is_none());
    }

    #[test]
    fn bybit_normalizes_an_array_wrapped_ticker_frame() {
        let normalizer = BybitDataNormalizer;
        let raw = r#"{"topic":"tickers","data":[{"symbol":"BTCUSDT","lastPrice":"50200.10","volume24h":"999.1","turnover24h":"12345678.9"}]}"#;
        let quote = normalizer.normalize(raw).expect("valid frame");
        assert_eq!(quote.exchange, ExchangeId::Bybit);
        assert_eq!(quote.symbol, "BTCUSDT");
        assert_eq!(quote.price, "50200.10".parse::<Decimal>().unwrap());
    }

    #[test]
    fn bybit_ignores_other_topics() {
        let normalizer = BybitDataNormalizer;
        assert!(normalizer
            .normalize(r#"{"topic":"orderbook.1.BTCUSDT","data":{}}"#)
            .is_none());
    }

    #[tokio::test]
    async fn normalized_quote_feeds_the_price_cache() {
        use crate::price_cache::TickerSource;
        use async_trait::async_trait;
        use std::sync::Arc;

        struct NeverReturns;
        #[async_trait]
        impl TickerSource for NeverReturns {
            async fn fetch_ticker(&self, _key: &PriceKey) -> Option<Decimal> {
                None
            }
        }

        let cache = PriceCache::new(Duration::from_secs(30));
        let normalizer = BinanceDataNormalizer;
        let raw = r#"{"e":"24hrTicker","s":"BTCUSDT","c":"50123.45","E":1700000000000}"#;
        let quote = normalizer.normalize(raw).expect("valid frame");
        feed_price_cache(&cache, &quote);

        let key = PriceKey::new(ExchangeId::Binance, MarketType::Spot, "BTCUSDT");
        let source: Arc<dyn TickerSource> = Arc::new(NeverReturns);
        let details = cache
            .get_price(&key, false, &source)
            .await
            .expect("normalizer must have populated the cache");
        assert_eq!(details.price, quote.price);
        assert_eq!(details.source, PriceSource::WebSocket);
    }
}
