//! Pluggable per-`(account, venue)` rate limiting (spec §4.2: "Every
//! call is rate-limited per (account, venue) with a pluggable limiter").

use async_trait::async_trait;
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

/// A rate limiter keyed by an opaque string (`"{account_id}:{exchange}"`
/// in practice). `acquire` resolves once a slot is available; it never
/// fails — backpressure, not rejection, matching the teacher's
/// transport-layer pattern of await-then-proceed.
#[async_trait]
pub trait RateLimiter: Send + Sync + std::fmt::Debug {
    async fn acquire(&self, key: &str);
}

/// Token-bucket limiter: `capacity` tokens, refilled continuously at
/// `refill_per_sec`. One bucket per key, created lazily.
#[derive(Debug)]
pub struct TokenBucketLimiter {
    capacity: f64,
    refill_per_sec: f64,
    buckets: Mutex<HashMap<String, Bucket>>,
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucketLimiter {
    pub fn new(capacity: u32, refill_per_sec: u32) -> Self {
        Self {
            capacity: capacity as f64,
            refill_per_sec: refill_per_sec as f64,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `Some(wait)` if the caller must sleep `wait` before a
    /// token is available, consuming one token either way once ready.
    fn try_consume(&self, key: &str) -> Option<Duration> {
        let mut buckets = self.buckets.lock();
        let now = Instant::now();
        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            tokens: self.capacity,
            last_refill: now,
        });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            None
        } else {
            let deficit = 1.0 - bucket.tokens;
            bucket.tokens = 0.0;
            Some(Duration::from_secs_f64(deficit / self.refill_per_sec))
        }
    }
}

#[async_trait]
impl RateLimiter for TokenBucketLimiter {
    async fn acquire(&self, key: &str) {
        if let Some(wait) = self.try_consume(key) {
            tokio::time::sleep(wait).await;
        }
    }
}

/// No-op limiter for tests and mock adapters.
#[derive(Debug, Default)]
pub struct NoRateLimit;

#[async_trait]
impl RateLimiter for NoRateLimit {
    async fn acquire(&self, _key: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exhausting_the_bucket_forces_a_wait() {
        let limiter = TokenBucketLimiter::new(1, 1000);
        limiter.acquire("acct:binance").await;
        let start = Instant::now();
        limiter.acquire("acct:binance").await;
        // Second acquire had to wait for a partial refill; not
        // asserting an exact duration (timing-sensitive), just that it
        // didn't panic and resolved.
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let limiter = TokenBucketLimiter::new(1, 1);
        limiter.acquire("a").await;
        // Different key should not be starved by "a"'s consumption.
        assert!(limiter.try_consume("b").is_none());
    }
}
