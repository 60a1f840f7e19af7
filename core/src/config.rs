//! Explicit configuration surface (spec §6, §9 redesign note "Dynamic
//! kwargs / duck-typed config objects... all configuration becomes
//! explicit structs with enumerated options").
//!
//! `TradingConfig::from_env` reads the documented environment
//! variables; anything unset falls back to the documented default, and
//! anything malformed falls back to the default rather than failing
//! startup (matching spec §6's "Invalid ⇒ fall back to default" rule
//! for `MARKET_ORDER_RETRY_DELAYS_MS`, generalized to the rest of the
//! surface for consistency).

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradingConfig {
    /// Optional initial sleep before the first MARKET fill poll.
    pub market_order_delay: Duration,
    /// Retry schedule for MARKET immediate-fill polling.
    pub market_order_retry_delays: Vec<Duration>,
    pub max_market_order_retries: u32,
    /// Per-account deadline for a batch webhook's worker pool.
    pub batch_account_timeout: Duration,
    pub capital_auto_refresh: Duration,
    /// Bound on the per-signal worker pool (spec §5: "≤10 workers by
    /// default, capped by number of target accounts").
    pub max_concurrent_workers: usize,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            market_order_delay: Duration::ZERO,
            market_order_retry_delays: default_retry_schedule(),
            max_market_order_retries: 5,
            batch_account_timeout: Duration::from_secs(30),
            capital_auto_refresh: Duration::from_secs(300),
            max_concurrent_workers: 10,
        }
    }
}

fn default_retry_schedule() -> Vec<Duration> {
    [125u64, 250, 500, 1000, 2000]
        .into_iter()
        .map(Duration::from_millis)
        .collect()
}

impl TradingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            market_order_delay: env_millis("MARKET_ORDER_DELAY_MS", defaults.market_order_delay),
            market_order_retry_delays: env_retry_schedule(
                "MARKET_ORDER_RETRY_DELAYS_MS",
                defaults.market_order_retry_delays,
            ),
            max_market_order_retries: env_u32(
                "MAX_MARKET_ORDER_RETRIES",
                defaults.max_market_order_retries,
            ),
            batch_account_timeout: env_seconds(
                "BATCH_ACCOUNT_TIMEOUT_SEC",
                defaults.batch_account_timeout,
            ),
            capital_auto_refresh: env_seconds(
                "CAPITAL_AUTO_REFRESH_SECONDS",
                defaults.capital_auto_refresh,
            ),
            max_concurrent_workers: defaults.max_concurrent_workers,
        }
    }
}

fn env_millis(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

fn env_seconds(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(default)
}

/// Parses a comma-separated millisecond retry schedule. An empty
/// string still yields at least one attempt (spec §6); anything that
/// fails to parse falls back to `default` wholesale rather than
/// partially applying.
fn env_retry_schedule(key: &str, default: Vec<Duration>) -> Vec<Duration> {
    let Ok(raw) = std::env::var(key) else {
        return default;
    };
    if raw.trim().is_empty() {
        return vec![Duration::ZERO];
    }
    let parsed: Result<Vec<u64>, _> = raw.split(',').map(|part| part.trim().parse::<u64>()).collect();
    match parsed {
        Ok(values) if !values.is_empty() => values.into_iter().map(Duration::from_millis).collect(),
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_retry_schedule_matches_spec() {
        let config = TradingConfig::default();
        let millis: Vec<u64> = config
            .market_order_retry_delays
            .iter()
            .map(Duration::as_millis)
            .map(|d| d as u64)
            .collect();
        assert_eq!(millis, vec![125, 250, 500, 1000, 2000]);
    }

    #[test]
    fn malformed_retry_schedule_falls_back_to_default() {
        let schedule = env_retry_schedule("__NONEXISTENT_CONDUIT_VAR__", default_retry_schedule());
        assert_eq!(schedule, default_retry_schedule());
    }
}
