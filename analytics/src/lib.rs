//! # Analytics — performance metrics and daily account summaries
//!
//! Downstream consumer of the [`conduit_core::model::Trade`] stream
//! (spec §1: daily-summary aggregation is in scope as a consumer of
//! core events, not the dashboard that would render it). Two things
//! live here: per-trade-series metrics ([`metric`]) and the
//! [`summary::SummaryAggregator`] that folds trades into a rolling
//! [`summary::DailyAccountSummary`] per `(strategy_account, day)`.
//!
//! ```rust
//! use conduit_analytics::metric::sharpe::SharpeRatio;
//! use conduit_analytics::time::Daily;
//! use rust_decimal_macros::dec;
//!
//! let risk_free = dec!(0.0015);
//! let mean_ret = dec!(0.0025);
//! let std_dev = dec!(0.0200);
//!
//! let sharpe = SharpeRatio::calculate(risk_free, mean_ret, std_dev, Daily);
//! assert_eq!(sharpe.value, dec!(0.05));
//! ```

/// Statistical helpers (mean/standard deviation of a return series) the
/// metrics in [`metric`] are computed from.
pub mod algorithm;

/// Financial metrics over a [`time::TimeInterval`]: Sharpe ratio, win
/// rate, profit factor.
pub mod metric;

/// [`summary::DailyAccountSummary`] rollups and the
/// [`summary::SummaryAggregator`] that builds them from a `Trade` stream.
pub mod summary;

/// Time interval conventions (`Daily`, `Annual252`, `Annual365`) used to
/// scale period-relative metrics.
pub mod time;

use chrono::{DateTime, Utc};

/// Trait for types that have a timestamp.
///
/// Defines the standard interface for objects that carry temporal information,
/// essential for time-based analysis and chronological ordering.
pub trait Timed {
    /// Returns the timestamp of this item.
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Wrapper structure that combines a value with a timestamp.
///
/// Useful for associating financial data with their specific timestamps,
/// allowing precise temporal analysis and chronological ordering.
///
/// # Example
/// ```rust
/// use conduit_analytics::{TimedValue, Timed};
/// use chrono::Utc;
///
/// let price = TimedValue::new(100.50_f64, Utc::now());
/// assert!(price.timestamp() <= Utc::now());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TimedValue<T> {
    /// The value associated with the timestamp
    pub value: T,
    /// UTC timestamp of the value
    pub timestamp: DateTime<Utc>,
}

impl<T> TimedValue<T> {
    /// Creates a new `TimedValue` with the provided value and timestamp.
    pub fn new(value: T, timestamp: DateTime<Utc>) -> Self {
        Self { value, timestamp }
    }
}

impl<T> Timed for TimedValue<T> {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
pub mod test_utils {
    //! Utilities for testing the analytics module.
    //!
    //! Provides helper functions for creating test data
    //! and manipulating time in test scenarios.

    use chrono::{DateTime, Utc};

    /// Adds days to a base date for creating test data.
    ///
    /// Useful for generating test time series with specific intervals
    /// between observations.
    pub fn time_plus_days(base: DateTime<Utc>, plus: u64) -> DateTime<Utc> {
        base + chrono::Duration::days(plus as i64)
    }
}
