//! Financial metrics for quantitative evaluation of a strategy's realized
//! trades.
//!
//! - **Sharpe ratio** ([`sharpe`]): risk-adjusted return.
//! - **Win rate** ([`win_rate`]): share of trades that closed profitable.
//! - **Profit factor** ([`profit_factor`]): gross profit over gross loss.
//!
//! ```rust
//! use conduit_analytics::metric::sharpe::SharpeRatio;
//! use rust_decimal_macros::dec;
//! use chrono::TimeDelta;
//!
//! let risk_free = dec!(0.0015);
//! let mean_return = dec!(0.0025);
//! let std_dev = dec!(0.02);
//! let interval = TimeDelta::hours(2);
//!
//! let sharpe = SharpeRatio::calculate(risk_free, mean_return, std_dev, interval);
//! assert!(sharpe.value != rust_decimal::Decimal::ZERO);
//! ```

pub mod profit_factor;
pub mod sharpe;
pub mod win_rate;
