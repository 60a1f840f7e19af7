//! Time intervals used to annualise and scale period-relative metrics
//! (spec §10 ambient stack: every [`crate::metric::sharpe::SharpeRatio`]
//! is tagged by the interval its inputs were measured over).

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// A named period a metric's inputs were measured over. Implemented for
/// [`TimeDelta`] itself (an arbitrary custom period) and for the fixed
/// conventions below.
pub trait TimeInterval: Clone + std::fmt::Debug + PartialEq {
    fn interval(&self) -> TimeDelta;
}

impl TimeInterval for TimeDelta {
    fn interval(&self) -> TimeDelta {
        *self
    }
}

/// One calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Daily;

impl TimeInterval for Daily {
    fn interval(&self) -> TimeDelta {
        TimeDelta::days(1)
    }
}

/// 252 trading days — the securities-market annualisation convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Annual252;

impl TimeInterval for Annual252 {
    fn interval(&self) -> TimeDelta {
        TimeDelta::days(252)
    }
}

/// 365 calendar days — the crypto-market (24/7 trading) annualisation
/// convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Annual365;

impl TimeInterval for Annual365 {
    fn interval(&self) -> TimeDelta {
        TimeDelta::days(365)
    }
}
