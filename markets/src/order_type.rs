//! Canonical order type vocabulary (spec §6 webhook `order_type` field).

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum OrderType {
    Market,
    Limit,
    StopMarket,
    StopLimit,
    /// Cancel a single order by id.
    Cancel,
    /// Cancel every open order matching a filter.
    CancelAllOrder,
    /// Securities-only: market-on-close (B3 end-of-session auction).
    MarketOnClose,
    /// Securities-only: day-limit order (expires at session close, as
    /// opposed to the crypto venues' good-until-cancelled default).
    DayLimit,
}

impl OrderType {
    /// LIMIT/STOP_* orders are admitted to the Order Queue Manager
    /// instead of being sent to the exchange directly (spec §4.7 step 3b).
    pub fn is_queued(&self) -> bool {
        matches!(
            self,
            OrderType::Limit
                | OrderType::StopMarket
                | OrderType::StopLimit
                | OrderType::DayLimit
        )
    }

    pub fn is_stop(&self) -> bool {
        matches!(self, OrderType::StopMarket | OrderType::StopLimit)
    }

    pub fn is_cancel(&self) -> bool {
        matches!(self, OrderType::Cancel | OrderType::CancelAllOrder)
    }

    pub fn requires_price(&self) -> bool {
        matches!(self, OrderType::Limit | OrderType::StopLimit | OrderType::DayLimit)
    }

    pub fn requires_stop_price(&self) -> bool {
        matches!(self, OrderType::StopMarket | OrderType::StopLimit)
    }

    /// Queue admission priority table (spec §4.6); lower sorts first.
    /// `CANCEL`/`CANCEL_ALL_ORDER` share MARKET's urgency tier since
    /// neither is ever queued — they're listed for completeness of the
    /// priority table the rebalancer consults.
    pub fn base_priority(&self) -> u8 {
        match self {
            OrderType::Market => 1,
            OrderType::Cancel | OrderType::CancelAllOrder => 2,
            OrderType::Limit | OrderType::DayLimit => 3,
            OrderType::StopMarket => 4,
            OrderType::StopLimit => 5,
            OrderType::MarketOnClose => 1,
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
            OrderType::StopMarket => "STOP_MARKET",
            OrderType::StopLimit => "STOP_LIMIT",
            OrderType::Cancel => "CANCEL",
            OrderType::CancelAllOrder => "CANCEL_ALL_ORDER",
            OrderType::MarketOnClose => "MARKET_ON_CLOSE",
            OrderType::DayLimit => "DAY_LIMIT",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown order type: {0}")]
pub struct UnknownOrderType(pub String);

impl FromStr for OrderType {
    type Err = UnknownOrderType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MARKET" => Ok(OrderType::Market),
            "LIMIT" => Ok(OrderType::Limit),
            "STOP_MARKET" => Ok(OrderType::StopMarket),
            "STOP_LIMIT" => Ok(OrderType::StopLimit),
            "CANCEL" => Ok(OrderType::Cancel),
            "CANCEL_ALL_ORDER" => Ok(OrderType::CancelAllOrder),
            "MARKET_ON_CLOSE" => Ok(OrderType::MarketOnClose),
            "DAY_LIMIT" => Ok(OrderType::DayLimit),
            other => Err(UnknownOrderType(other.to_string())),
        }
    }
}
