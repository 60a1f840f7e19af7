use chrono::{DateTime, Utc};
use conduit_markets::{MarketType, OrderType, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `OpenOrder.status` is always non-terminal (spec §3): terminal
/// transitions delete the row (and hand off to Record/Position
/// Manager) rather than storing a terminal value here.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum OpenOrderStatus {
    New,
    Open,
    PartiallyFilled,
}

/// An order acknowledged by the exchange in a non-terminal state
/// (spec §3, Glossary), keyed by `exchange_order_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenOrder {
    pub exchange_order_id: String,
    pub strategy_account_id: i64,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub filled_quantity: Decimal,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub status: OpenOrderStatus,
    pub market_type: MarketType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
