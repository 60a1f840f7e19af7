use chrono::{DateTime, Utc};
use conduit_markets::{OrderType, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A LIMIT/STOP order admitted to the Order Queue Manager's local
/// queue but not yet submitted to the exchange (spec §3, Glossary).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingOrder {
    pub id: i64,
    pub strategy_account_id: i64,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    /// Lower is higher priority (spec §4.6's priority table).
    pub priority: u8,
    pub reason: Option<String>,
    pub enqueued_at: DateTime<Utc>,
}
