use chrono::{DateTime, Utc};
use conduit_markets::{OrderType, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One per fill event (spec §3, Glossary): idempotent by
/// `(strategy_account_id, exchange_order_id)`.
///
/// Invariants enforced by [`crate::repository::Repository::upsert_trade`]:
/// `UNIQUE(strategy_account_id, exchange_order_id)`, `quantity > 0`,
/// `price > 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: i64,
    pub strategy_account_id: i64,
    pub exchange_order_id: String,
    pub symbol: String,
    pub side: Side,
    /// Cumulative filled quantity for this `exchange_order_id` (spec §9
    /// open question 4 — this spec mandates cumulative semantics, not
    /// per-event delta).
    pub quantity: Decimal,
    /// Execution (average fill) price.
    pub price: Decimal,
    /// Requested price, if any (LIMIT/STOP_LIMIT).
    pub order_price: Option<Decimal>,
    pub order_type: OrderType,
    pub is_entry: bool,
    pub pnl: Option<Decimal>,
    pub fee: Decimal,
    pub timestamp: DateTime<Utc>,
}
