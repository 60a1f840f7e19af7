use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Netted, signed position for `(strategy_account, symbol)` with a
/// volume-weighted entry price (spec §3).
///
/// Invariant: `quantity == 0` ⇒ the row is deleted, never retained with
/// a zero quantity — see [`crate::model::strategy_position`]'s callers
/// in the Position Manager (crate `conduit-risk`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyPosition {
    pub strategy_account_id: i64,
    pub symbol: String,
    /// Positive = long, negative = short.
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub last_updated: DateTime<Utc>,
}

impl StrategyPosition {
    pub fn new(strategy_account_id: i64, symbol: impl Into<String>) -> Self {
        Self {
            strategy_account_id,
            symbol: symbol.into(),
            quantity: Decimal::ZERO,
            entry_price: Decimal::ZERO,
            last_updated: Utc::now(),
        }
    }

    pub fn is_long(&self) -> bool {
        self.quantity > Decimal::ZERO
    }

    pub fn is_short(&self) -> bool {
        self.quantity < Decimal::ZERO
    }

    pub fn is_flat(&self) -> bool {
        self.quantity == Decimal::ZERO
    }
}
