use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Finer-than-`Trade` execution-grade ledger row: one per venue fill
/// event rather than one per cumulative order (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeExecution {
    pub id: i64,
    pub trade_id: i64,
    pub venue_trade_id: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub is_maker: bool,
    pub commission: Decimal,
    pub commission_asset: String,
    pub timestamp: DateTime<Utc>,
}
