use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Many-to-many link row between a Strategy and an Account (spec §3).
///
/// Invariant: a fill is always recorded against exactly one
/// `StrategyAccount` — never directly against a bare `Account`, since
/// one account can back multiple strategies with independent capital
/// allocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyAccount {
    pub id: i64,
    pub strategy_id: i64,
    pub account_id: i64,
    pub weight: Decimal,
    pub leverage: Decimal,
    pub max_symbols: Option<u32>,
    pub is_active: bool,
}
