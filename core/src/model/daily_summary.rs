use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Daily rollup produced on balance snapshots, consumed by the
/// analytics crate's `SummaryAggregator` (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyAccountSummary {
    pub strategy_account_id: i64,
    pub date: NaiveDate,
    pub starting_balance: Decimal,
    pub ending_balance: Decimal,
    pub realized_pnl: Decimal,
    pub trade_count: u32,
    pub win_count: u32,
    pub loss_count: u32,
}
