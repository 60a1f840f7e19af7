use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One-per-`StrategyAccount` capital ledger (spec §3). The Quantity
/// Calculator reads `allocated_capital`; the Record Manager's
/// post-commit hook reflects realized PnL into `current_pnl`
/// (spec §4.9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyCapital {
    pub strategy_account_id: i64,
    pub allocated_capital: Decimal,
    pub current_pnl: Decimal,
    pub last_updated: DateTime<Utc>,
}

impl StrategyCapital {
    /// Reflects a realized PnL delta from a closing/flipping trade.
    /// Failures in the caller's post-commit hook plumbing must not
    /// unwind this — see spec §4.9 "either hook's failure is logged
    /// but never propagates".
    pub fn reflect_realized_pnl(&mut self, realized_pnl: Decimal) {
        self.current_pnl += realized_pnl;
        self.last_updated = Utc::now();
    }
}
