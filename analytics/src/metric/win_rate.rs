use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Share of winning trades, between 0 and 1, calculated as `wins/total`.
///
/// `None` if there are no trades (`total == 0`) or the division
/// overflows.
///
/// Reference: <https://www.investopedia.com/terms/w/win-loss-ratio.asp>
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Deserialize, Serialize)]
pub struct WinRate {
    pub value: Decimal,
}

impl WinRate {
    /// Calculates the [`WinRate`] from the number of wins and the total
    /// number of trades.
    pub fn calculate(wins: Decimal, total: Decimal) -> Option<Self> {
        if total == Decimal::ZERO {
            None
        } else {
            let value = wins.abs().checked_div(total.abs())?;
            Some(Self { value })
        }
    }
}
