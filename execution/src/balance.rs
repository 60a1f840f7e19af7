//! Account balance snapshot, shared by every adapter's `fetch_balance`
//! plumbing before it collapses down to the single `Decimal` the
//! [`conduit_core::contracts::ExchangeAdapter`] trait exposes.

use chrono::{DateTime, Utc};
use derive_more::Constructor;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize, Constructor)]
pub struct AssetBalance {
    pub asset: String,
    pub balance: Balance,
    pub time_exchange: DateTime<Utc>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize, Serialize, Constructor)]
pub struct Balance {
    pub total: Decimal,
    pub free: Decimal,
}

impl Balance {
    pub fn used(&self) -> Decimal {
        self.total - self.free
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn used_is_total_minus_free() {
        let balance = Balance::new(dec!(100), dec!(40));
        assert_eq!(balance.used(), dec!(60));
    }
}
