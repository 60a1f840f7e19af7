//! Daily account summary rollups (spec §3's `DailyAccountSummary`
//! entity; supplemented per `app/services/dashboard_service.py` in the
//! retrieved original source, which reads a `(account, day)` rollup of
//! realized PnL, trade count and win rate off the same trade stream
//! this crate's [`crate::metric`] module consumes).
//!
//! [`DailyAccountSummary`] is [`conduit_core::model::DailyAccountSummary`]
//! re-exported under this path: the entity is defined once, in the
//! shared model crate every persistence layer serializes, and this
//! module is the read-side aggregator that builds it from a
//! [`Trade`] stream rather than a second definition of the same row.

pub use conduit_core::model::DailyAccountSummary;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use conduit_core::{contracts::PerformanceHook, error::ExecutionError, model::Trade};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Folds a strategy account's [`Trade`] stream into one
/// [`DailyAccountSummary`] per trading day, keyed by the trade's UTC
/// date. Built incrementally: call [`SummaryAggregator::record_trade`]
/// as trades land (the natural fit for the Record Manager's
/// [`conduit_core::contracts::PerformanceHook`], spec §4.9), or fold a
/// whole day's trades at once with [`SummaryAggregator::from_trades`].
///
/// A trade only contributes to `win_count`/`loss_count`/`realized_pnl`
/// when it closed or reduced a position (`Trade.pnl.is_some()`); an
/// entry trade still counts toward `trade_count` and moves
/// `ending_balance` by its fee, but has no win/loss verdict of its own.
#[derive(Debug, Default)]
pub struct SummaryAggregator {
    days: BTreeMap<(i64, NaiveDate), DailyAccountSummary>,
}

impl SummaryAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an aggregator from a batch of historical trades, e.g. to
    /// backfill summaries for a strategy account on startup.
    pub fn from_trades(trades: impl IntoIterator<Item = Trade>) -> Self {
        let mut aggregator = Self::new();
        for trade in trades {
            aggregator.record_trade(&trade);
        }
        aggregator
    }

    /// Applies one trade to the day it occurred on, creating that
    /// day's summary row on first touch. Starting balance for a new
    /// day carries forward the previous day's ending balance when one
    /// exists for this account, else `0` (the caller is expected to
    /// overwrite `starting_balance` from the ledger for the very first
    /// tracked day, if that differs from zero).
    pub fn record_trade(&mut self, trade: &Trade) {
        let date = trade.timestamp.date_naive();
        let key = (trade.strategy_account_id, date);

        let carry_forward = self.latest_ending_balance_before(trade.strategy_account_id, date);

        let summary = self.days.entry(key).or_insert_with(|| DailyAccountSummary {
            strategy_account_id: trade.strategy_account_id,
            date,
            starting_balance: carry_forward,
            ending_balance: carry_forward,
            realized_pnl: Decimal::ZERO,
            trade_count: 0,
            win_count: 0,
            loss_count: 0,
        });

        summary.trade_count += 1;
        summary.ending_balance -= trade.fee;

        if let Some(pnl) = trade.pnl {
            summary.realized_pnl += pnl;
            summary.ending_balance += pnl;
            if pnl > Decimal::ZERO {
                summary.win_count += 1;
            } else if pnl < Decimal::ZERO {
                summary.loss_count += 1;
            }
        }
    }

    fn latest_ending_balance_before(&self, strategy_account_id: i64, date: NaiveDate) -> Decimal {
        self.days
            .range((strategy_account_id, NaiveDate::MIN)..(strategy_account_id, date))
            .next_back()
            .map(|(_, summary)| summary.ending_balance)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn summary_for(&self, strategy_account_id: i64, date: NaiveDate) -> Option<&DailyAccountSummary> {
        self.days.get(&(strategy_account_id, date))
    }

    /// All summaries for one strategy account, oldest first.
    pub fn summaries_for_account(&self, strategy_account_id: i64) -> Vec<&DailyAccountSummary> {
        self.days
            .range((strategy_account_id, NaiveDate::MIN)..=(strategy_account_id, NaiveDate::MAX))
            .map(|(_, summary)| summary)
            .collect()
    }

    /// Win rate for `strategy_account_id` on `date`, `None` when the
    /// day has no win/loss-verdict trades yet (matches
    /// [`crate::metric::win_rate::WinRate`]'s own empty-input
    /// convention rather than dividing by zero).
    pub fn win_rate_for(&self, strategy_account_id: i64, date: NaiveDate) -> Option<Decimal> {
        let summary = self.summary_for(strategy_account_id, date)?;
        let decided = summary.win_count + summary.loss_count;
        if decided == 0 {
            return None;
        }
        Some(Decimal::from(summary.win_count) / Decimal::from(decided))
    }

    /// Today's summary row for `strategy_account_id`, if any trades
    /// have landed yet today.
    pub fn today(&self, strategy_account_id: i64) -> Option<&DailyAccountSummary> {
        self.summary_for(strategy_account_id, Utc::now().date_naive())
    }
}

/// Wires a [`SummaryAggregator`] in as the Record Manager's post-commit
/// [`PerformanceHook`] (spec §4.9: "performance-tracking update for the
/// day"). Interior-mutable so one instance can be shared behind an
/// `Arc` between the record manager that calls it on every new fill and
/// whatever reporting surface reads the rollups back out.
#[derive(Debug, Default)]
pub struct RollingSummaryHook {
    aggregator: Mutex<SummaryAggregator>,
}

impl RollingSummaryHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary_for(&self, strategy_account_id: i64, date: NaiveDate) -> Option<DailyAccountSummary> {
        self.aggregator.lock().summary_for(strategy_account_id, date).cloned()
    }
}

#[async_trait]
impl PerformanceHook for RollingSummaryHook {
    async fn record_trade(&self, trade: &Trade) -> Result<(), ExecutionError> {
        self.aggregator.lock().record_trade(trade);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use conduit_markets::{OrderType, Side};
    use rust_decimal_macros::dec;

    fn trade_at(account: i64, day: &str, pnl: Option<Decimal>, fee: Decimal) -> Trade {
        let timestamp: DateTime<Utc> = NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc();
        Trade {
            id: 0,
            strategy_account_id: account,
            exchange_order_id: "order-1".to_string(),
            symbol: "BTC/USDT".to_string(),
            side: Side::Buy,
            quantity: dec!(0.01),
            price: dec!(50000),
            order_price: None,
            order_type: OrderType::Market,
            is_entry: pnl.is_none(),
            pnl,
            fee,
            timestamp,
        }
    }

    #[test]
    fn entry_trade_contributes_count_and_fee_but_no_win_loss_verdict() {
        let mut aggregator = SummaryAggregator::new();
        aggregator.record_trade(&trade_at(1, "2026-07-01", None, dec!(0.5)));

        let summary = aggregator.summary_for(1, "2026-07-01".parse().unwrap()).unwrap();
        assert_eq!(summary.trade_count, 1);
        assert_eq!(summary.win_count, 0);
        assert_eq!(summary.loss_count, 0);
        assert_eq!(summary.ending_balance, dec!(-0.5));
        assert_eq!(summary.realized_pnl, Decimal::ZERO);
    }

    #[test]
    fn closing_trade_with_positive_pnl_counts_as_a_win() {
        let mut aggregator = SummaryAggregator::new();
        aggregator.record_trade(&trade_at(1, "2026-07-01", Some(dec!(100)), dec!(0.5)));

        let summary = aggregator.summary_for(1, "2026-07-01".parse().unwrap()).unwrap();
        assert_eq!(summary.win_count, 1);
        assert_eq!(summary.realized_pnl, dec!(100));
        assert_eq!(summary.ending_balance, dec!(99.5));
        assert_eq!(aggregator.win_rate_for(1, "2026-07-01".parse().unwrap()), Some(dec!(1)));
    }

    #[test]
    fn closing_trade_with_negative_pnl_counts_as_a_loss() {
        let mut aggregator = SummaryAggregator::new();
        aggregator.record_trade(&trade_at(1, "2026-07-01", Some(dec!(-50)), Decimal::ZERO));

        let summary = aggregator.summary_for(1, "2026-07-01".parse().unwrap()).unwrap();
        assert_eq!(summary.loss_count, 1);
        assert_eq!(summary.win_rate_for(1, "2026-07-01".parse().unwrap()), None);
    }

    fn win_rate_for(aggregator: &SummaryAggregator, account: i64, date: &str) -> Option<Decimal> {
        aggregator.win_rate_for(account, date.parse().unwrap())
    }

    #[test]
    fn a_new_day_carries_forward_the_previous_days_ending_balance() {
        let mut aggregator = SummaryAggregator::new();
        aggregator.record_trade(&trade_at(1, "2026-07-01", Some(dec!(100)), Decimal::ZERO));
        aggregator.record_trade(&trade_at(1, "2026-07-02", Some(dec!(-20)), Decimal::ZERO));

        let day_two = aggregator.summary_for(1, "2026-07-02".parse().unwrap()).unwrap();
        assert_eq!(day_two.starting_balance, dec!(100));
        assert_eq!(day_two.ending_balance, dec!(80));
        assert_eq!(win_rate_for(&aggregator, 1, "2026-07-01"), Some(dec!(1)));
    }

    #[test]
    fn distinct_accounts_never_share_a_days_summary() {
        let mut aggregator = SummaryAggregator::new();
        aggregator.record_trade(&trade_at(1, "2026-07-01", Some(dec!(100)), Decimal::ZERO));
        aggregator.record_trade(&trade_at(2, "2026-07-01", Some(dec!(-100)), Decimal::ZERO));

        assert_eq!(
            aggregator.summary_for(1, "2026-07-01".parse().unwrap()).unwrap().realized_pnl,
            dec!(100)
        );
        assert_eq!(
            aggregator.summary_for(2, "2026-07-01".parse().unwrap()).unwrap().realized_pnl,
            dec!(-100)
        );
    }

    #[test]
    fn from_trades_backfills_in_one_pass() {
        let aggregator = SummaryAggregator::from_trades(vec![
            trade_at(1, "2026-07-01", Some(dec!(10)), Decimal::ZERO),
            trade_at(1, "2026-07-01", Some(dec!(-5)), Decimal::ZERO),
        ]);

        let summary = aggregator.summary_for(1, "2026-07-01".parse().unwrap()).unwrap();
        assert_eq!(summary.trade_count, 2);
        assert_eq!(summary.win_count, 1);
        assert_eq!(summary.loss_count, 1);
        assert_eq!(summary.realized_pnl, dec!(5));
    }

    #[tokio::test]
    async fn rolling_summary_hook_folds_trades_as_they_land() {
        let hook = RollingSummaryHook::new();
        hook.record_trade(&trade_at(1, "2026-07-01", Some(dec!(30)), Decimal::ZERO)).await.unwrap();
        hook.record_trade(&trade_at(1, "2026-07-01", Some(dec!(-10)), Decimal::ZERO)).await.unwrap();

        let summary = hook.summary_for(1, "2026-07-01".parse().unwrap()).unwrap();
        assert_eq!(summary.trade_count, 2);
        assert_eq!(summary.realized_pnl, dec!(20));
    }
}
