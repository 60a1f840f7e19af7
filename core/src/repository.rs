//! In-memory reference `Repository` (spec §9 redesign note: persistence
//! engine selection is explicitly out of scope — "any RDBMS with
//! row-level locking and UNIQUE constraints suffices", spec §1). This
//! implementation exists so the rest of the workspace (and its test
//! suites) has one concrete, dependency-free place to exercise the
//! row-lock and idempotency semantics spec §4.8/§4.9/§5 require; a
//! production deployment swaps this for a real RDBMS-backed
//! implementation behind the same method signatures.
//!
//! Two registries matter here:
//! - `positions`: one `parking_lot::Mutex` per `(strategy_account_id,
//!   symbol)`, acquired with `try_lock` to emulate `FOR UPDATE SKIP
//!   LOCKED` (spec §4.8) — contention returns immediately rather than
//!   blocking.
//! - `trades`: keyed by `(strategy_account_id, exchange_order_id)`,
//!   enforcing the UNIQUE constraint spec §3/§4.9 require at the
//!   application level.

use crate::model::{
    Account, OpenOrder, PendingOrder, Strategy, StrategyAccount, StrategyCapital, StrategyPosition, Trade,
    TradeExecution,
};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use std::{collections::HashMap, sync::Arc};

#[derive(Debug, Clone, Hash, Eq, PartialEq)]
struct PositionKey {
    strategy_account_id: i64,
    symbol: String,
}

/// Outcome of attempting the position row lock (spec §4.8).
pub enum PositionLockOutcome<R> {
    /// Lock acquired; `R` is whatever the caller's closure computed.
    Applied(R),
    /// Another caller currently holds the lock. The caller should skip,
    /// not retry — the lock winner observes the same authoritative
    /// exchange state, and idempotent trade recording ensures
    /// convergence (spec §4.8).
    LockContention,
}

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    strategies: RwLock<HashMap<i64, Strategy>>,
    strategies_by_group: RwLock<HashMap<String, i64>>,
    strategy_accounts: RwLock<HashMap<i64, StrategyAccount>>,
    accounts: RwLock<HashMap<i64, Account>>,
    strategy_capital: RwLock<HashMap<i64, StrategyCapital>>,
    open_orders: RwLock<HashMap<String, OpenOrder>>,
    pending_orders: RwLock<HashMap<i64, PendingOrder>>,
    trades: RwLock<HashMap<(i64, String), Trade>>,
    next_trade_id: Mutex<i64>,
    trade_executions: RwLock<Vec<TradeExecution>>,
    next_trade_execution_id: Mutex<i64>,
    positions: RwLock<HashMap<PositionKey, Arc<Mutex<Option<StrategyPosition>>>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_strategy(&self, strategy: Strategy) {
        self.strategies_by_group
            .write()
            .insert(strategy.group_name.clone(), strategy.id);
        self.strategies.write().insert(strategy.id, strategy);
    }

    pub fn find_strategy_by_group_name(&self, group_name: &str) -> Option<Strategy> {
        let id = *self.strategies_by_group.read().get(group_name)?;
        self.strategies.read().get(&id).cloned()
    }

    pub fn insert_account(&self, account: Account) {
        self.accounts.write().insert(account.id, account);
    }

    pub fn find_account(&self, account_id: i64) -> Option<Account> {
        self.accounts.read().get(&account_id).cloned()
    }

    pub fn insert_strategy_account(&self, link: StrategyAccount) {
        self.strategy_accounts.write().insert(link.id, link);
    }

    pub fn find_strategy_account(&self, id: i64) -> Option<StrategyAccount> {
        self.strategy_accounts.read().get(&id).cloned()
    }

    /// StrategyAccounts for a strategy, active link + active account
    /// only (spec §4.7 step 2).
    pub fn active_strategy_accounts(&self, strategy_id: i64) -> Vec<StrategyAccount> {
        let accounts = self.accounts.read();
        self.strategy_accounts
            .read()
            .values()
            .filter(|link| link.strategy_id == strategy_id && link.is_active)
            .filter(|link| {
                accounts
                    .get(&link.account_id)
                    .map(|account| account.is_active)
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    pub fn insert_strategy_capital(&self, capital: StrategyCapital) {
        self.strategy_capital
            .write()
            .insert(capital.strategy_account_id, capital);
    }

    pub fn find_strategy_capital(&self, strategy_account_id: i64) -> Option<StrategyCapital> {
        self.strategy_capital.read().get(&strategy_account_id).cloned()
    }

    pub fn reflect_realized_pnl(&self, strategy_account_id: i64, realized_pnl: Decimal) {
        if let Some(capital) = self.strategy_capital.write().get_mut(&strategy_account_id) {
            capital.reflect_realized_pnl(realized_pnl);
        }
    }

    pub fn find_position(&self, strategy_account_id: i64, symbol: &str) -> Option<StrategyPosition> {
        let key = PositionKey {
            strategy_account_id,
            symbol: symbol.to_string(),
        };
        self.positions
            .read()
            .get(&key)
            .and_then(|slot| slot.lock().clone())
    }

    /// Attempts the row lock for `(strategy_account_id, symbol)` and, on
    /// success, runs `f` against the current row (`None` if it doesn't
    /// exist yet — the caller is expected to create it). Mirrors
    /// `SELECT ... FOR UPDATE SKIP LOCKED` (spec §4.8): a concurrent
    /// holder causes an immediate [`PositionLockOutcome::LockContention`],
    /// never a block.
    pub fn with_position_lock<R>(
        &self,
        strategy_account_id: i64,
        symbol: &str,
        f: impl FnOnce(&mut Option<StrategyPosition>) -> R,
    ) -> PositionLockOutcome<R> {
        let key = PositionKey {
            strategy_account_id,
            symbol: symbol.to_string(),
        };
        let slot = {
            let mut positions = self.positions.write();
            positions
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(None)))
                .clone()
        };
        match slot.try_lock() {
            Some(mut guard) => PositionLockOutcome::Applied(f(&mut guard)),
            None => PositionLockOutcome::LockContention,
        }
    }

    /// Idempotent trade upsert (spec §4.9): application-level SELECT
    /// then UPDATE-or-INSERT keyed by `(strategy_account_id,
    /// exchange_order_id)`. Returns the quantity delta against the
    /// previous cumulative fill, which is what the Position Manager
    /// applies.
    pub fn upsert_trade(&self, mut trade: Trade) -> TradeUpsertOutcome {
        let key = (trade.strategy_account_id, trade.exchange_order_id.clone());
        let mut trades = self.trades.write();
        match trades.get(&key) {
            Some(existing) if existing.quantity == trade.quantity => TradeUpsertOutcome {
                trade: existing.clone(),
                quantity_delta: Decimal::ZERO,
                duplicate_prevented: true,
            },
            Some(existing) => {
                let delta = trade.quantity - existing.quantity;
                trade.id = existing.id;
                trades.insert(key, trade.clone());
                TradeUpsertOutcome {
                    trade,
                    quantity_delta: delta,
                    duplicate_prevented: false,
                }
            }
            None => {
                let mut next_id = self.next_trade_id.lock();
                *next_id += 1;
                trade.id = *next_id;
                let delta = trade.quantity;
                trades.insert(key, trade.clone());
                TradeUpsertOutcome {
                    trade,
                    quantity_delta: delta,
                    duplicate_prevented: false,
                }
            }
        }
    }

    /// Appends a [`TradeExecution`] ledger row (spec §3: finer
    /// granularity than `Trade`, one per venue fill event rather than
    /// one per cumulative order). Never deduplicated — a venue may
    /// legitimately report the same order filling across several
    /// partial executions, each its own row.
    pub fn insert_trade_execution(&self, mut execution: TradeExecution) -> TradeExecution {
        let mut next_id = self.next_trade_execution_id.lock();
        *next_id += 1;
        execution.id = *next_id;
        self.trade_executions.write().push(execution.clone());
        execution
    }

    pub fn trade_executions_for(&self, trade_id: i64) -> Vec<TradeExecution> {
        self.trade_executions
            .read()
            .iter()
            .filter(|execution| execution.trade_id == trade_id)
            .cloned()
            .collect()
    }

    pub fn upsert_open_order(&self, order: OpenOrder) {
        self.open_orders
            .write()
            .insert(order.exchange_order_id.clone(), order);
    }

    pub fn find_open_order(&self, exchange_order_id: &str) -> Option<OpenOrder> {
        self.open_orders.read().get(exchange_order_id).cloned()
    }

    /// Deletes the OpenOrder on a terminal transition (spec §4.10).
    pub fn delete_open_order(&self, exchange_order_id: &str) -> Option<OpenOrder> {
        self.open_orders.write().remove(exchange_order_id)
    }

    pub fn open_orders_for_account(&self, strategy_account_id: i64) -> Vec<OpenOrder> {
        self.open_orders
            .read()
            .values()
            .filter(|order| order.strategy_account_id == strategy_account_id)
            .cloned()
            .collect()
    }

    pub fn all_open_orders(&self) -> Vec<OpenOrder> {
        self.open_orders.read().values().cloned().collect()
    }

    pub fn insert_pending_order(&self, order: PendingOrder) {
        self.pending_orders.write().insert(order.id, order);
    }

    pub fn delete_pending_order(&self, id: i64) -> Option<PendingOrder> {
        self.pending_orders.write().remove(&id)
    }

    /// PendingOrders for a `(strategy_account, symbol, side)` bucket,
    /// priority-sorted ascending (spec §4.6: admission capacity and the
    /// rebalancer's promotion window are both scoped per side, not per
    /// symbol as a whole).
    pub fn pending_orders_for(&self, strategy_account_id: i64, symbol: &str, side: conduit_markets::Side) -> Vec<PendingOrder> {
        let mut orders: Vec<PendingOrder> = self
            .pending_orders
            .read()
            .values()
            .filter(|order| {
                order.strategy_account_id == strategy_account_id && order.symbol == symbol && order.side == side
            })
            .cloned()
            .collect();
        // Spec §4.6: within a priority tier, LIMIT orders promote in
        // price order and STOP orders in stop-price order, so replays
        // of the same queue always promote in the same sequence.
        // `enqueued_at` breaks any remaining tie (e.g. two CANCELs).
        orders.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| secondary_priority_key(a).cmp(&secondary_priority_key(b)))
                .then_with(|| a.enqueued_at.cmp(&b.enqueued_at))
        });
        orders
    }
}

/// Tier-local tiebreaker for [`Repository::pending_orders_for`] (spec
/// §4.6): price for LIMIT-family orders, stop price for STOP-family
/// orders, zero for everything else (MARKET/CANCEL never queue here).
fn secondary_priority_key(order: &PendingOrder) -> Decimal {
    if order.order_type.requires_price() {
        order.price.unwrap_or(Decimal::ZERO)
    } else if order.order_type.requires_stop_price() {
        order.stop_price.unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    }
}

pub struct TradeUpsertOutcome {
    pub trade: Trade,
    pub quantity_delta: Decimal,
    pub duplicate_prevented: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use conduit_markets::{OrderType, Side};
    use rust_decimal_macros::dec;

    fn sample_trade(qty: Decimal) -> Trade {
        Trade {
            id: 0,
            strategy_account_id: 1,
            exchange_order_id: "ord-1".to_string(),
            symbol: "BTC/USDT".to_string(),
            side: Side::Buy,
            quantity: qty,
            price: dec!(50000),
            order_price: None,
            order_type: OrderType::Market,
            is_entry: true,
            pnl: None,
            fee: Decimal::ZERO,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn trade_upsert_is_idempotent_and_reports_delta() {
        let repo = InMemoryRepository::new();
        let first = repo.upsert_trade(sample_trade(dec!(0.01)));
        assert_eq!(first.quantity_delta, dec!(0.01));
        assert!(!first.duplicate_prevented);

        let second = repo.upsert_trade(sample_trade(dec!(0.02)));
        assert_eq!(second.quantity_delta, dec!(0.01));
        assert_eq!(second.trade.id, first.trade.id);

        let replay = repo.upsert_trade(sample_trade(dec!(0.02)));
        assert!(replay.duplicate_prevented);
        assert_eq!(replay.quantity_delta, Decimal::ZERO);
    }

    #[test]
    fn position_lock_contention_returns_immediately() {
        let repo = InMemoryRepository::new();
        let slot = {
            let mut positions = repo.positions.write();
            positions
                .entry(PositionKey {
                    strategy_account_id: 1,
                    symbol: "BTC/USDT".to_string(),
                })
                .or_insert_with(|| Arc::new(Mutex::new(None)))
                .clone()
        };
        let _held = slot.lock();

        match repo.with_position_lock(1, "BTC/USDT", |_| unreachable!()) {
            PositionLockOutcome::LockContention => {}
            PositionLockOutcome::Applied(_) => panic!("expected contention"),
        }
    }

    #[test]
    fn uncontended_lock_lets_the_caller_create_the_row() {
        let repo = InMemoryRepository::new();
        let outcome = repo.with_position_lock(1, "BTC/USDT", |slot| {
            *slot = Some(StrategyPosition::new(1, "BTC/USDT"));
            slot.as_ref().unwrap().quantity
        });
        match outcome {
            PositionLockOutcome::Applied(qty) => assert_eq!(qty, Decimal::ZERO),
            PositionLockOutcome::LockContention => panic!("expected uncontended"),
        }
    }

    fn sample_pending(id: i64, order_type: OrderType, price: Option<Decimal>, stop_price: Option<Decimal>) -> PendingOrder {
        PendingOrder {
            id,
            strategy_account_id: 1,
            symbol: "BTC/USDT".to_string(),
            side: Side::Buy,
            order_type,
            quantity: dec!(1),
            price,
            stop_price,
            priority: order_type.base_priority(),
            reason: None,
            enqueued_at: Utc::now(),
        }
    }

    #[test]
    fn pending_orders_promote_price_ordered_within_a_tier() {
        let repo = InMemoryRepository::new();
        repo.insert_pending_order(sample_pending(1, OrderType::Limit, Some(dec!(100)), None));
        repo.insert_pending_order(sample_pending(2, OrderType::Limit, Some(dec!(50)), None));
        repo.insert_pending_order(sample_pending(3, OrderType::Limit, Some(dec!(75)), None));

        let ordered = repo.pending_orders_for(1, "BTC/USDT", Side::Buy);
        let ids: Vec<i64> = ordered.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![2, 3, 1], "LIMIT orders must promote lowest-price-first within their tier");
    }

    #[test]
    fn pending_orders_promote_stop_price_ordered_within_a_tier() {
        let repo = InMemoryRepository::new();
        repo.insert_pending_order(sample_pending(1, OrderType::StopMarket, None, Some(dec!(90))));
        repo.insert_pending_order(sample_pending(2, OrderType::StopMarket, None, Some(dec!(80))));

        let ordered = repo.pending_orders_for(1, "BTC/USDT", Side::Buy);
        let ids: Vec<i64> = ordered.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn pending_orders_tier_still_outranks_secondary_key() {
        let repo = InMemoryRepository::new();
        // A high STOP_LIMIT stop price must still sort after a LIMIT
        // order with a much higher price — tier comes first.
        repo.insert_pending_order(sample_pending(1, OrderType::StopLimit, Some(dec!(1)), Some(dec!(1))));
        repo.insert_pending_order(sample_pending(2, OrderType::Limit, Some(dec!(999)), None));

        let ordered = repo.pending_orders_for(1, "BTC/USDT", Side::Buy);
        let ids: Vec<i64> = ordered.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }
}
