//! Record Manager (spec §4.9, component C9): idempotent `Trade`
//! persistence, the optional `TradeExecution` ledger row, and the
//! non-blocking post-commit performance-tracking hook.
//!
//! Idempotency is enforced at two layers, per spec §5's "relying on
//! only one is a defect": [`conduit_core::repository::InMemoryRepository::upsert_trade`]
//! is the application-level SELECT-then-UPDATE-or-INSERT, keyed by
//! `(strategy_account_id, exchange_order_id)`; that same key also
//! stands in for the `UNIQUE` constraint spec §3 mandates at the DB
//! layer — a real RDBMS-backed repository enforces both (an
//! application-level check to avoid a needless constraint-violation
//! round trip, then the constraint itself as the backstop against a
//! concurrent ingestor racing the same key).

use async_trait::async_trait;
use conduit_core::{
    contracts::{PerformanceHook, RecordManager, TradeRecordInput, TradeRecordOutcome},
    error::ExecutionError,
    model::TradeExecution,
    repository::InMemoryRepository,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::warn;

pub struct DefaultRecordManager {
    repository: Arc<InMemoryRepository>,
    performance_hook: Option<Arc<dyn PerformanceHook>>,
}

impl DefaultRecordManager {
    pub fn new(repository: Arc<InMemoryRepository>) -> Self {
        Self {
            repository,
            performance_hook: None,
        }
    }

    /// Attaches the performance-tracking post-commit hook (spec §4.9).
    /// Optional: a deployment with no downstream rollup simply never
    /// calls this, and `create_trade_record` skips the hook entirely.
    pub fn with_performance_hook(mut self, hook: Arc<dyn PerformanceHook>) -> Self {
        self.performance_hook = Some(hook);
        self
    }
}

#[async_trait]
impl RecordManager for DefaultRecordManager {
    async fn create_trade_record(&self, input: TradeRecordInput) -> Result<TradeRecordOutcome, ExecutionError> {
        let trade = input.trade;
        if trade.quantity <= Decimal::ZERO {
            return Err(ExecutionError::Validation("trade.quantity must be positive".to_string()));
        }
        if trade.price <= Decimal::ZERO {
            return Err(ExecutionError::Validation("trade.price must be positive".to_string()));
        }

        let outcome = self.repository.upsert_trade(trade);

        // A no-op write (unchanged cumulative quantity) is the
        // `duplicate_prevented` success spec §7 describes, not an
        // error — no execution-grade row and no post-commit hook for a
        // replay that taught the repository nothing new.
        if !outcome.duplicate_prevented {
            if let Some(detail) = input.execution {
                self.repository.insert_trade_execution(TradeExecution {
                    id: 0,
                    trade_id: outcome.trade.id,
                    venue_trade_id: detail.venue_trade_id,
                    quantity: outcome.quantity_delta.abs(),
                    price: outcome.trade.price,
                    is_maker: detail.is_maker,
                    commission: detail.commission,
                    commission_asset: detail.commission_asset,
                    timestamp: outcome.trade.timestamp,
                });
            }

            if let Some(hook) = &self.performance_hook {
                if let Err(err) = hook.record_trade(&outcome.trade).await {
                    warn!(
                        trade_id = outcome.trade.id,
                        error = %err,
                        "performance-tracking post-commit hook failed; trade persistence stands"
                    );
                }
            }
        }

        Ok(TradeRecordOutcome {
            quantity_delta: outcome.quantity_delta,
            duplicate_prevented: outcome.duplicate_prevented,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use conduit_core::contracts::TradeExecutionDetail;
    use conduit_markets::{OrderType, Side};
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn trade(quantity: Decimal) -> conduit_core::model::Trade {
        conduit_core::model::Trade {
            id: 0,
            strategy_account_id: 1,
            exchange_order_id: "ord-1".to_string(),
            symbol: "BTC/USDT".to_string(),
            side: Side::Buy,
            quantity,
            price: dec!(50000),
            order_price: None,
            order_type: OrderType::Market,
            is_entry: true,
            pnl: None,
            fee: Decimal::ZERO,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn rejects_non_positive_quantity_and_price() {
        let manager = DefaultRecordManager::new(Arc::new(InMemoryRepository::new()));
        let err = manager
            .create_trade_record(TradeRecordInput {
                trade: trade(Decimal::ZERO),
                execution: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Validation(_)));
    }

    #[tokio::test]
    async fn persists_trade_execution_only_on_genuine_new_fill() {
        let repository = Arc::new(InMemoryRepository::new());
        let manager = DefaultRecordManager::new(repository.clone());

        let outcome = manager
            .create_trade_record(TradeRecordInput {
                trade: trade(dec!(0.01)),
                execution: Some(TradeExecutionDetail {
                    venue_trade_id: "venue-1".to_string(),
                    is_maker: true,
                    commission: dec!(0.0001),
                    commission_asset: "BTC".to_string(),
                }),
            })
            .await
            .unwrap();
        assert_eq!(outcome.quantity_delta, dec!(0.01));
        assert_eq!(repository.trade_executions_for(1).len(), 1);

        // A byte-identical replay is duplicate_prevented; no second row.
        let replay = manager
            .create_trade_record(TradeRecordInput {
                trade: trade(dec!(0.01)),
                execution: Some(TradeExecutionDetail {
                    venue_trade_id: "venue-1".to_string(),
                    is_maker: true,
                    commission: dec!(0.0001),
                    commission_asset: "BTC".to_string(),
                }),
            })
            .await
            .unwrap();
        assert!(replay.duplicate_prevented);
        assert_eq!(repository.trade_executions_for(1).len(), 1);
    }

    struct CountingHook(AtomicUsize);

    #[async_trait]
    impl PerformanceHook for CountingHook {
        async fn record_trade(&self, _trade: &conduit_core::model::Trade) -> Result<(), ExecutionError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn performance_hook_runs_once_per_genuine_new_fill_not_per_replay() {
        let repository = Arc::new(InMemoryRepository::new());
        let hook = Arc::new(CountingHook(AtomicUsize::new(0)));
        let manager = DefaultRecordManager::new(repository).with_performance_hook(hook.clone());

        manager
            .create_trade_record(TradeRecordInput { trade: trade(dec!(0.01)), execution: None })
            .await
            .unwrap();
        manager
            .create_trade_record(TradeRecordInput { trade: trade(dec!(0.02)), execution: None })
            .await
            .unwrap();
        manager
            .create_trade_record(TradeRecordInput { trade: trade(dec!(0.02)), execution: None })
            .await
            .unwrap();

        assert_eq!(hook.0.load(Ordering::SeqCst), 2);
    }

    struct FailingHook;

    #[async_trait]
    impl PerformanceHook for FailingHook {
        async fn record_trade(&self, _trade: &conduit_core::model::Trade) -> Result<(), ExecutionError> {
            Err(ExecutionError::Internal("rollup unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn a_failing_hook_never_fails_trade_persistence() {
        let repository = Arc::new(InMemoryRepository::new());
        let manager = DefaultRecordManager::new(repository.clone()).with_performance_hook(Arc::new(FailingHook));

        let outcome = manager
            .create_trade_record(TradeRecordInput { trade: trade(dec!(0.01)), execution: None })
            .await
            .unwrap();
        assert!(!outcome.duplicate_prevented);
    }
}
