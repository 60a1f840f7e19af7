//! Order Manager (spec §4.10, component C8): cancellation and the
//! periodic reconciler that re-fetches every [`OpenOrder`] older than a
//! threshold and applies whatever terminal transition the venue now
//! reports.

use async_trait::async_trait;
use chrono::Utc;
use conduit_core::{
    contracts::{CancelAllOutcome, CancelFilter, ExchangeAdapter, OrderManager},
    error::ExecutionError,
    model::{OpenOrder, OpenOrderStatus},
    repository::InMemoryRepository,
};
use conduit_markets::{CanonicalStatus, ExchangeId, StatusTransformer};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tracing::warn;

pub struct DefaultOrderManager {
    repository: Arc<InMemoryRepository>,
    exchange_adapters: HashMap<ExchangeId, Arc<dyn ExchangeAdapter>>,
    /// [`OpenOrder`]s older than this are eligible for `reconcile_open_orders`.
    reconcile_after: Duration,
}

impl DefaultOrderManager {
    pub fn new(
        repository: Arc<InMemoryRepository>,
        exchange_adapters: HashMap<ExchangeId, Arc<dyn ExchangeAdapter>>,
        reconcile_after: Duration,
    ) -> Self {
        Self {
            repository,
            exchange_adapters,
            reconcile_after,
        }
    }

    fn exchange_for(&self, strategy_account_id: i64) -> Result<ExchangeId, ExecutionError> {
        let link = self
            .repository
            .find_strategy_account(strategy_account_id)
            .ok_or_else(|| ExecutionError::Internal(format!("unknown strategy_account {strategy_account_id}")))?;
        let account = self
            .repository
            .find_account(link.account_id)
            .ok_or_else(|| ExecutionError::Internal(format!("unknown account {}", link.account_id)))?;
        Ok(account.exchange)
    }

    fn adapter_for(&self, exchange: ExchangeId) -> Result<&Arc<dyn ExchangeAdapter>, ExecutionError> {
        self.exchange_adapters
            .get(&exchange)
            .ok_or_else(|| ExecutionError::Internal(format!("no adapter registered for {exchange}")))
    }

    fn matches_filter(&self, order: &OpenOrder, filter: &CancelFilter) -> bool {
        let Some(link) = self.repository.find_strategy_account(order.strategy_account_id) else {
            return false;
        };
        if link.strategy_id != filter.strategy_id {
            return false;
        }
        if let Some(account_id) = filter.account_id {
            if link.account_id != account_id {
                return false;
            }
        }
        let Some(account) = self.repository.find_account(link.account_id) else {
            return false;
        };
        if account.user_id != filter.user_id {
            return false;
        }
        if let Some(symbol) = &filter.symbol {
            if &order.symbol != symbol {
                return false;
            }
        }
        if let Some(side) = filter.side {
            if order.side != side {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl OrderManager for DefaultOrderManager {
    async fn cancel_order(&self, exchange_order_id: &str, symbol: &str, account_id: i64) -> Result<(), ExecutionError> {
        let Some(open_order) = self.repository.find_open_order(exchange_order_id) else {
            return Err(ExecutionError::Validation(format!("no open order {exchange_order_id}")));
        };
        if open_order.strategy_account_id != account_id {
            return Err(ExecutionError::Auth(
                "exchange_order_id does not belong to the requesting account".to_string(),
            ));
        }

        let exchange = self.exchange_for(account_id)?;
        let adapter = self.adapter_for(exchange)?;
        adapter.cancel_order(exchange_order_id, symbol).await?;
        self.repository.delete_open_order(exchange_order_id);
        Ok(())
    }

    async fn cancel_all_orders(&self, filter: CancelFilter) -> CancelAllOutcome {
        let candidates: Vec<OpenOrder> = self
            .repository
            .all_open_orders()
            .into_iter()
            .filter(|order| self.matches_filter(order, &filter))
            .collect();

        let mut cancelled_orders = Vec::new();
        let mut failed_orders = Vec::new();

        for order in candidates {
            let result = async {
                let exchange = self.exchange_for(order.strategy_account_id)?;
                let adapter = self.adapter_for(exchange)?;
                adapter.cancel_order(&order.exchange_order_id, &order.symbol).await
            }
            .await;

            match result {
                Ok(()) => {
                    self.repository.delete_open_order(&order.exchange_order_id);
                    cancelled_orders.push(order);
                }
                Err(err) => failed_orders.push((order.exchange_order_id.clone(), err)),
            }
        }

        CancelAllOutcome {
            cancelled_orders,
            failed_orders,
        }
    }

    /// Spec §4.10: re-fetches every [`OpenOrder`] older than
    /// `reconcile_after` and applies the authoritative status. A
    /// terminal status deletes the row; anything still open is
    /// refreshed in place. Individual fetch failures are logged and
    /// skipped rather than aborting the whole pass.
    async fn reconcile_open_orders(&self) -> Result<(), ExecutionError> {
        let threshold = Utc::now() - chrono::Duration::from_std(self.reconcile_after).unwrap_or(chrono::Duration::zero());
        let transformer = StatusTransformer::default();

        let stale: Vec<OpenOrder> = self
            .repository
            .all_open_orders()
            .into_iter()
            .filter(|order| order.updated_at <= threshold)
            .collect();

        for order in stale {
            let Ok(exchange) = self.exchange_for(order.strategy_account_id) else {
                continue;
            };
            let Ok(adapter) = self.adapter_for(exchange) else {
                continue;
            };
            match adapter.fetch_order(&order.exchange_order_id, &order.symbol).await {
                Ok(fetched) => {
                    let canonical = transformer.transform(&fetched.status, exchange).known();
                    if matches!(
                        canonical,
                        Some(CanonicalStatus::Filled)
                            | Some(CanonicalStatus::Cancelled)
                            | Some(CanonicalStatus::Rejected)
                            | Some(CanonicalStatus::Expired)
                            | Some(CanonicalStatus::Failed)
                    ) {
                        self.repository.delete_open_order(&order.exchange_order_id);
                    } else {
                        let status = match canonical {
                            Some(CanonicalStatus::PartiallyFilled) => OpenOrderStatus::PartiallyFilled,
                            Some(CanonicalStatus::New) | Some(CanonicalStatus::Pending) => OpenOrderStatus::New,
                            _ => OpenOrderStatus::Open,
                        };
                        let mut refreshed = order;
                        refreshed.filled_quantity = fetched.filled_quantity;
                        refreshed.status = status;
                        refreshed.updated_at = Utc::now();
                        self.repository.upsert_open_order(refreshed);
                    }
                }
                Err(err) => {
                    warn!(exchange_order_id = %order.exchange_order_id, error = %err, "reconciliation fetch_order failed, will retry next pass");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use conduit_core::{
        contracts::{CreateOrderRequest, CreateOrderResult, FetchedOrder},
        model::{Account, AccountType, StrategyAccount},
    };
    use conduit_markets::{MarketType, OrderType, PrecisionRules, Side};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    struct StubAdapter;

    #[async_trait]
    impl ExchangeAdapter for StubAdapter {
        fn exchange(&self) -> ExchangeId {
            ExchangeId::Mock
        }
        async fn create_order(&self, _request: CreateOrderRequest) -> Result<CreateOrderResult, ExecutionError> {
            unimplemented!()
        }
        async fn cancel_order(&self, _exchange_order_id: &str, _symbol: &str) -> Result<(), ExecutionError> {
            Ok(())
        }
        async fn fetch_order(&self, exchange_order_id: &str, _symbol: &str) -> Result<FetchedOrder, ExecutionError> {
            Ok(FetchedOrder {
                exchange_order_id: exchange_order_id.to_string(),
                status: "FILLED".to_string(),
                filled_quantity: dec!(1),
                average_price: Some(dec!(100)),
            })
        }
        async fn fetch_open_orders(&self, _symbol: Option<&str>) -> Result<Vec<FetchedOrder>, ExecutionError> {
            Ok(Vec::new())
        }
        async fn fetch_ticker(&self, _symbol: &str) -> Result<Decimal, ExecutionError> {
            Ok(dec!(100))
        }
        async fn fetch_balance(&self, _asset: &str) -> Result<Decimal, ExecutionError> {
            Ok(Decimal::ZERO)
        }
        async fn create_batch_orders(&self, _requests: Vec<CreateOrderRequest>) -> Vec<Result<CreateOrderResult, ExecutionError>> {
            Vec::new()
        }
        fn get_precision(&self, _symbol: &str) -> PrecisionRules {
            PrecisionRules {
                step_size: dec!(0.001),
                tick_size: dec!(0.01),
                min_notional: dec!(10),
                min_qty: dec!(0.001),
            }
        }
    }

    fn manager_with_order() -> (DefaultOrderManager, Arc<InMemoryRepository>) {
        let repository = Arc::new(InMemoryRepository::new());
        repository.insert_account(Account {
            id: 1,
            user_id: 1,
            exchange: ExchangeId::Mock,
            account_type: AccountType::Crypto,
            encrypted_public_key: String::new(),
            encrypted_secret_key: String::new(),
            passphrase: None,
            is_testnet: true,
            is_active: true,
        });
        repository.insert_strategy_account(StrategyAccount {
            id: 1,
            strategy_id: 1,
            account_id: 1,
            weight: dec!(1),
            leverage: dec!(1),
            max_symbols: None,
            is_active: true,
        });
        repository.upsert_open_order(OpenOrder {
            exchange_order_id: "abc".to_string(),
            strategy_account_id: 1,
            symbol: "BTCUSDT".to_string(),
            side: Side::Buy,
            order_type: OrderType::Limit,
            quantity: dec!(1),
            filled_quantity: Decimal::ZERO,
            price: Some(dec!(100)),
            stop_price: None,
            status: OpenOrderStatus::New,
            market_type: MarketType::Spot,
            created_at: Utc::now(),
            updated_at: Utc::now() - chrono::Duration::hours(1),
        });

        let mut adapters: HashMap<ExchangeId, Arc<dyn ExchangeAdapter>> = HashMap::new();
        adapters.insert(ExchangeId::Mock, Arc::new(StubAdapter));
        let manager = DefaultOrderManager::new(repository.clone(), adapters, Duration::from_secs(1));
        (manager, repository)
    }

    #[tokio::test]
    async fn cancel_order_rejects_mismatched_account() {
        let (manager, _repo) = manager_with_order();
        let err = manager.cancel_order("abc", "BTCUSDT", 2).await.unwrap_err();
        assert!(matches!(err, ExecutionError::Auth(_)));
    }

    #[tokio::test]
    async fn cancel_order_deletes_the_open_order_row() {
        let (manager, repo) = manager_with_order();
        manager.cancel_order("abc", "BTCUSDT", 1).await.unwrap();
        assert!(repo.find_open_order("abc").is_none());
    }

    #[tokio::test]
    async fn reconcile_deletes_orders_the_adapter_reports_filled() {
        let (manager, repo) = manager_with_order();
        manager.reconcile_open_orders().await.unwrap();
        assert!(repo.find_open_order("abc").is_none());
    }
}
