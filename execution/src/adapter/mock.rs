//! In-memory paper `ExchangeAdapter` (spec §4.2): fills every order
//! immediately at a configured or webhook-supplied price. Used by the
//! webhook's `test_mode` path (spec §4.7) and by integration tests that
//! exercise the orchestrator without a real venue.

use async_trait::async_trait;
use conduit_core::{
    contracts::{CreateOrderRequest, CreateOrderResult, ExchangeAdapter, FetchedOrder},
    error::ExecutionError,
};
use conduit_markets::{ExchangeId, PrecisionRules};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use std::{collections::HashMap, sync::atomic::{AtomicI64, Ordering}};

#[derive(Debug, Clone)]
struct MockOrder {
    status: &'static str,
    filled_quantity: Decimal,
    average_price: Option<Decimal>,
}

pub struct MockAdapter {
    next_order_id: AtomicI64,
    orders: Mutex<HashMap<String, MockOrder>>,
    tickers: RwLock<HashMap<String, Decimal>>,
    balances: RwLock<HashMap<String, Decimal>>,
}

impl MockAdapter {
    pub fn new() -> Self {
        Self {
            next_order_id: AtomicI64::new(1),
            orders: Mutex::new(HashMap::new()),
            tickers: RwLock::new(HashMap::new()),
            balances: RwLock::new(HashMap::new()),
        }
    }

    pub fn set_ticker(&self, symbol: impl Into<String>, price: Decimal) {
        self.tickers.write().insert(symbol.into(), price);
    }

    pub fn set_balance(&self, asset: impl Into<String>, amount: Decimal) {
        self.balances.write().insert(asset.into(), amount);
    }
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeAdapter for MockAdapter {
    fn exchange(&self) -> ExchangeId {
        ExchangeId::Mock
    }

    async fn create_order(&self, request: CreateOrderRequest) -> Result<CreateOrderResult, ExecutionError> {
        let order_id = self.next_order_id.fetch_add(1, Ordering::SeqCst);
        let exchange_order_id = order_id.to_string();
        let fill_price = request
            .price
            .or_else(|| self.tickers.read().get(&request.symbol).copied());

        self.orders.lock().insert(
            exchange_order_id.clone(),
            MockOrder {
                status: "FILLED",
                filled_quantity: request.quantity,
                average_price: fill_price,
            },
        );

        Ok(CreateOrderResult {
            exchange_order_id,
            status: "FILLED".to_string(),
            filled_quantity: request.quantity,
            average_price: fill_price,
            adjusted_quantity: request.quantity,
            adjusted_price: request.price,
            adjusted_stop_price: request.stop_price,
            raw_response: serde_json::Value::Null,
        })
    }

    async fn cancel_order(&self, exchange_order_id: &str, _symbol: &str) -> Result<(), ExecutionError> {
        let mut orders = self.orders.lock();
        match orders.get_mut(exchange_order_id) {
            Some(order) => {
                order.status = "CANCELLED";
                Ok(())
            }
            None => Err(ExecutionError::Exchange(format!("unknown mock order {exchange_order_id}"))),
        }
    }

    async fn fetch_order(&self, exchange_order_id: &str, _symbol: &str) -> Result<FetchedOrder, ExecutionError> {
        let orders = self.orders.lock();
        let order = orders
            .get(exchange_order_id)
            .ok_or_else(|| ExecutionError::Exchange(format!("unknown mock order {exchange_order_id}")))?;
        Ok(FetchedOrder {
            exchange_order_id: exchange_order_id.to_string(),
            status: order.status.to_string(),
            filled_quantity: order.filled_quantity,
            average_price: order.average_price,
        })
    }

    async fn fetch_open_orders(&self, _symbol: Option<&str>) -> Result<Vec<FetchedOrder>, ExecutionError> {
        Ok(Vec::new())
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Decimal, ExecutionError> {
        self.tickers
            .read()
            .get(symbol)
            .copied()
            .ok_or_else(|| ExecutionError::Exchange(format!("no mock ticker set for {symbol}")))
    }

    async fn fetch_balance(&self, asset: &str) -> Result<Decimal, ExecutionError> {
        Ok(self.balances.read().get(asset).copied().unwrap_or(Decimal::ZERO))
    }

    async fn create_batch_orders(
        &self,
        requests: Vec<CreateOrderRequest>,
    ) -> Vec<Result<CreateOrderResult, ExecutionError>> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            results.push(self.create_order(request).await);
        }
        results
    }

    fn get_precision(&self, _symbol: &str) -> PrecisionRules {
        PrecisionRules {
            step_size: Decimal::new(1, 6),
            tick_size: Decimal::new(1, 2),
            min_notional: Decimal::ZERO,
            min_qty: Decimal::new(1, 6),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_markets::{MarketType, OrderType, Side};
    use rust_decimal_macros::dec;

    fn request() -> CreateOrderRequest {
        CreateOrderRequest {
            symbol: "BTCUSDT".to_string(),
            side: Side::Buy,
            order_type: OrderType::Market,
            quantity: dec!(1),
            price: Some(dec!(100)),
            stop_price: None,
            market: MarketType::Spot,
        }
    }

    #[tokio::test]
    async fn create_order_fills_immediately() {
        let adapter = MockAdapter::new();
        let result = adapter.create_order(request()).await.unwrap();
        assert_eq!(result.status, "FILLED");
        assert_eq!(result.average_price, Some(dec!(100)));
    }

    #[tokio::test]
    async fn cancel_order_marks_it_cancelled() {
        let adapter = MockAdapter::new();
        let result = adapter.create_order(request()).await.unwrap();
        adapter.cancel_order(&result.exchange_order_id, "BTCUSDT").await.unwrap();
        let fetched = adapter.fetch_order(&result.exchange_order_id, "BTCUSDT").await.unwrap();
        assert_eq!(fetched.status, "CANCELLED");
    }
}
