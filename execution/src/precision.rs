//! Adapter-backed [`PrecisionProvider`] (spec §4.3, §4.8): the Symbol
//! Validator / Quantizer needs step/tick/min-notional rules per
//! `(exchange, symbol)`, and every [`ExchangeAdapter`] already carries
//! them via `get_precision` (spec §4.2 — "kept in a statically loaded
//! or periodically refreshed table, not a per-call network round
//! trip"). This just routes the lookup to the right venue's adapter.

use conduit_core::contracts::{ExchangeAdapter, PrecisionProvider};
use conduit_markets::{ExchangeId, MarketType, PrecisionRules};
use std::{collections::HashMap, sync::Arc};

pub struct AdapterPrecisionProvider {
    exchange_adapters: HashMap<ExchangeId, Arc<dyn ExchangeAdapter>>,
}

impl AdapterPrecisionProvider {
    pub fn new(exchange_adapters: HashMap<ExchangeId, Arc<dyn ExchangeAdapter>>) -> Self {
        Self { exchange_adapters }
    }
}

impl PrecisionProvider for AdapterPrecisionProvider {
    /// `market` is unused: every adapter here is venue-scoped, not
    /// market-scoped, and `get_precision` already takes the symbol that
    /// disambiguates spot vs futures listings on venues that share one
    /// adapter across both.
    fn precision(&self, exchange: ExchangeId, _market: MarketType, symbol: &str) -> PrecisionRules {
        self.exchange_adapters
            .get(&exchange)
            .map(|adapter| adapter.get_precision(symbol))
            .unwrap_or(PrecisionRules {
                step_size: rust_decimal::Decimal::ZERO,
                tick_size: rust_decimal::Decimal::ZERO,
                min_notional: rust_decimal::Decimal::ZERO,
                min_qty: rust_decimal::Decimal::ZERO,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use conduit_core::{
        contracts::{CreateOrderRequest, CreateOrderResult, FetchedOrder},
        error::ExecutionError,
    };
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    struct StubAdapter;

    #[async_trait]
    impl ExchangeAdapter for StubAdapter {
        fn exchange(&self) -> ExchangeId {
            ExchangeId::Mock
        }
        async fn create_order(&self, _request: CreateOrderRequest) -> Result<CreateOrderResult, ExecutionError> {
            unreachable!("precision lookup never creates orders")
        }
        async fn cancel_order(&self, _exchange_order_id: &str, _symbol: &str) -> Result<(), ExecutionError> {
            Ok(())
        }
        async fn fetch_order(&self, _exchange_order_id: &str, _symbol: &str) -> Result<FetchedOrder, ExecutionError> {
            unreachable!()
        }
        async fn fetch_open_orders(&self, _symbol: Option<&str>) -> Result<Vec<FetchedOrder>, ExecutionError> {
            Ok(Vec::new())
        }
        async fn fetch_ticker(&self, _symbol: &str) -> Result<Decimal, ExecutionError> {
            Ok(Decimal::ZERO)
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

    #[test]
    fn routes_to_the_registered_adapter() {
        let mut adapters: HashMap<ExchangeId, Arc<dyn ExchangeAdapter>> = HashMap::new();
        adapters.insert(ExchangeId::Mock, Arc::new(StubAdapter));
        let provider = AdapterPrecisionProvider::new(adapters);
        let rules = provider.precision(ExchangeId::Mock, MarketType::Spot, "BTCUSDT");
        assert_eq!(rules.step_size, dec!(0.001));
    }

    #[test]
    fn unregistered_exchange_yields_zeroed_rules() {
        let provider = AdapterPrecisionProvider::new(HashMap::new());
        let rules = provider.precision(ExchangeId::Binance, MarketType::Spot, "BTCUSDT");
        assert_eq!(rules.step_size, Decimal::ZERO);
    }
}
