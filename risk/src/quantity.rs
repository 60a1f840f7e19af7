//! Quantity Calculator (spec §4.5, component C5): turns a webhook's
//! `qty`/`qty_per` into an absolute order quantity. No floats — every
//! input and intermediate is a [`Decimal`].

use async_trait::async_trait;
use conduit_core::{
    contracts::{PriceResolver, QuantityCalculationInput, QuantityCalculator, QuantityMode},
    error::ExecutionError,
};
use conduit_markets::{OrderType, Side};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::warn;

pub struct DefaultQuantityCalculator {
    price_resolver: Arc<dyn PriceResolver>,
}

impl DefaultQuantityCalculator {
    pub fn new(price_resolver: Arc<dyn PriceResolver>) -> Self {
        Self { price_resolver }
    }

    /// `effective_price` resolution order (spec §4.5):
    /// - MARKET: webhook-supplied price first, else price cache/ticker.
    /// - LIMIT/STOP_LIMIT: always the limit price.
    /// - STOP_MARKET: always the stop price.
    async fn effective_price(&self, input: &QuantityCalculationInput) -> Option<Decimal> {
        match input.order_type {
            OrderType::Market | OrderType::MarketOnClose => {
                if let Some(price) = input.webhook_price {
                    return Some(price);
                }
                self.price_resolver
                    .current_price(input.exchange, input.market, &input.symbol)
                    .await
            }
            OrderType::Limit | OrderType::StopLimit | OrderType::DayLimit => input.limit_price,
            OrderType::StopMarket => input.stop_price,
            OrderType::Cancel | OrderType::CancelAllOrder => None,
        }
    }
}

#[async_trait]
impl QuantityCalculator for DefaultQuantityCalculator {
    async fn calculate(&self, input: QuantityCalculationInput) -> Result<Decimal, ExecutionError> {
        let mode = match &input.mode {
            // Both supplied: qty_per wins and the caller is warned (spec §4.5).
            QuantityMode::Percentage { .. } => input.mode.clone(),
            QuantityMode::Absolute { qty } if *qty <= Decimal::ZERO => {
                return Err(ExecutionError::QuantityCalculation(
                    "qty must be positive; use qty_per=-100 to liquidate".to_string(),
                ))
            }
            QuantityMode::Absolute { qty } => return Ok(*qty),
        };

        let QuantityMode::Percentage { qty_per } = mode else {
            unreachable!("absolute mode returns above");
        };

        if qty_per.is_sign_positive() {
            let effective_price = self
                .effective_price(&input)
                .await
                .filter(|price| *price > Decimal::ZERO)
                .ok_or_else(|| ExecutionError::QuantityCalculation("no effective_price resolvable".to_string()))?;

            let leverage = if input.leverage > Decimal::ZERO {
                input.leverage
            } else {
                Decimal::ONE
            };
            let fraction = *qty_per / Decimal::from(100);
            Ok(input.allocated_capital * fraction / effective_price * leverage)
        } else {
            let Some(position) = input.existing_position.as_ref().filter(|p| !p.is_flat()) else {
                return Err(ExecutionError::QuantityCalculation("no position to liquidate".to_string()));
            };

            let position_sign = if position.is_long() { 1i8 } else { -1i8 };
            if input.side.sign() == position_sign {
                return Err(ExecutionError::QuantityCalculation(
                    "side must be opposite the existing position to liquidate".to_string(),
                ));
            }

            let capped_pct = qty_per.abs().min(Decimal::from(100));
            if *qty_per < -Decimal::from(100) {
                warn!(qty_per = %qty_per, "qty_per below -100, clamped to a full liquidation");
            }
            Ok(position.quantity.abs() * capped_pct / Decimal::from(100))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::model::StrategyPosition;
    use conduit_markets::{ExchangeId, MarketType};
    use rust_decimal_macros::dec;

    struct FixedPriceResolver(Decimal);

    #[async_trait]
    impl PriceResolver for FixedPriceResolver {
        async fn current_price(&self, _exchange: ExchangeId, _market: MarketType, _symbol: &str) -> Option<Decimal> {
            Some(self.0)
        }
    }

    fn base_input(mode: QuantityMode) -> QuantityCalculationInput {
        QuantityCalculationInput {
            mode,
            side: Side::Buy,
            order_type: OrderType::Market,
            allocated_capital: dec!(1000),
            leverage: dec!(1),
            existing_position: None,
            webhook_price: Some(dec!(100)),
            limit_price: None,
            stop_price: None,
            exchange: ExchangeId::Binance,
            market: MarketType::Spot,
            symbol: "BTCUSDT".to_string(),
        }
    }

    #[tokio::test]
    async fn absolute_rejects_non_positive_qty() {
        let calculator = DefaultQuantityCalculator::new(Arc::new(FixedPriceResolver(dec!(100))));
        let err = calculator
            .calculate(base_input(QuantityMode::Absolute { qty: dec!(0) }))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::QuantityCalculation(_)));
    }

    #[tokio::test]
    async fn percentage_entry_uses_webhook_price_over_resolver() {
        let calculator = DefaultQuantityCalculator::new(Arc::new(FixedPriceResolver(dec!(999))));
        let qty = calculator
            .calculate(base_input(QuantityMode::Percentage { qty_per: dec!(10) }))
            .await
            .unwrap();
        // 1000 * 0.10 / 100 * 1 = 1
        assert_eq!(qty, dec!(1));
    }

    #[tokio::test]
    async fn percentage_exit_requires_opposite_side() {
        let calculator = DefaultQuantityCalculator::new(Arc::new(FixedPriceResolver(dec!(100))));
        let mut position = StrategyPosition::new(1, "BTCUSDT");
        position.quantity = dec!(2);
        let mut input = base_input(QuantityMode::Percentage { qty_per: dec!(-50) });
        input.existing_position = Some(position);
        input.side = Side::Buy;

        let err = calculator.calculate(input).await.unwrap_err();
        assert!(matches!(err, ExecutionError::QuantityCalculation(_)));
    }

    #[tokio::test]
    async fn percentage_exit_liquidates_fraction_of_position() {
        let calculator = DefaultQuantityCalculator::new(Arc::new(FixedPriceResolver(dec!(100))));
        let mut position = StrategyPosition::new(1, "BTCUSDT");
        position.quantity = dec!(2);
        let mut input = base_input(QuantityMode::Percentage { qty_per: dec!(-50) });
        input.existing_position = Some(position);
        input.side = Side::Sell;

        let qty = calculator.calculate(input).await.unwrap();
        assert_eq!(qty, dec!(1));
    }
}
