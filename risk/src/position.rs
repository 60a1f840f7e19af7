//! Position Manager (spec §4.8, component C7): row-locked application
//! of fills to [`StrategyPosition`], realized-PnL computation, and
//! position event emission.

use async_trait::async_trait;
use chrono::Utc;
use conduit_core::{
    contracts::{FillContext, FillOutcome, PositionManager, PrecisionProvider, PriceResolver},
    error::ExecutionError,
    event::{EventAccount, EventEmitter, PositionEvent, PositionEventType},
    model::StrategyPosition,
    repository::{InMemoryRepository, PositionLockOutcome},
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::warn;

pub struct DefaultPositionManager {
    repository: Arc<InMemoryRepository>,
    price_resolver: Arc<dyn PriceResolver>,
    precision_provider: Arc<dyn PrecisionProvider>,
    event_emitter: Arc<dyn EventEmitter>,
}

impl DefaultPositionManager {
    pub fn new(
        repository: Arc<InMemoryRepository>,
        price_resolver: Arc<dyn PriceResolver>,
        precision_provider: Arc<dyn PrecisionProvider>,
        event_emitter: Arc<dyn EventEmitter>,
    ) -> Self {
        Self {
            repository,
            price_resolver,
            precision_provider,
            event_emitter,
        }
    }
}

struct UpdateOutcome {
    event_type: PositionEventType,
    quantity: Decimal,
    entry_price: Decimal,
    previous_quantity: Option<Decimal>,
    realized_pnl: Decimal,
    position_closed: bool,
}

/// Floors `value` to the nearest non-negative multiple of `step`;
/// `step <= 0` means no quantization.
fn floor_to_step(value: Decimal, step: Decimal) -> Decimal {
    if step <= Decimal::ZERO {
        return value;
    }
    (value / step).floor() * step
}

/// -1 / 0 / 1, since `Decimal` has no inherent `signum`.
fn sign_of(value: Decimal) -> Decimal {
    if value.is_sign_positive() && !value.is_zero() {
        Decimal::ONE
    } else if value.is_sign_negative() && !value.is_zero() {
        -Decimal::ONE
    } else {
        Decimal::ZERO
    }
}

#[async_trait]
impl PositionManager for DefaultPositionManager {
    async fn process_order_fill(&self, ctx: FillContext) -> Result<FillOutcome, ExecutionError> {
        if ctx.quantity_delta <= Decimal::ZERO {
            return Ok(FillOutcome::Skipped {
                reason: "no new fill quantity for this order_id",
            });
        }

        let price = match ctx.local_result.average_price {
            Some(price) if price > Decimal::ZERO => price,
            _ => self
                .price_resolver
                .current_price(ctx.exchange, ctx.market, &ctx.symbol)
                .await
                .filter(|price| *price > Decimal::ZERO)
                .ok_or(ExecutionError::ExecutionPriceUnavailable)?,
        };

        let rules = self.precision_provider.precision(ctx.exchange, ctx.market, &ctx.symbol);
        let min_keep = rules.step_size.max(rules.min_qty).max(Decimal::new(1, 6));

        let trade_qty = match ctx.side.sign() {
            1 => ctx.quantity_delta,
            _ => -ctx.quantity_delta,
        };

        let lock_outcome = self.repository.with_position_lock(ctx.strategy_account_id, &ctx.symbol, |slot| {
            let previous_quantity = slot.as_ref().map(|p| p.quantity);
            let mut position = slot.clone().unwrap_or_else(|| StrategyPosition::new(ctx.strategy_account_id, ctx.symbol.clone()));
            let current = position.quantity;

            let (new_quantity, new_entry, realized_pnl) = if current == Decimal::ZERO {
                (trade_qty, price, Decimal::ZERO)
            } else if sign_of(current) == sign_of(trade_qty) {
                let total = current.abs() + trade_qty.abs();
                let weighted_entry = (position.entry_price * current.abs() + price * trade_qty.abs()) / total;
                (current + trade_qty, weighted_entry, Decimal::ZERO)
            } else {
                let closing_qty = current.abs().min(trade_qty.abs());
                let realized_pnl = if current > Decimal::ZERO {
                    closing_qty * (price - position.entry_price)
                } else {
                    closing_qty * (position.entry_price - price)
                };
                let residual = current + trade_qty;
                let entry = if residual == Decimal::ZERO || sign_of(residual) == sign_of(current) {
                    position.entry_price
                } else {
                    price
                };
                (residual, entry, realized_pnl)
            };

            let quantized = floor_to_step(new_quantity.abs(), rules.step_size) * sign_of(new_quantity);
            position.quantity = quantized;
            position.entry_price = new_entry;
            position.last_updated = Utc::now();

            let closed = quantized.abs() < min_keep;
            if closed {
                *slot = None;
            } else {
                *slot = Some(position.clone());
            }

            let event_type = match (previous_quantity, closed) {
                (_, true) => PositionEventType::PositionClosed,
                (None, false) => PositionEventType::PositionCreated,
                (Some(_), false) => PositionEventType::PositionUpdated,
            };

            UpdateOutcome {
                event_type,
                quantity: quantized,
                entry_price: new_entry,
                previous_quantity,
                realized_pnl,
                position_closed: closed,
            }
        });

        let outcome = match lock_outcome {
            PositionLockOutcome::Applied(outcome) => outcome,
            PositionLockOutcome::LockContention => {
                return Ok(FillOutcome::Skipped {
                    reason: "lock_contention",
                })
            }
        };

        if outcome.realized_pnl != Decimal::ZERO {
            self.repository.reflect_realized_pnl(ctx.strategy_account_id, outcome.realized_pnl);
        }

        if outcome.position_closed {
            // Capital-reallocation is a separate, non-blocking step that
            // must never roll back the position deletion above; this
            // in-memory repository has nothing further to reconcile, so
            // the hook is a no-op placeholder for a real deployment's
            // rebalancing job.
        }

        self.event_emitter.emit_position(PositionEvent {
            event_type: outcome.event_type,
            position_id: format!("{}:{}", ctx.strategy_account_id, ctx.symbol),
            symbol: ctx.symbol.clone(),
            strategy_id: ctx.strategy_id,
            user_id: ctx.user_id,
            quantity: outcome.quantity,
            entry_price: outcome.entry_price,
            timestamp: Utc::now(),
            previous_quantity: outcome.previous_quantity,
            account: EventAccount {
                account_id: 0,
                name: String::new(),
                exchange: ctx.exchange,
            },
        });

        if outcome.realized_pnl == Decimal::ZERO && !matches!(outcome.event_type, PositionEventType::PositionCreated) {
            warn!(order_id = %ctx.order_id, "fill applied with zero realized pnl on an existing position");
        }

        Ok(FillOutcome::Applied {
            realized_pnl: outcome.realized_pnl,
            position_closed: outcome.position_closed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::contracts::CreateOrderResult;
    use conduit_core::event::RecordingEventEmitter;
    use conduit_markets::{ExchangeId, MarketType, OrderType, PrecisionRules, Side};
    use rust_decimal_macros::dec;

    struct FixedPrice(Decimal);
    #[async_trait]
    impl PriceResolver for FixedPrice {
        async fn current_price(&self, _exchange: ExchangeId, _market: MarketType, _symbol: &str) -> Option<Decimal> {
            Some(self.0)
        }
    }

    struct FixedPrecision;
    impl PrecisionProvider for FixedPrecision {
        fn precision(&self, _exchange: ExchangeId, _market: MarketType, _symbol: &str) -> PrecisionRules {
            PrecisionRules {
                step_size: dec!(0.001),
                tick_size: dec!(0.01),
                min_notional: dec!(10),
                min_qty: dec!(0.001),
            }
        }
    }

    fn ctx(quantity_delta: Decimal, side: Side, average_price: Decimal) -> FillContext {
        FillContext {
            strategy_account_id: 1,
            strategy_id: 1,
            user_id: 1,
            symbol: "BTCUSDT".to_string(),
            side,
            order_id: "ord-1".to_string(),
            order_type: OrderType::Market,
            local_result: CreateOrderResult {
                exchange_order_id: "ord-1".to_string(),
                status: "FILLED".to_string(),
                filled_quantity: quantity_delta,
                average_price: Some(average_price),
                adjusted_quantity: quantity_delta,
                adjusted_price: Some(average_price),
                adjusted_stop_price: None,
                raw_response: serde_json::Value::Null,
            },
            quantity_delta,
            exchange: ExchangeId::Binance,
            market: MarketType::Spot,
        }
    }

    fn manager() -> DefaultPositionManager {
        DefaultPositionManager::new(
            Arc::new(InMemoryRepository::new()),
            Arc::new(FixedPrice(dec!(100))),
            Arc::new(FixedPrecision),
            Arc::new(RecordingEventEmitter::new()),
        )
    }

    #[tokio::test]
    async fn opens_a_new_position_on_first_fill() {
        let manager = manager();
        let outcome = manager.process_order_fill(ctx(dec!(1), Side::Buy, dec!(100))).await.unwrap();
        assert_eq!(outcome, FillOutcome::Applied { realized_pnl: Decimal::ZERO, position_closed: false });
        let position = manager.repository.find_position(1, "BTCUSDT").unwrap();
        assert_eq!(position.quantity, dec!(1));
        assert_eq!(position.entry_price, dec!(100));
    }

    #[tokio::test]
    async fn closing_trade_realizes_pnl_and_deletes_the_row() {
        let manager = manager();
        manager.process_order_fill(ctx(dec!(1), Side::Buy, dec!(100))).await.unwrap();
        let outcome = manager.process_order_fill(ctx(dec!(1), Side::Sell, dec!(110))).await.unwrap();
        match outcome {
            FillOutcome::Applied { realized_pnl, position_closed } => {
                assert_eq!(realized_pnl, dec!(10));
                assert!(position_closed);
            }
            FillOutcome::Skipped { .. } => panic!("expected applied"),
        }
        assert!(manager.repository.find_position(1, "BTCUSDT").is_none());
    }

    #[tokio::test]
    async fn duplicate_delta_is_skipped() {
        let manager = manager();
        let outcome = manager.process_order_fill(ctx(Decimal::ZERO, Side::Buy, dec!(100))).await.unwrap();
        assert_eq!(outcome, FillOutcome::Skipped { reason: "no new fill quantity for this order_id" });
    }
}
