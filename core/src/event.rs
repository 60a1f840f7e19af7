//! Event Emitter (spec §4.11, component C10): typed SSE events for
//! order lifecycle, position changes, and batch aggregates.

use crate::model::OpenOrder;
use chrono::{DateTime, Utc};
use conduit_integration::sse::SseFrame;
use conduit_markets::{ExchangeId, OrderType, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum OrderEventType {
    /// A LIMIT/STOP order was admitted to the local queue (spec §11 of
    /// SPEC_FULL.md — distinguished from an exchange-ack'd order so
    /// consumers don't conflate "queued" with "live on the book").
    Queued,
    OrderCreated,
    OrderFilled,
    OrderCancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventAccount {
    pub account_id: i64,
    pub name: String,
    pub exchange: ExchangeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    pub event_type: OrderEventType,
    pub order_id: String,
    pub symbol: String,
    pub strategy_id: i64,
    pub user_id: i64,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Decimal,
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub order_type: OrderType,
    pub stop_price: Option<Decimal>,
    pub account: EventAccount,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum PositionEventType {
    PositionCreated,
    PositionUpdated,
    PositionClosed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionEvent {
    pub event_type: PositionEventType,
    pub position_id: String,
    pub symbol: String,
    pub strategy_id: i64,
    pub user_id: i64,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub timestamp: DateTime<Utc>,
    pub previous_quantity: Option<Decimal>,
    pub account: EventAccount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderTypeSummary {
    pub order_type: OrderType,
    pub created: u32,
    pub cancelled: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBatchEvent {
    pub summaries: Vec<OrderTypeSummary>,
    pub strategy_id: i64,
    pub user_id: i64,
    pub timestamp: DateTime<Utc>,
}

/// Raised when a price field required for event emission is missing
/// (spec §4.11: "strict... Missing required field raises and aborts
/// emission, not a silent fallback").
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum PriceExtractionError {
    #[error("MARKET order filled but has no average_price")]
    MissingAveragePrice,
    #[error("{order_type:?} order has neither adjusted_price nor price")]
    MissingLimitPrice { order_type: OrderType },
    #[error("STOP_MARKET order has no stop_price")]
    MissingStopPrice,
}

/// Inputs available when an order-event price must be extracted (spec
/// §4.11): which fields are present depends on order type and fill
/// state, not on a single "the" price field.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceInputs {
    pub average_price: Option<Decimal>,
    pub adjusted_price: Option<Decimal>,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub is_filled: bool,
}

/// Strict price extraction for an order event (spec §4.11): MARKET
/// unfilled ⇒ 0; MARKET filled ⇒ requires `average_price`; LIMIT /
/// STOP_LIMIT ⇒ requires `price` (prefers `adjusted_price`);
/// STOP_MARKET ⇒ requires `stop_price`.
pub fn extract_event_price(
    order_type: OrderType,
    inputs: PriceInputs,
) -> Result<Decimal, PriceExtractionError> {
    match order_type {
        OrderType::Market | OrderType::MarketOnClose => {
            if !inputs.is_filled {
                return Ok(Decimal::ZERO);
            }
            inputs
                .average_price
                .ok_or(PriceExtractionError::MissingAveragePrice)
        }
        OrderType::Limit | OrderType::StopLimit | OrderType::DayLimit => inputs
            .adjusted_price
            .or(inputs.price)
            .ok_or(PriceExtractionError::MissingLimitPrice { order_type }),
        OrderType::StopMarket => inputs.stop_price.ok_or(PriceExtractionError::MissingStopPrice),
        OrderType::Cancel | OrderType::CancelAllOrder => Ok(Decimal::ZERO),
    }
}

/// Smart dispatch rule for fills (spec §4.11): a fill on an order never
/// persisted locally (fast MARKET) always emits the full filled
/// quantity; a fill on a persisted [`OpenOrder`] emits only the delta
/// against the last-known `filled_quantity`.
pub fn fill_event_quantity(existing: Option<&OpenOrder>, new_filled_quantity: Decimal) -> Decimal {
    match existing {
        Some(order) => new_filled_quantity - order.filled_quantity,
        None => new_filled_quantity,
    }
}

/// Emits typed events onto an SSE bus, fanned out by `user_id` (spec
/// §4.11, §6). `conduit-core` defines the contract; a deployment's
/// actual fan-out (per-user broadcast channels, a pub/sub bus, ...) is
/// an external collaborator.
pub trait EventEmitter: Send + Sync {
    fn emit_order(&self, event: OrderEvent);
    fn emit_position(&self, event: PositionEvent);
    fn emit_order_batch(&self, event: OrderBatchEvent);
}

/// Reference emitter used by tests and single-process deployments:
/// renders every event to its SSE wire frame and stores the frames for
/// later inspection rather than fanning out over a network.
#[derive(Debug, Default)]
pub struct RecordingEventEmitter {
    frames: parking_lot::Mutex<Vec<String>>,
}

impl RecordingEventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<String> {
        self.frames.lock().clone()
    }

    fn record(&self, event_name: &str, payload: &impl Serialize) {
        if let Ok(frame) = SseFrame::new(Some(event_name), payload) {
            self.frames.lock().push(frame.render());
        }
    }
}

impl EventEmitter for RecordingEventEmitter {
    fn emit_order(&self, event: OrderEvent) {
        let name = match event.event_type {
            OrderEventType::Queued => "order_queued",
            OrderEventType::OrderCreated => "order_created",
            OrderEventType::OrderFilled => "order_filled",
            OrderEventType::OrderCancelled => "order_cancelled",
        };
        self.record(name, &event);
    }

    fn emit_position(&self, event: PositionEvent) {
        let name = match event.event_type {
            PositionEventType::PositionCreated => "position_created",
            PositionEventType::PositionUpdated => "position_updated",
            PositionEventType::PositionClosed => "position_closed",
        };
        self.record(name, &event);
    }

    fn emit_order_batch(&self, event: OrderBatchEvent) {
        self.record("order_batch_event", &event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn market_unfilled_extracts_zero() {
        let price = extract_event_price(
            OrderType::Market,
            PriceInputs {
                is_filled: false,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(price, Decimal::ZERO);
    }

    #[test]
    fn market_filled_without_average_price_is_an_error() {
        let err = extract_event_price(
            OrderType::Market,
            PriceInputs {
                is_filled: true,
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(err, PriceExtractionError::MissingAveragePrice);
    }

    #[test]
    fn stop_market_requires_stop_price() {
        let err = extract_event_price(OrderType::StopMarket, PriceInputs::default()).unwrap_err();
        assert_eq!(err, PriceExtractionError::MissingStopPrice);
    }

    #[test]
    fn limit_prefers_adjusted_price() {
        let price = extract_event_price(
            OrderType::Limit,
            PriceInputs {
                adjusted_price: Some(dec!(100)),
                price: Some(dec!(99)),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(price, dec!(100));
    }

    #[test]
    fn fill_delta_is_full_quantity_when_never_persisted() {
        assert_eq!(fill_event_quantity(None, dec!(0.02)), dec!(0.02));
    }
}
