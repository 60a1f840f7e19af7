//! Order Queue Manager (spec §4.6, component C6): admits LIMIT/STOP
//! orders unconditionally, priced by [`conduit_markets::OrderType::base_priority`],
//! and leaves capacity enforcement to [`DefaultOrderQueueManager::promote_ready`]
//! — the background rebalancer every deployment schedules per
//! `(strategy_account, symbol)` — so a burst of signals never rejects
//! an admission outright.

use chrono::Utc;
use conduit_core::{
    contracts::{EnqueueOutcome, EnqueueRequest, OrderQueueManager},
    model::PendingOrder,
    repository::InMemoryRepository,
};
use conduit_markets::{ExchangeId, ExchangeLimits, MarketType, Side};
use std::sync::{atomic::{AtomicI64, Ordering}, Arc};

pub struct DefaultOrderQueueManager {
    repository: Arc<InMemoryRepository>,
    next_id: AtomicI64,
}

impl DefaultOrderQueueManager {
    pub fn new(repository: Arc<InMemoryRepository>) -> Self {
        Self {
            repository,
            next_id: AtomicI64::new(1),
        }
    }

    /// The background rebalancer (spec §4.6): pulls this
    /// `(strategy_account, symbol, side)`'s queued orders in priority
    /// order and promotes as many as the venue's current side-split
    /// capacity allows, removing them from the queue. Callers submit
    /// the returned orders to the exchange; anything left behind stays
    /// queued for the next rebalancer pass. The capacity split and the
    /// LIMIT/STOP live-order invariant (spec §4.6) are both scoped per
    /// side, so BUY and SELL backlogs for the same symbol never share
    /// a window.
    pub fn promote_ready(
        &self,
        strategy_account_id: i64,
        symbol: &str,
        side: Side,
        exchange: ExchangeId,
        market: MarketType,
    ) -> Vec<PendingOrder> {
        let split = ExchangeLimits::split_sides(ExchangeLimits::capacity(exchange, market));
        let pending = self.repository.pending_orders_for(strategy_account_id, symbol, side);

        let mut promoted = Vec::new();
        let (mut limit_used, mut stop_used) = (0u32, 0u32);
        for order in pending {
            if order.order_type.is_stop() {
                if stop_used >= split.max_stop_per_side {
                    continue;
                }
                stop_used += 1;
            } else {
                if limit_used >= split.max_limit_per_side {
                    continue;
                }
                limit_used += 1;
            }
            promoted.push(order);
        }

        for order in &promoted {
            self.repository.delete_pending_order(order.id);
        }
        promoted
    }
}

impl OrderQueueManager for DefaultOrderQueueManager {
    fn enqueue(&self, request: EnqueueRequest) -> EnqueueOutcome {
        let priority = request.order_type.base_priority();
        let pending_order = PendingOrder {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            strategy_account_id: request.strategy_account_id,
            symbol: request.symbol,
            side: request.side,
            order_type: request.order_type,
            quantity: request.quantity,
            price: request.price,
            stop_price: request.stop_price,
            priority,
            reason: None,
            enqueued_at: Utc::now(),
        };

        if request.commit {
            self.repository.insert_pending_order(pending_order.clone());
        }

        EnqueueOutcome { pending_order, priority }
    }
}
