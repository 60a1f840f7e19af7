//! Trading Core (spec §4.7, component C11): orchestrates a single
//! signal end to end. This is the "root struct/bundle" spec §9's
//! redesign note calls for — every collaborator is an explicit field,
//! wired at construction time, never a global.

use crate::{
    config::TradingConfig,
    contracts::{
        CreateOrderRequest, CreateOrderResult, EnqueueRequest, ExchangeAdapter, FillContext,
        FillOutcome, OrderQueueManager, PositionManager, PrecisionProvider, QuantityCalculationInput,
        QuantityCalculator, QuantityMode, RecordManager, TradeRecordInput,
    },
    error::ExecutionError,
    event::{
        extract_event_price, EventAccount, EventEmitter, OrderEvent, OrderEventType, OrderTypeSummary,
        OrderBatchEvent, PriceInputs,
    },
    model::{OpenOrder, OpenOrderStatus, Trade},
    repository::InMemoryRepository,
    webhook::{AccountResultSummary, PerformanceMetrics, WebhookOrder, WebhookRequest, WebhookResponse, WebhookSummary},
};
use chrono::Utc;
use conduit_markets::{quantize::validate_order_params, ExchangeId, OrderType, QuantizeError};
use rust_decimal::Decimal;
use std::{collections::HashMap, sync::Arc, time::{Duration, Instant}};
use tokio::sync::Semaphore;
use tracing::{info, warn};

pub struct TradingCore {
    pub repository: Arc<InMemoryRepository>,
    pub quantity_calculator: Arc<dyn QuantityCalculator>,
    pub queue_manager: Arc<dyn OrderQueueManager>,
    pub position_manager: Arc<dyn PositionManager>,
    pub record_manager: Arc<dyn RecordManager>,
    pub event_emitter: Arc<dyn EventEmitter>,
    pub exchange_adapters: HashMap<ExchangeId, Arc<dyn ExchangeAdapter>>,
    pub precision_provider: Arc<dyn PrecisionProvider>,
    pub config: TradingConfig,
}

struct AccountOutcome {
    summary: AccountResultSummary,
    order_type: OrderType,
    created: bool,
    cancelled: bool,
}

impl TradingCore {
    /// Signal execution algorithm (spec §4.7).
    pub async fn execute_signal(&self, request: WebhookRequest) -> WebhookResponse {
        let validation_started = Instant::now();

        let Some(strategy) = self.repository.find_strategy_by_group_name(&request.group_name) else {
            return self.rejected_response(&request, ExecutionError::Auth("unknown strategy".into()));
        };
        if !strategy.is_active {
            return self.rejected_response(&request, ExecutionError::Auth("strategy inactive".into()));
        }
        if !request.test_mode && !strategy.authorizes(&request.token) {
            return self.rejected_response(&request, ExecutionError::Auth("invalid token".into()));
        }
        let validation_time_ms = validation_started.elapsed().as_millis() as u64;

        let preprocessing_started = Instant::now();
        let links = self.repository.active_strategy_accounts(strategy.id);
        let total_accounts = links.len() as u32;
        let preprocessing_time_ms = preprocessing_started.elapsed().as_millis() as u64;

        let orders = request.orders();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_workers.max(1)));

        let mut handles = Vec::with_capacity(links.len());
        for link in links {
            for order in &orders {
                let order = (*order).clone();
                let semaphore = semaphore.clone();
                let link = link.clone();
                let strategy = strategy.clone();
                let deadline = self.config.batch_account_timeout;
                let fut = async move {
                    let _permit = semaphore.acquire_owned().await.expect("semaphore never closed");
                    tokio::time::timeout(deadline, self.execute_for_account(&strategy, &link, &order)).await
                };
                handles.push(fut);
            }
        }

        let results = futures::future::join_all(handles).await;

        let mut outcomes = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(_elapsed) => outcomes.push(AccountOutcome {
                    summary: AccountResultSummary {
                        account_id: 0,
                        success: false,
                        queued: false,
                        priority: None,
                        filled_quantity: None,
                        average_price: None,
                        error: Some("per-account deadline exceeded".to_string()),
                        error_type: Some("timeout_error".to_string()),
                    },
                    order_type: OrderType::Market,
                    created: false,
                    cancelled: false,
                }),
            }
        }

        let successful_trades = outcomes.iter().filter(|o| o.summary.success).count() as u32;
        let failed_trades = outcomes.iter().filter(|o| !o.summary.success).count() as u32;

        if successful_trades > 1 {
            self.emit_batch_summary(&outcomes, strategy.id, strategy.user_id);
        }

        WebhookResponse {
            action: "execute".to_string(),
            strategy: strategy.group_name.clone(),
            market_type: strategy.market_type.to_string(),
            success: failed_trades == 0,
            results: outcomes.into_iter().map(|o| o.summary).collect(),
            summary: WebhookSummary {
                total_accounts,
                executed_accounts: total_accounts,
                successful_trades,
                failed_trades,
                inactive_accounts: 0,
            },
            performance_metrics: PerformanceMetrics {
                validation_time_ms,
                preprocessing_time_ms,
                total_processing_time_ms: validation_started.elapsed().as_millis() as u64,
            },
        }
    }

    fn rejected_response(&self, request: &WebhookRequest, error: ExecutionError) -> WebhookResponse {
        WebhookResponse {
            action: "execute".to_string(),
            strategy: request.group_name.clone(),
            market_type: "UNKNOWN".to_string(),
            success: false,
            results: vec![AccountResultSummary {
                account_id: 0,
                success: false,
                queued: false,
                priority: None,
                filled_quantity: None,
                average_price: None,
                error: Some(error.short_message()),
                error_type: Some(error.error_type().to_string()),
            }],
            summary: WebhookSummary {
                total_accounts: 0,
                executed_accounts: 0,
                successful_trades: 0,
                failed_trades: 1,
                inactive_accounts: 0,
            },
            performance_metrics: PerformanceMetrics {
                validation_time_ms: 0,
                preprocessing_time_ms: 0,
                total_processing_time_ms: 0,
            },
        }
    }

    async fn execute_for_account(
        &self,
        strategy: &crate::model::Strategy,
        link: &crate::model::StrategyAccount,
        order: &WebhookOrder,
    ) -> AccountOutcome {
        let account_id = link.account_id;
        let Some(account) = self.repository.find_account(account_id) else {
            return AccountOutcome::error(account_id, order.order_type, ExecutionError::Internal("account vanished".into()));
        };
        let Some(adapter) = self.exchange_adapters.get(&account.exchange).cloned() else {
            return AccountOutcome::error(account_id, order.order_type, ExecutionError::Exchange("no adapter configured".into()));
        };

        let symbol = match &order.symbol {
            Some(symbol) => symbol.clone(),
            None if order.order_type.is_cancel() => String::new(),
            None => return AccountOutcome::error(account_id, order.order_type, ExecutionError::Validation("missing symbol".into())),
        };

        if order.order_type.is_cancel() {
            return self.execute_cancel(account_id, &adapter, order).await;
        }

        let side = match order.side {
            Some(side) => side,
            None => return AccountOutcome::error(account_id, order.order_type, ExecutionError::Validation("missing side".into())),
        };

        let capital = self
            .repository
            .find_strategy_capital(link.id)
            .map(|c| c.allocated_capital)
            .unwrap_or(Decimal::ZERO);
        let existing_position = self.repository.find_position(link.id, &symbol);

        let mode = match order.qty_per {
            Some(qty_per) => QuantityMode::Percentage { qty_per },
            None => match order.qty {
                Some(qty) => QuantityMode::Absolute { qty },
                None => {
                    return AccountOutcome::error(
                        account_id,
                        order.order_type,
                        ExecutionError::QuantityCalculation("neither qty nor qty_per supplied".into()),
                    )
                }
            },
        };

        let quantity = match self
            .quantity_calculator
            .calculate(QuantityCalculationInput {
                mode,
                side,
                order_type: order.order_type,
                allocated_capital: capital,
                leverage: link.leverage,
                existing_position,
                webhook_price: order.price,
                limit_price: order.price,
                stop_price: order.stop_price,
                exchange: account.exchange,
                market: strategy.market_type,
                symbol: symbol.clone(),
            })
            .await
        {
            Ok(qty) => qty,
            Err(err) => return AccountOutcome::error(account_id, order.order_type, err),
        };

        // Symbol Validator / Quantizer (spec §4.3, component C3): sits
        // between the Quantity Calculator and both the Exchange Adapter
        // and the Order Queue Manager in the data flow (spec §2), so a
        // queued LIMIT/STOP is admitted with an already-step-aligned
        // quantity too, not just a direct MARKET order.
        let rules = self.precision_provider.precision(account.exchange, strategy.market_type, &symbol);
        let (quantity, price) = match validate_order_params(&rules, quantity, order.price) {
            Ok(quantized) => (quantized.adjusted_quantity, quantized.adjusted_price),
            Err(err) => return AccountOutcome::error(account_id, order.order_type, quantize_error(err)),
        };

        if order.order_type.is_queued() {
            let outcome = self.queue_manager.enqueue(EnqueueRequest {
                strategy_account_id: link.id,
                symbol: symbol.clone(),
                side,
                order_type: order.order_type,
                quantity,
                price,
                stop_price: order.stop_price,
                exchange: account.exchange,
                market: strategy.market_type,
                commit: false,
            });
            self.event_emitter.emit_order(OrderEvent {
                event_type: OrderEventType::Queued,
                order_id: outcome.pending_order.id.to_string(),
                symbol: symbol.clone(),
                strategy_id: strategy.id,
                user_id: strategy.user_id,
                side,
                quantity,
                price: price.unwrap_or(Decimal::ZERO),
                status: "queued".to_string(),
                timestamp: Utc::now(),
                order_type: order.order_type,
                stop_price: order.stop_price,
                account: EventAccount {
                    account_id,
                    name: format!("account-{account_id}"),
                    exchange: account.exchange,
                },
            });
            return AccountOutcome {
                summary: AccountResultSummary {
                    account_id,
                    success: true,
                    queued: true,
                    priority: Some(outcome.priority),
                    filled_quantity: None,
                    average_price: None,
                    error: None,
                    error_type: None,
                },
                order_type: order.order_type,
                created: true,
                cancelled: false,
            };
        }

        let create_request = CreateOrderRequest {
            symbol: symbol.clone(),
            side,
            order_type: order.order_type,
            quantity,
            price,
            stop_price: order.stop_price,
            market: strategy.market_type,
        };

        let mut result = match adapter.create_order(create_request).await {
            Ok(result) => result,
            Err(err) => return AccountOutcome::error(account_id, order.order_type, err),
        };

        if order.order_type == OrderType::Market {
            result = self.poll_until_filled(&adapter, &symbol, result).await;
        }

        let is_filled = result.filled_quantity > Decimal::ZERO;

        if !is_filled {
            self.repository.upsert_open_order(OpenOrder {
                exchange_order_id: result.exchange_order_id.clone(),
                strategy_account_id: link.id,
                symbol: symbol.clone(),
                side,
                order_type: order.order_type,
                quantity,
                filled_quantity: result.filled_quantity,
                price: result.adjusted_price,
                stop_price: result.adjusted_stop_price,
                status: OpenOrderStatus::New,
                market_type: strategy.market_type,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            });
        }

        let trade = Trade {
            id: 0,
            strategy_account_id: link.id,
            exchange_order_id: result.exchange_order_id.clone(),
            symbol: symbol.clone(),
            side,
            quantity: result.filled_quantity,
            price: result.average_price.unwrap_or(Decimal::ZERO),
            order_price: order.price,
            order_type: order.order_type,
            is_entry: existing_position_entry(&self.repository, link.id, &symbol, side),
            pnl: None,
            fee: Decimal::ZERO,
            timestamp: Utc::now(),
        };

        if is_filled {
            let record_outcome = match self
                .record_manager
                .create_trade_record(TradeRecordInput { trade, execution: None })
                .await
            {
                Ok(outcome) => outcome,
                Err(err) => return AccountOutcome::error(account_id, order.order_type, err),
            };

            let fill_outcome = self
                .position_manager
                .process_order_fill(FillContext {
                    strategy_account_id: link.id,
                    strategy_id: strategy.id,
                    user_id: strategy.user_id,
                    symbol: symbol.clone(),
                    side,
                    order_id: result.exchange_order_id.clone(),
                    order_type: order.order_type,
                    local_result: result.clone(),
                    quantity_delta: record_outcome.quantity_delta,
                    exchange: account.exchange,
                    market: strategy.market_type,
                })
                .await;

            if let Err(err) = fill_outcome {
                warn!(account_id, error = %err, "position update failed after fill");
            }

            let price_inputs = PriceInputs {
                average_price: result.average_price,
                adjusted_price: result.adjusted_price,
                price: order.price,
                stop_price: result.adjusted_stop_price,
                is_filled,
            };
            match extract_event_price(order.order_type, price_inputs) {
                Ok(price) => {
                    self.event_emitter.emit_order(OrderEvent {
                        event_type: OrderEventType::OrderFilled,
                        order_id: result.exchange_order_id.clone(),
                        symbol: symbol.clone(),
                        strategy_id: strategy.id,
                        user_id: strategy.user_id,
                        side,
                        quantity: result.filled_quantity,
                        price,
                        status: result.status.clone(),
                        timestamp: Utc::now(),
                        order_type: order.order_type,
                        stop_price: result.adjusted_stop_price,
                        account: EventAccount {
                            account_id,
                            name: format!("account-{account_id}"),
                            exchange: account.exchange,
                        },
                    });
                }
                Err(err) => {
                    warn!(account_id, error = %err, "order_filled event price extraction failed, aborting emission");
                }
            }
        }

        AccountOutcome {
            summary: AccountResultSummary {
                account_id,
                success: true,
                queued: false,
                priority: None,
                filled_quantity: Some(result.filled_quantity),
                average_price: result.average_price,
                error: None,
                error_type: None,
            },
            order_type: order.order_type,
            created: true,
            cancelled: false,
        }
    }

    async fn execute_cancel(
        &self,
        account_id: i64,
        adapter: &Arc<dyn ExchangeAdapter>,
        order: &WebhookOrder,
    ) -> AccountOutcome {
        let Some(order_id) = &order.order_id else {
            return AccountOutcome::error(account_id, order.order_type, ExecutionError::Validation("missing order_id for CANCEL".into()));
        };
        let symbol = order.symbol.clone().unwrap_or_default();
        match adapter.cancel_order(order_id, &symbol).await {
            Ok(()) => {
                self.repository.delete_open_order(order_id);
                AccountOutcome {
                    summary: AccountResultSummary {
                        account_id,
                        success: true,
                        queued: false,
                        priority: None,
                        filled_quantity: None,
                        average_price: None,
                        error: None,
                        error_type: None,
                    },
                    order_type: order.order_type,
                    created: false,
                    cancelled: true,
                }
            }
            Err(err) => AccountOutcome::error(account_id, order.order_type, err),
        }
    }

    /// Exponential-backoff fill polling for MARKET orders (spec §4.7
    /// step 3d): default schedule 125ms/250ms/500ms/1s/2s, configurable.
    /// Sustained non-fill at attempt ≥ 4 logs a warning; final non-fill
    /// is left to the caller to persist as an `OpenOrder`.
    async fn poll_until_filled(
        &self,
        adapter: &Arc<dyn ExchangeAdapter>,
        symbol: &str,
        mut result: CreateOrderResult,
    ) -> CreateOrderResult {
        if result.filled_quantity > Decimal::ZERO {
            return result;
        }
        if self.config.market_order_delay > Duration::ZERO {
            tokio::time::sleep(self.config.market_order_delay).await;
        }

        for (attempt, delay) in self
            .config
            .market_order_retry_delays
            .iter()
            .take(self.config.max_market_order_retries as usize)
            .enumerate()
        {
            tokio::time::sleep(*delay).await;
            match adapter.fetch_order(&result.exchange_order_id, symbol).await {
                Ok(fetched) if fetched.filled_quantity > Decimal::ZERO => {
                    result.filled_quantity = fetched.filled_quantity;
                    result.average_price = fetched.average_price;
                    result.status = fetched.status;
                    return result;
                }
                Ok(fetched) => {
                    result.status = fetched.status;
                    if attempt + 1 >= 4 {
                        warn!(order_id = %result.exchange_order_id, attempt, "MARKET order still unfilled after repeated polls");
                    }
                }
                Err(err) => {
                    warn!(order_id = %result.exchange_order_id, error = %err, "fetch_order failed during fill poll");
                }
            }
        }
        result
    }

    fn emit_batch_summary(&self, outcomes: &[AccountOutcome], strategy_id: i64, user_id: i64) {
        let mut by_type: HashMap<OrderType, (u32, u32)> = HashMap::new();
        for outcome in outcomes {
            if !outcome.summary.success {
                continue;
            }
            let entry = by_type.entry(outcome.order_type).or_insert((0, 0));
            if outcome.created {
                entry.0 += 1;
            }
            if outcome.cancelled {
                entry.1 += 1;
            }
        }
        let summaries = by_type
            .into_iter()
            .map(|(order_type, (created, cancelled))| OrderTypeSummary {
                order_type,
                created,
                cancelled,
            })
            .collect();
        self.event_emitter.emit_order_batch(OrderBatchEvent {
            summaries,
            strategy_id,
            user_id,
            timestamp: Utc::now(),
        });
        info!(strategy_id, "emitted aggregated order_batch_event");
    }
}

impl AccountOutcome {
    fn error(account_id: i64, order_type: OrderType, err: ExecutionError) -> Self {
        Self {
            summary: AccountResultSummary {
                account_id,
                success: false,
                queued: false,
                priority: None,
                filled_quantity: None,
                average_price: None,
                error: Some(err.short_message()),
                error_type: Some(err.error_type().to_string()),
            },
            order_type,
            created: false,
            cancelled: false,
        }
    }
}

/// Maps the Symbol Validator's quantize outcome onto the webhook error
/// taxonomy (spec §7): all four `QuantizeError` variants surface as
/// `quantity_calculation_error` — "below min" is explicitly one of that
/// kind's listed causes, and step/tick misalignment is the same family
/// of "this order can't be sized as requested" failure.
fn quantize_error(err: QuantizeError) -> ExecutionError {
    ExecutionError::QuantityCalculation(err.to_string())
}

/// Entry/exit classification (spec §4.9, §9 open question 1): computed
/// per `(strategy_account, symbol)` rather than across every account of
/// the strategy — see DESIGN.md for why this spec resolves the
/// ambiguity that way.
fn existing_position_entry(repository: &InMemoryRepository, strategy_account_id: i64, symbol: &str, side: conduit_markets::Side) -> bool {
    match repository.find_position(strategy_account_id, symbol) {
        None => true,
        Some(position) => {
            let trade_sign = side.sign() as i64;
            let position_sign = if position.quantity.is_sign_positive() { 1 } else { -1 };
            trade_sign == position_sign || position.is_flat()
        }
    }
}
