//! Cross-crate contracts (spec §9 redesign note: "wire components into
//! a root struct/bundle passed to handlers" rather than reach for a
//! global singleton). `conduit-core` defines these traits; the
//! `conduit-execution`, `conduit-risk` and `conduit-analytics` crates
//! provide the concrete implementations the [`crate::orchestrator::TradingCore`]
//! is built from.

use crate::{
    error::ExecutionError,
    model::{OpenOrder, PendingOrder, StrategyPosition, Trade},
};
use async_trait::async_trait;
use conduit_markets::{ExchangeId, MarketType, OrderType, PrecisionRules, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------- C1

#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub market: MarketType,
}

/// spec §4.2: `adjusted_*` reflect precision rounding the adapter
/// applied; `raw_response` is kept opaque (serialized JSON) since its
/// shape is venue-specific and only used for audit logging.
#[derive(Debug, Clone)]
pub struct CreateOrderResult {
    pub exchange_order_id: String,
    pub status: String,
    pub filled_quantity: Decimal,
    pub average_price: Option<Decimal>,
    pub adjusted_quantity: Decimal,
    pub adjusted_price: Option<Decimal>,
    pub adjusted_stop_price: Option<Decimal>,
    pub raw_response: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct FetchedOrder {
    pub exchange_order_id: String,
    pub status: String,
    pub filled_quantity: Decimal,
    pub average_price: Option<Decimal>,
}

/// Exchange Adapter capability set (spec §4.2, component C1). One
/// implementation per venue; every method is rate-limited per
/// `(account, venue)` by the implementation (spec: "a pluggable
/// limiter").
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    fn exchange(&self) -> ExchangeId;

    async fn create_order(&self, request: CreateOrderRequest) -> Result<CreateOrderResult, ExecutionError>;

    async fn cancel_order(&self, exchange_order_id: &str, symbol: &str) -> Result<(), ExecutionError>;

    /// Authoritative; may be called to re-synchronize status when
    /// local state diverges (spec §4.2).
    async fn fetch_order(&self, exchange_order_id: &str, symbol: &str) -> Result<FetchedOrder, ExecutionError>;

    async fn fetch_open_orders(&self, symbol: Option<&str>) -> Result<Vec<FetchedOrder>, ExecutionError>;

    async fn fetch_ticker(&self, symbol: &str) -> Result<Decimal, ExecutionError>;

    async fn fetch_balance(&self, asset: &str) -> Result<Decimal, ExecutionError>;

    /// Partial success is a valid outcome (spec §4.2): one `Result` per
    /// input request, in order; a failure at index `i` never
    /// invalidates successes elsewhere in the batch.
    async fn create_batch_orders(
        &self,
        requests: Vec<CreateOrderRequest>,
    ) -> Vec<Result<CreateOrderResult, ExecutionError>>;

    /// Step/tick/min-notional rules for `symbol` on this venue (spec
    /// §4.2, §4.3). Synchronous: every adapter keeps this in a
    /// statically loaded or periodically refreshed table rather than a
    /// per-call network round trip.
    fn get_precision(&self, symbol: &str) -> PrecisionRules;
}

// ---------------------------------------------------------------- C5

/// Last-resort price lookup for the Quantity Calculator's `effective_price`
/// resolution (spec §4.5: "price cache → ticker fallback"). `conduit-core`
/// only names the capability; `conduit-data`'s price cache plus
/// `conduit-execution`'s exchange adapters are what actually back it,
/// wired in by the binary that assembles a [`crate::orchestrator::TradingCore`].
#[async_trait]
pub trait PriceResolver: Send + Sync {
    async fn current_price(&self, exchange: ExchangeId, market: MarketType, symbol: &str) -> Option<Decimal>;
}

/// Per-`(exchange, market, symbol)` step/tick/notional rules (spec
/// §4.3, §4.8). Backed by whatever `ExchangeAdapter::get_precision`
/// returns in a real deployment, cached by the caller.
pub trait PrecisionProvider: Send + Sync {
    fn precision(&self, exchange: ExchangeId, market: MarketType, symbol: &str) -> PrecisionRules;
}

#[derive(Debug, Clone)]
pub enum QuantityMode {
    Absolute { qty: Decimal },
    Percentage { qty_per: Decimal },
}

#[derive(Debug, Clone)]
pub struct QuantityCalculationInput {
    pub mode: QuantityMode,
    pub side: Side,
    pub order_type: OrderType,
    pub allocated_capital: Decimal,
    pub leverage: Decimal,
    pub existing_position: Option<StrategyPosition>,
    pub webhook_price: Option<Decimal>,
    pub limit_price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    /// Needed only for the MARKET price-cache/ticker fallback path
    /// (spec §4.5); LIMIT/STOP orders never consult [`PriceResolver`].
    pub exchange: ExchangeId,
    pub market: MarketType,
    pub symbol: String,
}

/// Quantity Calculator (spec §4.5, component C5): derives an absolute
/// order quantity, or fails with a human-readable reason propagated to
/// the webhook response.
#[async_trait]
pub trait QuantityCalculator: Send + Sync {
    async fn calculate(&self, input: QuantityCalculationInput) -> Result<Decimal, ExecutionError>;
}

// ---------------------------------------------------------------- C6

#[derive(Debug, Clone)]
pub struct EnqueueRequest {
    pub strategy_account_id: i64,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub exchange: ExchangeId,
    pub market: MarketType,
    /// `false` lets a batch webhook admit many orders under one outer
    /// transaction, committed once by the caller (spec §4.6).
    pub commit: bool,
}

#[derive(Debug, Clone)]
pub struct EnqueueOutcome {
    pub pending_order: PendingOrder,
    pub priority: u8,
}

/// Order Queue Manager (spec §4.6, component C6). Enqueue is
/// unconditional — capacity is enforced at promotion time by the
/// background rebalancer, not at admission (spec §4.6 invariant).
pub trait OrderQueueManager: Send + Sync {
    fn enqueue(&self, request: EnqueueRequest) -> EnqueueOutcome;
}

// ---------------------------------------------------------------- C7

#[derive(Debug, Clone)]
pub struct FillContext {
    pub strategy_account_id: i64,
    pub strategy_id: i64,
    pub user_id: i64,
    pub symbol: String,
    pub side: Side,
    pub order_id: String,
    pub order_type: OrderType,
    pub local_result: CreateOrderResult,
    /// The delta the Record Manager just persisted for this fill (spec
    /// §4.8 step 4: only apply `_update_position` when this is `> 0` —
    /// a replayed/duplicate fill must not double-count).
    pub quantity_delta: Decimal,
    pub exchange: ExchangeId,
    pub market: MarketType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillOutcome {
    Applied {
        realized_pnl: Decimal,
        position_closed: bool,
    },
    Skipped {
        reason: &'static str,
    },
}

/// Position Manager (spec §4.8, component C7).
#[async_trait]
pub trait PositionManager: Send + Sync {
    async fn process_order_fill(&self, ctx: FillContext) -> Result<FillOutcome, ExecutionError>;
}

// ---------------------------------------------------------------- C9

/// Execution-grade detail for the optional [`TradeExecution`] ledger
/// row (spec §3: "finer granularity than Trade for maker/taker,
/// commission asset, venue trade id"). `None` when the adapter's
/// response didn't carry this level of detail — the ledger row is then
/// skipped, never faked with zeroed placeholders.
#[derive(Debug, Clone)]
pub struct TradeExecutionDetail {
    pub venue_trade_id: String,
    pub is_maker: bool,
    pub commission: Decimal,
    pub commission_asset: String,
}

#[derive(Debug, Clone)]
pub struct TradeRecordInput {
    pub trade: Trade,
    pub execution: Option<TradeExecutionDetail>,
}

#[derive(Debug, Clone)]
pub struct TradeRecordOutcome {
    pub quantity_delta: Decimal,
    pub duplicate_prevented: bool,
}

/// Record Manager (spec §4.9, component C9). Idempotent at two layers
/// (application-level upsert + DB-level UNIQUE emulation, both inside
/// the concrete implementation's repository call) and responsible for
/// the optional [`TradeExecution`] ledger row and the non-blocking
/// post-commit hooks spec §4.9 describes.
#[async_trait]
pub trait RecordManager: Send + Sync {
    async fn create_trade_record(&self, input: TradeRecordInput) -> Result<TradeRecordOutcome, ExecutionError>;
}

/// Post-commit side effect triggered by a newly recorded trade (spec
/// §4.9: "performance-tracking update for the day"). Failure is logged
/// by the caller and never propagates — recording the trade itself
/// must never roll back because a downstream rollup choked.
#[async_trait]
pub trait PerformanceHook: Send + Sync {
    async fn record_trade(&self, trade: &Trade) -> Result<(), ExecutionError>;
}

// --------------------------------------------------------------- C8

#[derive(Debug, Clone)]
pub struct CancelFilter {
    pub user_id: i64,
    pub strategy_id: i64,
    pub account_id: Option<i64>,
    pub symbol: Option<String>,
    pub side: Option<Side>,
}

/// spec §9 open question 2: the source returns `cancelled_orders` as
/// either a list or an int depending on the call path. This spec picks
/// one shape — a list of cancelled order summaries — and callers never
/// need to introspect the type.
#[derive(Debug, Clone)]
pub struct CancelAllOutcome {
    pub cancelled_orders: Vec<OpenOrder>,
    pub failed_orders: Vec<(String, ExecutionError)>,
}

/// Order Manager (spec §4.10, component C8).
#[async_trait]
pub trait OrderManager: Send + Sync {
    async fn cancel_order(&self, exchange_order_id: &str, symbol: &str, account_id: i64) -> Result<(), ExecutionError>;

    async fn cancel_all_orders(&self, filter: CancelFilter) -> CancelAllOutcome;

    /// Periodic reconciler (spec §4.10): re-fetches every OpenOrder
    /// older than the implementation's threshold and applies
    /// transitions.
    async fn reconcile_open_orders(&self) -> Result<(), ExecutionError>;
}
