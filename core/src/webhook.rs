//! Webhook ingress/egress types (spec §6).

use conduit_markets::{OrderType, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One signal. A batch webhook repeats this shape per `orders[]`
/// element, sharing `group_name`/`token` at the envelope level.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookOrder {
    pub symbol: Option<String>,
    /// Omittable for `CANCEL_ALL_ORDER` (meaning all sides).
    pub side: Option<Side>,
    pub order_type: OrderType,
    pub qty: Option<Decimal>,
    pub qty_per: Option<Decimal>,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub order_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookRequest {
    pub group_name: String,
    pub token: String,
    #[serde(flatten)]
    pub order: WebhookOrder,
    /// When present, the payload is a batch sharing `group_name`/`token`.
    pub orders: Option<Vec<WebhookOrder>>,
    /// Dev-only: bypasses strategy lookup and token validation.
    #[serde(default)]
    pub test_mode: bool,
}

impl WebhookRequest {
    /// The per-signal orders this request carries: the batch list if
    /// present, otherwise the single top-level order (spec §6).
    pub fn orders(&self) -> Vec<&WebhookOrder> {
        match &self.orders {
            Some(batch) => batch.iter().collect(),
            None => vec![&self.order],
        }
    }

    pub fn is_batch(&self) -> bool {
        self.orders.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResultSummary {
    pub account_id: i64,
    pub success: bool,
    pub queued: bool,
    pub priority: Option<u8>,
    pub filled_quantity: Option<Decimal>,
    pub average_price: Option<Decimal>,
    pub error: Option<String>,
    pub error_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSummary {
    pub total_accounts: u32,
    pub executed_accounts: u32,
    pub successful_trades: u32,
    pub failed_trades: u32,
    pub inactive_accounts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub validation_time_ms: u64,
    pub preprocessing_time_ms: u64,
    pub total_processing_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub action: String,
    pub strategy: String,
    pub market_type: String,
    pub success: bool,
    pub results: Vec<AccountResultSummary>,
    pub summary: WebhookSummary,
    pub performance_metrics: PerformanceMetrics,
}
