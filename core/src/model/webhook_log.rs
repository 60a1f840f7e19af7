use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Audit row with the normalized webhook payload and timing
/// breakpoints (spec §3). Consumed by daily summaries and admin
/// dashboards, not the webhook response body (spec §7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookLog {
    pub id: i64,
    pub strategy_id: Option<i64>,
    pub group_name: String,
    pub normalized_payload: Value,
    pub received_at: DateTime<Utc>,
    pub validation_time_ms: u64,
    pub preprocessing_time_ms: u64,
    pub total_processing_time_ms: u64,
    pub success: bool,
    pub error: Option<String>,
}
