//! Central error taxonomy (spec §7).
//!
//! Every failure a signal's execution can surface is one of these
//! kinds. The variant names are the canonical `error_type` strings the
//! webhook response serializes (spec §6) — keep them stable.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, Error)]
pub enum ExecutionError {
    #[error("validation_error: {0}")]
    Validation(String),

    #[error("auth_error: {0}")]
    Auth(String),

    #[error("quantity_calculation_error: {0}")]
    QuantityCalculation(String),

    #[error("exchange_error: {0}")]
    Exchange(String),

    #[error("position_update_failed: {0}")]
    PositionUpdateFailed(String),

    /// Reserved: enqueue onto the Order Queue Manager is unconditional
    /// by design (spec §4.6), so this should never actually occur.
    #[error("queue_capacity_error: {0}")]
    QueueCapacity(String),

    #[error("execution_price_unavailable")]
    ExecutionPriceUnavailable,

    #[error("timeout_error: per-account deadline exceeded after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("internal_error: {0}")]
    Internal(String),
}

impl ExecutionError {
    /// The canonical `error_type` string (spec §6 webhook response,
    /// §7 taxonomy) — distinct from the `Display` message, which is
    /// human-readable and may include the dynamic detail.
    pub fn error_type(&self) -> &'static str {
        match self {
            ExecutionError::Validation(_) => "validation_error",
            ExecutionError::Auth(_) => "auth_error",
            ExecutionError::QuantityCalculation(_) => "quantity_calculation_error",
            ExecutionError::Exchange(_) => "exchange_error",
            ExecutionError::PositionUpdateFailed(_) => "position_update_failed",
            ExecutionError::QueueCapacity(_) => "queue_capacity_error",
            ExecutionError::ExecutionPriceUnavailable => "execution_price_unavailable",
            ExecutionError::Timeout { .. } => "timeout_error",
            ExecutionError::Internal(_) => "internal_error",
        }
    }

    /// Short human message for `results[i].error` (spec §7).
    pub fn short_message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_type_is_stable_per_variant() {
        assert_eq!(
            ExecutionError::Validation("bad payload".into()).error_type(),
            "validation_error"
        );
        assert_eq!(
            ExecutionError::Timeout { elapsed_ms: 30_000 }.error_type(),
            "timeout_error"
        );
    }
}
