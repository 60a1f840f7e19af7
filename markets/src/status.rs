//! Status Transformer (spec §4.1, component C2).
//!
//! Maps per-exchange order status vocabularies onto a single canonical
//! [`CanonicalStatus`]. The mapping table is data-driven and grounded on
//! `examples/original_source/web_server/app/exchanges/transformers/order_status_transformer.py`,
//! which documents the exact raw tokens for BINANCE, UPBIT, BITHUMB and
//! BYBIT. Unknown `(raw, exchange)` pairs pass through unchanged — the
//! caller logs and fails closed rather than the transformer guessing.

use crate::exchange::ExchangeId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum CanonicalStatus {
    Pending,
    New,
    Open,
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
    Expired,
    Failed,
}

impl CanonicalStatus {
    /// NEW | OPEN | PARTIALLY_FILLED.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            CanonicalStatus::New | CanonicalStatus::Open | CanonicalStatus::PartiallyFilled
        )
    }

    /// FILLED | CANCELLED | REJECTED | EXPIRED | FAILED.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CanonicalStatus::Filled
                | CanonicalStatus::Cancelled
                | CanonicalStatus::Rejected
                | CanonicalStatus::Expired
                | CanonicalStatus::Failed
        )
    }
}

impl fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CanonicalStatus::Pending => "PENDING",
            CanonicalStatus::New => "NEW",
            CanonicalStatus::Open => "OPEN",
            CanonicalStatus::PartiallyFilled => "PARTIALLY_FILLED",
            CanonicalStatus::Filled => "FILLED",
            CanonicalStatus::Cancelled => "CANCELLED",
            CanonicalStatus::Rejected => "REJECTED",
            CanonicalStatus::Expired => "EXPIRED",
            CanonicalStatus::Failed => "FAILED",
        };
        write!(f, "{s}")
    }
}

/// Outcome of a transform attempt: either a recognised canonical status,
/// or the original raw token passed through unchanged (so callers can
/// log the gap instead of silently swallowing it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformedStatus {
    Known(CanonicalStatus),
    Unknown(String),
}

impl TransformedStatus {
    pub fn known(self) -> Option<CanonicalStatus> {
        match self {
            TransformedStatus::Known(s) => Some(s),
            TransformedStatus::Unknown(_) => None,
        }
    }
}

/// Pure, stateless, thread-safe mapping of `(raw_status, exchange)` to
/// [`CanonicalStatus`]. `CANCELED` is treated as an alias of
/// `CANCELLED` everywhere, matching every venue's inconsistent spelling.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatusTransformer;

impl StatusTransformer {
    pub fn transform(&self, raw_status: &str, exchange: ExchangeId) -> TransformedStatus {
        let table: &[(&str, CanonicalStatus)] = match exchange {
            ExchangeId::Binance => BINANCE,
            ExchangeId::Upbit => UPBIT,
            ExchangeId::Bithumb => BITHUMB,
            ExchangeId::Bybit => BYBIT,
            ExchangeId::Okx => OKX,
            ExchangeId::B3 => B3,
            ExchangeId::Mock => MOCK,
        };

        table
            .iter()
            .find(|(raw, _)| raw.eq_ignore_ascii_case(raw_status))
            .map(|(_, canonical)| TransformedStatus::Known(*canonical))
            .unwrap_or_else(|| TransformedStatus::Unknown(raw_status.to_string()))
    }

    pub fn is_open(&self, raw_status: &str, exchange: ExchangeId) -> bool {
        matches!(
            self.transform(raw_status, exchange).known(),
            Some(status) if status.is_open()
        )
    }

    pub fn is_terminal(&self, raw_status: &str, exchange: ExchangeId) -> bool {
        matches!(
            self.transform(raw_status, exchange).known(),
            Some(status) if status.is_terminal()
        )
    }
}

use CanonicalStatus::*;

const BINANCE: &[(&str, CanonicalStatus)] = &[
    ("NEW", New),
    ("PARTIALLY_FILLED", PartiallyFilled),
    ("FILLED", Filled),
    ("CANCELED", Cancelled),
    ("CANCELLED", Cancelled),
    ("PENDING_CANCEL", Cancelled),
    ("REJECTED", Rejected),
    ("EXPIRED", Expired),
];

// Upbit's REST API reports lowercase verbs; `watch`/`completed` are kept
// as compatibility aliases (see original_source constants.py).
const UPBIT: &[(&str, CanonicalStatus)] = &[
    ("wait", Open),
    ("watch", Open),
    ("done", Filled),
    ("completed", Filled),
    ("cancel", Cancelled),
    ("cancelled", Cancelled),
];

const BITHUMB: &[(&str, CanonicalStatus)] = &[
    ("bid", Open),
    ("ask", Open),
    ("fill", Filled),
    ("complete", Filled),
    ("cancel", Cancelled),
];

const BYBIT: &[(&str, CanonicalStatus)] = &[
    ("Created", New),
    ("New", Open),
    ("PartiallyFilled", PartiallyFilled),
    ("Filled", Filled),
    ("Cancelled", Cancelled),
    ("Canceled", Cancelled),
    ("Rejected", Rejected),
];

const OKX: &[(&str, CanonicalStatus)] = &[
    ("live", Open),
    ("partially_filled", PartiallyFilled),
    ("filled", Filled),
    ("canceled", Cancelled),
    ("mmp_canceled", Cancelled),
];

// B3/ProfitDLL order states (securities path, spec §9 open question 5).
const B3: &[(&str, CanonicalStatus)] = &[
    ("NEW_ORDER", New),
    ("PARTIALLY_EXECUTED", PartiallyFilled),
    ("EXECUTED", Filled),
    ("CANCELED", Cancelled),
    ("REJECTED", Rejected),
    ("EXPIRED", Expired),
];

const MOCK: &[(&str, CanonicalStatus)] = &[
    ("NEW", New),
    ("PARTIALLY_FILLED", PartiallyFilled),
    ("FILLED", Filled),
    ("CANCELLED", Cancelled),
    ("REJECTED", Rejected),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_documented_token() {
        let t = StatusTransformer;
        assert_eq!(
            t.transform("NEW", ExchangeId::Binance).known(),
            Some(New)
        );
        assert_eq!(
            t.transform("CANCELED", ExchangeId::Binance).known(),
            Some(Cancelled)
        );
        assert_eq!(
            t.transform("wait", ExchangeId::Upbit).known(),
            Some(Open)
        );
        assert_eq!(
            t.transform("done", ExchangeId::Upbit).known(),
            Some(Filled)
        );
        assert_eq!(
            t.transform("Created", ExchangeId::Bybit).known(),
            Some(New)
        );
    }

    #[test]
    fn unknown_token_passes_through_unchanged() {
        let t = StatusTransformer;
        match t.transform("SOMETHING_WEIRD", ExchangeId::Binance) {
            TransformedStatus::Unknown(raw) => assert_eq!(raw, "SOMETHING_WEIRD"),
            TransformedStatus::Known(_) => panic!("expected unknown"),
        }
    }

    #[test]
    fn is_open_and_is_terminal_partition_the_enum() {
        for status in [
            Pending,
            New,
            Open,
            PartiallyFilled,
            Filled,
            Cancelled,
            Rejected,
            Expired,
            Failed,
        ] {
            assert!(!(status.is_open() && status.is_terminal()));
        }
        assert!(New.is_open());
        assert!(Filled.is_terminal());
        assert!(Cancelled.is_terminal());
    }
}
