#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::too_many_arguments)]

//! # Execution — venue connectivity and order admission
//!
//! The Level 3 crate that actually reaches an exchange: one
//! [`conduit_core::contracts::ExchangeAdapter`] per venue
//! ([`adapter::binance::BinanceAdapter`] for the crypto path,
//! [`adapter::b3::B3Adapter`] for securities over ProfitDLL, and
//! [`adapter::mock::MockAdapter`] for tests/dry runs), plus the two
//! components that sit between a signal and the exchange call: the
//! Order Queue Manager ([`queue::DefaultOrderQueueManager`], C6), the
//! Order Manager ([`order_manager::DefaultOrderManager`], C8) and the
//! Record Manager ([`record_manager::DefaultRecordManager`], C9).
//!
//! Everything here is built on `conduit-integration`'s signed-REST and
//! rate-limiting primitives and `conduit-data`'s WebSocket Pool; the
//! venue-neutral vocabulary (order types, statuses, precision rules)
//! comes from `conduit-markets`.

pub mod adapter;
pub mod balance;
pub mod order_manager;
pub mod precision;
pub mod queue;
pub mod record_manager;

pub use adapter::{b3::B3Adapter, binance::BinanceAdapter, mock::MockAdapter};
pub use order_manager::DefaultOrderManager;
pub use precision::AdapterPrecisionProvider;
pub use queue::DefaultOrderQueueManager;
pub use record_manager::DefaultRecordManager;
