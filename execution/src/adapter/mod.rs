//! Exchange Adapter implementations (spec §4.2, component C1). One
//! module per venue; [`crate::lib`] re-exports the concrete types the
//! binary wiring a [`conduit_core::orchestrator::TradingCore`] needs.

pub mod b3;
pub mod binance;
pub mod mock;
