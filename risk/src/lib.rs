//! Quantity calculation and position management: the two pieces of
//! per-fill arithmetic that must never touch a float. Implements
//! `conduit-core`'s [`conduit_core::contracts::QuantityCalculator`] and
//! [`conduit_core::contracts::PositionManager`] contracts so
//! [`conduit_core::orchestrator::TradingCore`] can be built generic
//! over either.

pub mod check;
pub mod position;
pub mod quantity;

pub use position::DefaultPositionManager;
pub use quantity::DefaultQuantityCalculator;
