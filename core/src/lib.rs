//! Domain model, error taxonomy, configuration, in-memory reference
//! repository, and cross-crate trait contracts for the signal-to-order
//! pipeline.
//!
//! `conduit-core` sits below `conduit-risk`, `conduit-execution` and
//! `conduit-analytics` in the workspace's dependency graph: it depends
//! only on `conduit-markets`, `conduit-integration` and `conduit-data`,
//! never the reverse. Those three crates provide the concrete
//! [`contracts::ExchangeAdapter`], [`contracts::QuantityCalculator`],
//! [`contracts::OrderQueueManager`], [`contracts::PositionManager`],
//! [`contracts::RecordManager`] and [`contracts::OrderManager`]
//! implementations that [`orchestrator::TradingCore`] is wired from —
//! a deployment assembles one `TradingCore` value per process, passed
//! explicitly to every handler rather than reached for as a global.

pub mod config;
pub mod contracts;
pub mod error;
pub mod event;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod repository;
pub mod shutdown;
pub mod webhook;

pub use config::TradingConfig;
pub use error::ExecutionError;
pub use orchestrator::TradingCore;
pub use repository::InMemoryRepository;
