//! The entity catalog (spec §3): everything persisted by the trading
//! middleware, independent of whichever storage engine a deployment
//! chooses. Field semantics, not column types — an implementor's
//! [`crate::repository::Repository`] maps these onto whatever
//! row-locking RDBMS it runs against.

pub mod account;
pub mod daily_summary;
pub mod open_order;
pub mod pending_order;
pub mod strategy;
pub mod strategy_account;
pub mod strategy_capital;
pub mod strategy_position;
pub mod trade;
pub mod trade_execution;
pub mod user;
pub mod webhook_log;

pub use account::{Account, AccountType};
pub use daily_summary::DailyAccountSummary;
pub use open_order::{OpenOrder, OpenOrderStatus};
pub use pending_order::PendingOrder;
pub use strategy::Strategy;
pub use strategy_account::StrategyAccount;
pub use strategy_capital::StrategyCapital;
pub use strategy_position::StrategyPosition;
pub use trade::Trade;
pub use trade_execution::TradeExecution;
pub use user::User;
pub use webhook_log::WebhookLog;
