use conduit_markets::ExchangeId;
use serde::{Deserialize, Serialize};

/// Whether an [`Account`] trades crypto or securities. Mirrors
/// [`conduit_markets::MarketType::is_securities`] at the account level —
/// an account is provisioned for one or the other, never both.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum AccountType {
    Crypto,
    Stock,
}

/// Credentials to one exchange for one user (spec §3).
///
/// Invariant: `encrypted_public_key`/`encrypted_secret_key` are at rest
/// under a reversible cipher owned by the deployment (out of scope
/// here); a decrypt failure at the call site must disable trading on
/// the account rather than panic or silently use stale keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub exchange: ExchangeId,
    pub account_type: AccountType,
    pub encrypted_public_key: String,
    pub encrypted_secret_key: String,
    pub passphrase: Option<String>,
    pub is_testnet: bool,
    pub is_active: bool,
}
