use conduit_markets::MarketType;
use serde::{Deserialize, Serialize};

/// A logical trading configuration identified by `group_name`, fanned
/// out to every active [`crate::model::StrategyAccount`] linked to it
/// (spec §3, Glossary).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strategy {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    /// External identifier used by webhooks. Globally unique.
    pub group_name: String,
    pub market_type: MarketType,
    pub is_active: bool,
    /// Public strategies accept any subscriber's token, not just the
    /// owner's (spec §4.7 step 1).
    pub is_public: bool,
    pub webhook_token: String,
    /// Spec §4.7 says a public strategy accepts "any subscriber's
    /// token" without naming a Subscription entity in §3's catalog;
    /// modeled here as the flat set of tokens authorized against this
    /// strategy (documented as an Open Question resolution in
    /// DESIGN.md).
    pub subscriber_tokens: Vec<String>,
}

impl Strategy {
    pub fn authorizes(&self, token: &str) -> bool {
        if token == self.webhook_token {
            return true;
        }
        self.is_public && self.subscriber_tokens.iter().any(|t| t == token)
    }
}
