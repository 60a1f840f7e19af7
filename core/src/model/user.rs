use serde::{Deserialize, Serialize};

/// Owner of strategies and accounts. Identity only — authentication and
/// session handling live outside this crate's scope (spec §1).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
}
