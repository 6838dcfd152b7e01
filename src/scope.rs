//! Query scoping by owning user

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of the user owning a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u32);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user:{}", self.0)
    }
}

/// Which records a query may see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// Every record regardless of owner (administrative and batch use)
    #[default]
    All,
    /// Only records owned by this user
    User(UserId),
}

impl Scope {
    pub fn allows(&self, owner: UserId) -> bool {
        match self {
            Scope::All => true,
            Scope::User(user) => *user == owner,
        }
    }
}
