//! User roles

use serde::{Deserialize, Serialize};

/// Role of an operator account
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Full access including ledger corrections
    Superuser,
    Staff,
}

impl UserRole {
    pub fn from_superuser_flag(is_superuser: bool) -> Self {
        if is_superuser {
            UserRole::Superuser
        } else {
            UserRole::Staff
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Superuser => "superuser",
            UserRole::Staff => "staff",
        }
    }

    /// Ledger entries are append-only for everyone but superusers
    pub fn can_delete_transactions(&self) -> bool {
        matches!(self, UserRole::Superuser)
    }
}
