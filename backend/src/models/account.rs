//! Student accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::AccountId;

/// A registered student. Credentials never leave the repository layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: AccountId,
    pub username: String,
    pub email: String,
    /// Study program picked during setup
    pub program_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Data needed to create an account row.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    /// Salted password digest, `salt$hex(sha256(salt || password))`
    pub password_digest: String,
}
