//! Account models and related types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{dec, Amount, Quantity};
use crate::error::{Error, Result};

/// USD balance every new account starts with
pub const STARTING_BALANCE_USD: Amount = dec!(15000);

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular trader
    User,
    /// Operator
    Admin,
}

impl Role {
    /// Roles assigned on signup
    pub fn defaults() -> Vec<Role> {
        vec![Role::User]
    }

    /// Lowercase role name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(Error::Internal(format!("Unknown role: {}", other))),
        }
    }
}

/// Account model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique account ID
    pub id: Uuid,
    /// Unique login
    pub login: String,
    /// Unique email
    pub email: String,
    /// Bcrypt hash of the password
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Assigned roles
    pub roles: Vec<Role>,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Everything the store needs to persist a new account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub login: String,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<Role>,
    /// Initial USD balance
    pub usd: Amount,
}

/// Public view of an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountView {
    pub id: Uuid,
    pub login: String,
    pub email: String,
    pub roles: Vec<Role>,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            login: account.login.clone(),
            email: account.email.clone(),
            roles: account.roles.clone(),
        }
    }
}

/// Balance model, one per account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balance {
    /// Account ID
    pub account_id: Uuid,
    /// USD amount. Always present for a healthy account; `None` is a
    /// corrupted row and is never read as zero.
    pub usd: Option<Amount>,
    /// Optimistic concurrency token, bumped by every successful write
    pub version: i64,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Balance {
    /// Create a fresh balance row
    pub fn new(account_id: Uuid, usd: Amount) -> Self {
        Self {
            account_id,
            usd: Some(usd),
            version: 0,
            updated_at: Utc::now(),
        }
    }

    /// The USD amount, or an internal error if the row is corrupted
    pub fn usd(&self) -> Result<Amount> {
        self.usd.ok_or_else(|| {
            Error::Internal(format!("Balance of account {} has no USD amount", self.account_id))
        })
    }

    /// Copy of this balance carrying a new USD amount, same version
    pub fn with_usd(&self, usd: Amount) -> Self {
        Self {
            usd: Some(usd),
            updated_at: Utc::now(),
            ..self.clone()
        }
    }
}

/// Holding of one crypto asset by one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Account ID
    pub account_id: Uuid,
    /// Case-sensitive ticker, e.g. "BTC"
    pub symbol: String,
    /// Quantity held, always > 0 while the row exists
    pub amount: Quantity,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Activity {
    /// Create a new activity record
    pub fn new(account_id: Uuid, symbol: impl Into<String>, amount: Quantity) -> Self {
        Self {
            account_id,
            symbol: symbol.into(),
            amount,
            updated_at: Utc::now(),
        }
    }
}
