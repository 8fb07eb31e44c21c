use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::Result;
use crate::model::account::{Account, Activity, Balance, Role};

/// Database model for Account table
#[derive(Debug, Clone, FromRow)]
pub struct DbAccount {
    pub id: Uuid,
    pub login: String,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbAccount> for Account {
    type Error = crate::error::Error;

    fn try_from(row: DbAccount) -> Result<Self> {
        let roles = row.roles.iter()
            .map(|r| Role::from_str(r))
            .collect::<Result<Vec<_>>>()?;

        Ok(Account {
            id: row.id,
            login: row.login,
            email: row.email,
            password_hash: row.password_hash,
            roles,
            created_at: row.created_at,
        })
    }
}

/// Database model for Balance table
#[derive(Debug, Clone, FromRow)]
pub struct DbBalance {
    pub account_id: Uuid,
    pub usd: Option<Decimal>,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl From<DbBalance> for Balance {
    fn from(row: DbBalance) -> Self {
        Balance {
            account_id: row.account_id,
            usd: row.usd,
            version: row.version,
            updated_at: row.updated_at,
        }
    }
}

/// Database model for Activity table
#[derive(Debug, Clone, FromRow)]
pub struct DbActivity {
    pub account_id: Uuid,
    pub symbol: String,
    pub amount: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl From<DbActivity> for Activity {
    fn from(row: DbActivity) -> Self {
        Activity {
            account_id: row.account_id,
            symbol: row.symbol,
            amount: row.amount,
            updated_at: row.updated_at,
        }
    }
}
