use async_trait::async_trait;
use common::db::models::{DbAccount, DbActivity, DbBalance};
use common::db::{init_db_pool, DbPool};
use common::error::{Error, Result};
use common::model::account::{Account, Activity, Balance, NewAccount};
use sqlx::Row;
use tracing::{debug, info};
use uuid::Uuid;

use super::AccountRepository;
use crate::config::AccountServiceConfig;

const ACCOUNT_COLUMNS: &str = "id, login, email, password_hash, roles, created_at";
const BALANCE_COLUMNS: &str = "account_id, usd, version, updated_at";
const ACTIVITY_COLUMNS: &str = "account_id, symbol, amount, updated_at";

/// PostgreSQL repository for account data
pub struct PostgresAccountRepository {
    /// Database connection pool
    pool: DbPool,
}

impl PostgresAccountRepository {
    /// Create a repository over an existing pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new PostgreSQL account repository with configuration
    pub async fn with_config(config: &AccountServiceConfig) -> Result<Self> {
        let database_url = config.database_url.as_deref()
            .ok_or_else(|| Error::ConfigurationError("DATABASE_URL must be set".to_string()))?;

        let pool = init_db_pool(database_url, config.db_pool_size).await?;
        Ok(Self::new(pool))
    }

    /// Access the underlying pool
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Map a unique-constraint violation to `AlreadyExists`
fn unique_violation(err: sqlx::Error, message: impl FnOnce() -> String) -> Error {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => Error::AlreadyExists(message()),
        _ => Error::Database(err),
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn create_account(&self, new: NewAccount) -> Result<Account> {
        debug!("Creating new account in database: {}", new.login);

        let id = Uuid::new_v4();
        let roles: Vec<String> = new.roles.iter().map(|r| r.as_str().to_string()).collect();

        let mut tx = self.pool.begin().await?;

        let row: DbAccount = sqlx::query_as(&format!(
            "INSERT INTO accounts (id, login, email, password_hash, roles)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .bind(&new.login)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&roles)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_violation(e, || format!("Login {} or email {} is taken", new.login, new.email)))?;

        sqlx::query("INSERT INTO balances (account_id, usd, version) VALUES ($1, $2, 0)")
            .bind(id)
            .bind(new.usd)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("Created account {} ({})", id, new.login);
        Account::try_from(row)
    }

    async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        debug!("Getting account from database: {}", id);

        let row: Option<DbAccount> = sqlx::query_as(&format!(
            "SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Account::try_from).transpose()
    }

    async fn get_account_by_login(&self, login: &str) -> Result<Option<Account>> {
        let row: Option<DbAccount> = sqlx::query_as(&format!(
            "SELECT {} FROM accounts WHERE login = $1", ACCOUNT_COLUMNS
        ))
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Account::try_from).transpose()
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let row: Option<DbAccount> = sqlx::query_as(&format!(
            "SELECT {} FROM accounts WHERE email = $1", ACCOUNT_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Account::try_from).transpose()
    }

    async fn delete_account(&self, id: Uuid) -> Result<()> {
        debug!("Deleting account from database: {}", id);

        // balances and activities go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::AccountNotFound(format!("Account not found: {}", id)));
        }
        Ok(())
    }

    async fn get_balance(&self, account_id: Uuid) -> Result<Option<Balance>> {
        debug!("Getting balance from database for {}", account_id);

        let row: Option<DbBalance> = sqlx::query_as(&format!(
            "SELECT {} FROM balances WHERE account_id = $1", BALANCE_COLUMNS
        ))
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Balance::from))
    }

    async fn update_balance(&self, balance: &Balance) -> Result<Balance> {
        debug!("Updating balance in database: {} (version {})", balance.account_id, balance.version);

        let row: Option<DbBalance> = sqlx::query_as(&format!(
            "UPDATE balances
             SET usd = $2, version = version + 1, updated_at = now()
             WHERE account_id = $1 AND version = $3
             RETURNING {}",
            BALANCE_COLUMNS
        ))
        .bind(balance.account_id)
        .bind(balance.usd)
        .bind(balance.version)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(Balance::from(row));
        }

        let current = sqlx::query("SELECT version FROM balances WHERE account_id = $1")
            .bind(balance.account_id)
            .fetch_optional(&self.pool)
            .await?;

        match current {
            Some(row) => {
                let found: i64 = row.get("version");
                Err(Error::Conflict(format!(
                    "Balance of account {} changed concurrently (expected version {}, found {})",
                    balance.account_id, balance.version, found
                )))
            }
            None => Err(Error::AccountNotFound(format!("No balance for account {}", balance.account_id))),
        }
    }

    async fn get_activity(&self, account_id: Uuid, symbol: &str) -> Result<Option<Activity>> {
        let row: Option<DbActivity> = sqlx::query_as(&format!(
            "SELECT {} FROM activities WHERE account_id = $1 AND symbol = $2", ACTIVITY_COLUMNS
        ))
        .bind(account_id)
        .bind(symbol)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Activity::from))
    }

    async fn create_activity(&self, activity: &Activity) -> Result<Activity> {
        debug!("Creating {} activity for {}", activity.symbol, activity.account_id);

        let row: DbActivity = sqlx::query_as(&format!(
            "INSERT INTO activities (account_id, symbol, amount)
             VALUES ($1, $2, $3)
             RETURNING {}",
            ACTIVITY_COLUMNS
        ))
        .bind(activity.account_id)
        .bind(&activity.symbol)
        .bind(activity.amount)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, || format!(
            "Activity {} already exists for account {}", activity.symbol, activity.account_id
        )))?;

        Ok(Activity::from(row))
    }

    async fn update_activity(&self, activity: &Activity) -> Result<Activity> {
        debug!("Updating {} activity for {}", activity.symbol, activity.account_id);

        let row: Option<DbActivity> = sqlx::query_as(&format!(
            "UPDATE activities SET amount = $3, updated_at = now()
             WHERE account_id = $1 AND symbol = $2
             RETURNING {}",
            ACTIVITY_COLUMNS
        ))
        .bind(activity.account_id)
        .bind(&activity.symbol)
        .bind(activity.amount)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Activity::from).ok_or_else(|| Error::ActivityNotFound(format!(
            "No {} activity for account {}", activity.symbol, activity.account_id
        )))
    }

    async fn delete_activity(&self, account_id: Uuid, symbol: &str) -> Result<()> {
        debug!("Deleting {} activity for {}", symbol, account_id);

        let result = sqlx::query("DELETE FROM activities WHERE account_id = $1 AND symbol = $2")
            .bind(account_id)
            .bind(symbol)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::ActivityNotFound(format!("No {} activity for account {}", symbol, account_id)));
        }
        Ok(())
    }

    async fn get_activities(&self, account_id: Uuid, symbols: &[String]) -> Result<Vec<Activity>> {
        let rows: Vec<DbActivity> = sqlx::query_as(&format!(
            "SELECT {} FROM activities
             WHERE account_id = $1 AND (cardinality($2::text[]) = 0 OR symbol = ANY($2))
             ORDER BY symbol",
            ACTIVITY_COLUMNS
        ))
        .bind(account_id)
        .bind(symbols.to_vec())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Activity::from).collect())
    }
}
