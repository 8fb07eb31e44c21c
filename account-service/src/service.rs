//! Account service implementation

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use common::db::run_migrations;
use common::decimal::{checked_mul, Amount, Price, Quantity};
use common::error::{Error, ErrorExt, Result};
use common::model::account::{
    Account, AccountView, Activity, Balance, NewAccount, Role, STARTING_BALANCE_USD,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{AccountServiceConfig, CredentialPolicy};
use crate::ledger::{ActivityLedger, BalanceLedger};
use crate::locks::AccountLocks;
use crate::orchestrator::{TradeReceipt, TransactionOrchestrator};
use crate::price::{HttpPriceSource, PriceSource};
use crate::repository::{AccountRepository, InMemoryAccountRepository, PostgresAccountRepository};

/// Identity returned by a successful login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginOutcome {
    pub account_id: Uuid,
    pub roles: Vec<Role>,
}

/// Balance with, optionally, the current value of all holdings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSummary {
    pub account_id: Uuid,
    pub usd: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_total: Option<Amount>,
}

/// Holdings of an account and, when asked for, their unit prices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitiesView {
    pub activities: Vec<Activity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prices: Option<BTreeMap<String, Price>>,
}

/// Account service: lifecycle of accounts plus the trading operations
pub struct AccountService {
    repo: Arc<dyn AccountRepository>,
    balances: BalanceLedger,
    activities: ActivityLedger,
    orchestrator: TransactionOrchestrator,
    locks: Arc<AccountLocks>,
    credentials: CredentialPolicy,
    bcrypt_cost: u32,
}

impl AccountService {
    /// Wire a service from its collaborators
    pub fn new(
        repo: Arc<dyn AccountRepository>,
        prices: Arc<dyn PriceSource>,
        config: &AccountServiceConfig,
    ) -> Self {
        let balances = BalanceLedger::new(repo.clone());
        let activities = ActivityLedger::new(repo.clone());
        let locks = Arc::new(AccountLocks::new());
        let orchestrator = TransactionOrchestrator::new(
            balances.clone(),
            activities.clone(),
            prices,
            locks.clone(),
            config.price_timeout,
        );

        Self {
            repo,
            balances,
            activities,
            orchestrator,
            locks,
            credentials: config.credentials.clone(),
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    /// In-memory store, given price source
    pub fn in_memory(prices: Arc<dyn PriceSource>, config: &AccountServiceConfig) -> Self {
        Self::new(Arc::new(InMemoryAccountRepository::new()), prices, config)
    }

    /// Build the service the binary runs: PostgreSQL when a database URL is
    /// configured (migrations are applied), the in-memory store otherwise,
    /// and the HTTP price source.
    pub async fn with_config(config: &AccountServiceConfig) -> Result<Self> {
        let repo: Arc<dyn AccountRepository> = if config.database_url.is_some() {
            let repo = PostgresAccountRepository::with_config(config).await?;
            run_migrations(repo.pool()).await?;
            Arc::new(repo)
        } else {
            info!("DATABASE_URL not set, using the in-memory account store");
            Arc::new(InMemoryAccountRepository::new())
        };

        let prices = HttpPriceSource::new(&config.crypto_service_url, config.price_timeout)
            .map_err(|e| Error::ConfigurationError(format!("Price source: {}", e)))?;

        Ok(Self::new(repo, Arc::new(prices), config))
    }

    /// Create a new account with the starting balance
    pub async fn create_account(&self, login: &str, password: &str, email: &str) -> Result<AccountView> {
        self.validate_credentials(login, password, email)?;

        let password_hash = hash_password(password, self.bcrypt_cost).await?;
        let account = self.repo.create_account(NewAccount {
            login: login.to_string(),
            email: email.to_string(),
            password_hash,
            roles: Role::defaults(),
            usd: STARTING_BALANCE_USD,
        }).await?;

        info!(account_id = %account.id, login = %account.login, "Account created");
        Ok(AccountView::from(&account))
    }

    /// Public view of an account
    pub async fn get_account(&self, id: Uuid) -> Result<AccountView> {
        self.find_account(id).await.map(|a| AccountView::from(&a))
    }

    /// Remove an account with its balance and activities
    pub async fn delete_account(&self, id: Uuid) -> Result<()> {
        let _guard = self.locks.acquire(id).await;
        self.repo.delete_account(id).await
            .with_context(|| format!("Failed to delete account {}", id))?;

        info!(account_id = %id, "Account deleted");
        Ok(())
    }

    /// Check credentials. The login is used when given, the email otherwise.
    pub async fn login(&self, login: &str, password: &str, email: &str) -> Result<LoginOutcome> {
        let account = if !login.is_empty() {
            self.repo.get_account_by_login(login).await?
        } else if !email.is_empty() {
            self.repo.get_account_by_email(email).await?
        } else {
            return Err(Error::BadRequest("Login or email is required".to_string()));
        };

        let account = account.ok_or(Error::InvalidCredentials)?;
        if !verify_password(password, &account.password_hash).await? {
            debug!(account_id = %account.id, "Password mismatch");
            return Err(Error::InvalidCredentials);
        }

        Ok(LoginOutcome {
            account_id: account.id,
            roles: account.roles,
        })
    }

    /// Current balance row
    pub async fn get_balance(&self, id: Uuid) -> Result<Balance> {
        self.balances.get_balance(id).await
    }

    /// Balance, plus the current USD value of all holdings when
    /// `fetch_activity` is set
    pub async fn get_balance_summary(&self, id: Uuid, fetch_activity: bool) -> Result<BalanceSummary> {
        let balance = self.balances.get_balance(id).await?;
        let usd = balance.usd()?;

        let activity_total = if fetch_activity {
            let activities = self.activities.get_activities(id, &[]).await?;
            let prices = self.prices_for(&activities).await?;
            Some(holdings_value(&activities, &prices)?)
        } else {
            None
        };

        Ok(BalanceSummary { account_id: id, usd, activity_total })
    }

    /// Spend `usd_amount` on `symbol`
    pub async fn buy_activity(&self, id: Uuid, symbol: &str, usd_amount: Amount) -> Result<TradeReceipt> {
        self.orchestrator.buy(id, symbol, usd_amount).await
    }

    /// Sell `symbol`, sized in USD or in asset units
    pub async fn sell_activity(
        &self,
        id: Uuid,
        symbol: &str,
        usd_amount: Amount,
        asset_amount: Quantity,
    ) -> Result<TradeReceipt> {
        self.orchestrator.sell(id, symbol, usd_amount, asset_amount).await
    }

    /// Add USD to a balance
    pub async fn fake_deposit(&self, id: Uuid, amount: Amount) -> Result<Balance> {
        self.orchestrator.fake_deposit(id, amount).await
    }

    /// Holdings filtered by a comma separated symbol list (empty means all),
    /// with unit prices when `fetch_prices` is set
    pub async fn get_activities(&self, id: Uuid, symbols_csv: &str, fetch_prices: bool) -> Result<ActivitiesView> {
        self.find_account(id).await?;

        let symbols = parse_symbols(symbols_csv);
        let activities = self.activities.get_activities(id, &symbols).await?;

        let prices = if fetch_prices {
            Some(self.prices_for(&activities).await?)
        } else {
            None
        };

        Ok(ActivitiesView { activities, prices })
    }

    /// One price lookup per distinct symbol
    async fn prices_for(&self, activities: &[Activity]) -> Result<BTreeMap<String, Price>> {
        let symbols: BTreeSet<&str> = activities.iter().map(|a| a.symbol.as_str()).collect();

        let mut prices = BTreeMap::new();
        for symbol in symbols {
            let price = self.orchestrator.quote(symbol).await?;
            prices.insert(symbol.to_string(), price);
        }
        Ok(prices)
    }

    async fn find_account(&self, id: Uuid) -> Result<Account> {
        self.repo.get_account(id).await?
            .ok_or_else(|| Error::AccountNotFound(format!("Account not found: {}", id)))
    }

    fn validate_credentials(&self, login: &str, password: &str, email: &str) -> Result<()> {
        let policy = &self.credentials;

        let login_len = login.chars().count();
        if login_len < policy.login_min_length || login_len > policy.login_max_length {
            return Err(Error::ValidationError(format!(
                "Login must be {} to {} characters long",
                policy.login_min_length, policy.login_max_length
            )));
        }

        let password_len = password.chars().count();
        if password_len < policy.password_min_length || password_len > policy.password_max_length {
            return Err(Error::ValidationError(format!(
                "Password must be {} to {} characters long",
                policy.password_min_length, policy.password_max_length
            )));
        }

        if !is_email(email) {
            return Err(Error::ValidationError(format!("Invalid email: {}", email)));
        }
        Ok(())
    }
}

/// Split a `BTC, ETH,,` style list into trimmed non-empty symbols
pub fn parse_symbols(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn holdings_value(activities: &[Activity], prices: &BTreeMap<String, Price>) -> Result<Amount> {
    let mut total = Amount::ZERO;
    for activity in activities {
        let price = prices.get(&activity.symbol)
            .ok_or_else(|| Error::Internal(format!("No price for {}", activity.symbol)))?;
        let value = checked_mul(activity.amount, *price)?;
        total = total.checked_add(value)
            .ok_or_else(|| Error::DecimalError("Holdings value overflow".to_string()))?;
    }
    Ok(total)
}

/// Shape check only: `local@domain.tld`, no whitespace. Deliverability is not verified.
fn is_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !email.chars().any(char::is_whitespace)
                && !domain.contains('@')
        }
        None => false,
    }
}

async fn hash_password(password: &str, cost: u32) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| Error::Internal(format!("Hashing task failed: {}", e)))?
        .map_err(|e| Error::Internal(format!("Password hashing failed: {}", e)))
}

async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| Error::Internal(format!("Verification task failed: {}", e)))?
        .map_err(|e| Error::Internal(format!("Password verification failed: {}", e)))
}
