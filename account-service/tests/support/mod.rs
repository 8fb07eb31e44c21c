//! Fakes shared by the account service tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use account_service::{
    AccountRepository, AccountService, AccountServiceConfig, InMemoryAccountRepository, PriceSource,
    PriceSourceError,
};
use async_trait::async_trait;
use common::decimal::Price;
use common::error::{Error, Result};
use common::model::account::{Account, Activity, Balance, NewAccount};
use dashmap::DashMap;
use uuid::Uuid;

/// Prices set by the test
#[derive(Default)]
pub struct FixedPrices {
    prices: DashMap<String, Price>,
}

impl FixedPrices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, symbol: &str, price: Price) -> Self {
        self.set(symbol, price);
        self
    }

    pub fn set(&self, symbol: &str, price: Price) {
        self.prices.insert(symbol.to_string(), price);
    }

    pub fn remove(&self, symbol: &str) {
        self.prices.remove(symbol);
    }
}

#[async_trait]
impl PriceSource for FixedPrices {
    async fn unit_price(&self, symbol: &str, quote: &str) -> std::result::Result<Price, PriceSourceError> {
        assert_eq!(quote, "USD");
        self.prices
            .get(symbol)
            .map(|p| *p)
            .ok_or_else(|| PriceSourceError::MissingCurrency(symbol.to_string()))
    }
}

/// Price source whose host is down
pub struct UnreachablePrices;

#[async_trait]
impl PriceSource for UnreachablePrices {
    async fn unit_price(&self, _symbol: &str, _quote: &str) -> std::result::Result<Price, PriceSourceError> {
        Err(PriceSourceError::Network("connection refused by 10.0.0.1:443".to_string()))
    }
}

/// Price source that never answers in time
pub struct StalledPrices(pub Duration);

#[async_trait]
impl PriceSource for StalledPrices {
    async fn unit_price(&self, _symbol: &str, _quote: &str) -> std::result::Result<Price, PriceSourceError> {
        tokio::time::sleep(self.0).await;
        Ok(Price::ONE)
    }
}

/// In-memory store with switchable faults
#[derive(Default)]
pub struct FaultyRepository {
    pub inner: InMemoryAccountRepository,
    /// Activity writes fail
    pub fail_activity_writes: AtomicBool,
    /// Balance writes fail once the budget reaches zero
    pub balance_write_budget: Mutex<Option<usize>>,
    /// Delay before each activity write
    pub activity_delay: Mutex<Option<Duration>>,
}

impl FaultyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_activity_writes(&self) {
        self.fail_activity_writes.store(true, Ordering::SeqCst);
    }

    /// Let `n` more balance writes through, fail the rest
    pub fn allow_balance_writes(&self, n: usize) {
        *self.balance_write_budget.lock().unwrap() = Some(n);
    }

    pub fn delay_activity_writes(&self, delay: Duration) {
        *self.activity_delay.lock().unwrap() = Some(delay);
    }

    async fn before_activity_write(&self) -> Result<()> {
        let delay = *self.activity_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_activity_writes.load(Ordering::SeqCst) {
            return Err(Error::Internal("activity store unavailable".to_string()));
        }
        Ok(())
    }

    fn before_balance_write(&self) -> Result<()> {
        let mut budget = self.balance_write_budget.lock().unwrap();
        match budget.as_mut() {
            Some(0) => Err(Error::Internal("balance store unavailable".to_string())),
            Some(n) => {
                *n -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AccountRepository for FaultyRepository {
    async fn create_account(&self, account: NewAccount) -> Result<Account> {
        self.inner.create_account(account).await
    }

    async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        self.inner.get_account(id).await
    }

    async fn get_account_by_login(&self, login: &str) -> Result<Option<Account>> {
        self.inner.get_account_by_login(login).await
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.inner.get_account_by_email(email).await
    }

    async fn delete_account(&self, id: Uuid) -> Result<()> {
        self.inner.delete_account(id).await
    }

    async fn get_balance(&self, account_id: Uuid) -> Result<Option<Balance>> {
        self.inner.get_balance(account_id).await
    }

    async fn update_balance(&self, balance: &Balance) -> Result<Balance> {
        self.before_balance_write()?;
        self.inner.update_balance(balance).await
    }

    async fn get_activity(&self, account_id: Uuid, symbol: &str) -> Result<Option<Activity>> {
        self.inner.get_activity(account_id, symbol).await
    }

    async fn create_activity(&self, activity: &Activity) -> Result<Activity> {
        self.before_activity_write().await?;
        self.inner.create_activity(activity).await
    }

    async fn update_activity(&self, activity: &Activity) -> Result<Activity> {
        self.before_activity_write().await?;
        self.inner.update_activity(activity).await
    }

    async fn delete_activity(&self, account_id: Uuid, symbol: &str) -> Result<()> {
        self.before_activity_write().await?;
        self.inner.delete_activity(account_id, symbol).await
    }

    async fn get_activities(&self, account_id: Uuid, symbols: &[String]) -> Result<Vec<Activity>> {
        self.inner.get_activities(account_id, symbols).await
    }
}

pub fn test_config() -> AccountServiceConfig {
    AccountServiceConfig::for_tests("http://127.0.0.1:9")
}

/// Service over a given store and price source
pub fn service_with(repo: Arc<dyn AccountRepository>, prices: Arc<dyn PriceSource>) -> AccountService {
    AccountService::new(repo, prices, &test_config())
}

/// Create an account with the default 15000 USD
pub async fn new_account(service: &AccountService, login: &str) -> Uuid {
    service
        .create_account(login, "secret-password", &format!("{}@example.com", login))
        .await
        .unwrap()
        .id
}
