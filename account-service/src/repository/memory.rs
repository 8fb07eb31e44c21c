use async_trait::async_trait;
use chrono::Utc;
use common::error::{Error, Result};
use common::model::account::{Account, Activity, Balance, NewAccount};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use super::AccountRepository;

/// In-memory repository for account data
#[derive(Default)]
pub struct InMemoryAccountRepository {
    /// Accounts by ID
    pub accounts: DashMap<Uuid, Account>,
    /// Balances by account ID
    pub balances: DashMap<Uuid, Balance>,
    /// Activities by account ID and symbol
    pub activities: DashMap<(Uuid, String), Activity>,
    /// Unique login index
    logins: DashMap<String, Uuid>,
    /// Unique email index
    emails: DashMap<String, Uuid>,
}

impl InMemoryAccountRepository {
    /// Create a new in-memory account repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn create_account(&self, new: NewAccount) -> Result<Account> {
        let id = Uuid::new_v4();

        match self.logins.entry(new.login.clone()) {
            Entry::Occupied(_) => {
                return Err(Error::AlreadyExists(format!("Login {} is taken", new.login)));
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }
        match self.emails.entry(new.email.clone()) {
            Entry::Occupied(_) => {
                self.logins.remove(&new.login);
                return Err(Error::AlreadyExists(format!("Email {} is taken", new.email)));
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        let account = Account {
            id,
            login: new.login,
            email: new.email,
            password_hash: new.password_hash,
            roles: new.roles,
            created_at: Utc::now(),
        };

        self.balances.insert(id, Balance::new(id, new.usd));
        self.accounts.insert(id, account.clone());
        Ok(account)
    }

    async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.accounts.get(&id).map(|a| a.clone()))
    }

    async fn get_account_by_login(&self, login: &str) -> Result<Option<Account>> {
        let id = match self.logins.get(login) {
            Some(id) => *id,
            None => return Ok(None),
        };
        self.get_account(id).await
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let id = match self.emails.get(email) {
            Some(id) => *id,
            None => return Ok(None),
        };
        self.get_account(id).await
    }

    async fn delete_account(&self, id: Uuid) -> Result<()> {
        let (_, account) = self.accounts
            .remove(&id)
            .ok_or_else(|| Error::AccountNotFound(format!("Account not found: {}", id)))?;

        self.logins.remove(&account.login);
        self.emails.remove(&account.email);
        self.balances.remove(&id);
        self.activities.retain(|(account_id, _), _| *account_id != id);
        Ok(())
    }

    async fn get_balance(&self, account_id: Uuid) -> Result<Option<Balance>> {
        Ok(self.balances.get(&account_id).map(|b| b.clone()))
    }

    async fn update_balance(&self, balance: &Balance) -> Result<Balance> {
        let mut stored = self.balances
            .get_mut(&balance.account_id)
            .ok_or_else(|| Error::AccountNotFound(format!("No balance for account {}", balance.account_id)))?;

        if stored.version != balance.version {
            return Err(Error::Conflict(format!(
                "Balance of account {} changed concurrently (expected version {}, found {})",
                balance.account_id, balance.version, stored.version
            )));
        }

        let updated = Balance {
            account_id: balance.account_id,
            usd: balance.usd,
            version: balance.version + 1,
            updated_at: Utc::now(),
        };
        *stored = updated.clone();
        Ok(updated)
    }

    async fn get_activity(&self, account_id: Uuid, symbol: &str) -> Result<Option<Activity>> {
        Ok(self.activities
            .get(&(account_id, symbol.to_string()))
            .map(|a| a.clone()))
    }

    async fn create_activity(&self, activity: &Activity) -> Result<Activity> {
        if !self.accounts.contains_key(&activity.account_id) {
            return Err(Error::AccountNotFound(format!("Account not found: {}", activity.account_id)));
        }

        match self.activities.entry((activity.account_id, activity.symbol.clone())) {
            Entry::Occupied(_) => Err(Error::AlreadyExists(format!(
                "Activity {} already exists for account {}",
                activity.symbol, activity.account_id
            ))),
            Entry::Vacant(slot) => {
                let stored = Activity { updated_at: Utc::now(), ..activity.clone() };
                slot.insert(stored.clone());
                Ok(stored)
            }
        }
    }

    async fn update_activity(&self, activity: &Activity) -> Result<Activity> {
        let mut stored = self.activities
            .get_mut(&(activity.account_id, activity.symbol.clone()))
            .ok_or_else(|| Error::ActivityNotFound(format!(
                "No {} activity for account {}", activity.symbol, activity.account_id
            )))?;

        stored.amount = activity.amount;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete_activity(&self, account_id: Uuid, symbol: &str) -> Result<()> {
        self.activities
            .remove(&(account_id, symbol.to_string()))
            .map(|_| ())
            .ok_or_else(|| Error::ActivityNotFound(format!("No {} activity for account {}", symbol, account_id)))
    }

    async fn get_activities(&self, account_id: Uuid, symbols: &[String]) -> Result<Vec<Activity>> {
        let mut activities: Vec<Activity> = self.activities
            .iter()
            .filter_map(|entry| {
                let ((acc_id, symbol), activity) = entry.pair();
                let wanted = symbols.is_empty() || symbols.iter().any(|s| s == symbol);
                if *acc_id == account_id && wanted {
                    Some(activity.clone())
                } else {
                    None
                }
            })
            .collect();

        activities.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(activities)
    }
}
