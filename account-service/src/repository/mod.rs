//! Repository for account data
//!
//! The Account Store: point reads and single-row writes of accounts,
//! balances and activities. No multi-row transaction is exposed; the
//! orchestrator keeps balance and activity consistent on its own.

mod memory;
mod postgres;

use async_trait::async_trait;
use common::error::Result;
use common::model::account::{Account, Activity, Balance, NewAccount};
use uuid::Uuid;

pub use memory::InMemoryAccountRepository;
pub use postgres::PostgresAccountRepository;

/// Account repository trait defining the interface for account data storage
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Persist a new account together with its balance row.
    /// Fails with `AlreadyExists` on a duplicate login or email.
    async fn create_account(&self, account: NewAccount) -> Result<Account>;

    /// Get an account by ID
    async fn get_account(&self, id: Uuid) -> Result<Option<Account>>;

    /// Get an account by its unique login
    async fn get_account_by_login(&self, login: &str) -> Result<Option<Account>>;

    /// Get an account by its unique email
    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Hard-delete an account, its balance and all of its activities
    async fn delete_account(&self, id: Uuid) -> Result<()>;

    /// Get the balance row of an account
    async fn get_balance(&self, account_id: Uuid) -> Result<Option<Balance>>;

    /// Write a balance if the stored version still equals `balance.version`.
    /// Returns the stored row with the bumped version; `Conflict` when the
    /// versions differ, `AccountNotFound` when there is no row.
    async fn update_balance(&self, balance: &Balance) -> Result<Balance>;

    /// Get the activity of an account for one symbol
    async fn get_activity(&self, account_id: Uuid, symbol: &str) -> Result<Option<Activity>>;

    /// Insert an activity; `AlreadyExists` if the (account, symbol) row exists
    async fn create_activity(&self, activity: &Activity) -> Result<Activity>;

    /// Overwrite the amount of an existing activity; `ActivityNotFound` if absent
    async fn update_activity(&self, activity: &Activity) -> Result<Activity>;

    /// Delete an activity; `ActivityNotFound` if absent
    async fn delete_activity(&self, account_id: Uuid, symbol: &str) -> Result<()>;

    /// Activities of an account, restricted to `symbols` unless it is empty.
    /// Sorted by symbol.
    async fn get_activities(&self, account_id: Uuid, symbols: &[String]) -> Result<Vec<Activity>>;
}
