use std::sync::Arc;

use common::decimal::Amount;
use common::error::{Error, Result};
use common::model::account::Balance;
use tracing::info;
use uuid::Uuid;

use crate::repository::AccountRepository;

/// Owns the "never debit below zero" invariant of the USD balance
#[derive(Clone)]
pub struct BalanceLedger {
    repo: Arc<dyn AccountRepository>,
}

impl BalanceLedger {
    pub fn new(repo: Arc<dyn AccountRepository>) -> Self {
        Self { repo }
    }

    /// Current balance row of an account
    pub async fn get_balance(&self, account_id: Uuid) -> Result<Balance> {
        self.repo.get_balance(account_id).await?
            .ok_or_else(|| Error::AccountNotFound(format!("No balance for account {}", account_id)))
    }

    /// USD left after spending `amount`, or `InsufficientBalance`.
    /// Performs no write.
    pub fn debit(&self, balance: &Balance, amount: Amount) -> Result<Amount> {
        let usd = balance.usd()?;
        let remaining = usd - amount;
        if remaining < Amount::ZERO {
            return Err(Error::InsufficientBalance(format!(
                "Account {} has {} USD, needs {}", balance.account_id, usd, amount
            )));
        }
        Ok(remaining)
    }

    /// USD after receiving `amount`. Credits have no upper bound.
    pub fn credit(&self, balance: &Balance, amount: Amount) -> Result<Amount> {
        let usd = balance.usd()?;
        usd.checked_add(amount)
            .ok_or_else(|| Error::DecimalError(format!("Cannot add {} to {}", amount, usd)))
    }

    /// Persist a balance (compare-and-swap on its version)
    pub async fn save_balance(&self, balance: &Balance) -> Result<Balance> {
        let saved = self.repo.update_balance(balance).await?;
        info!(
            account_id = %saved.account_id,
            usd = ?saved.usd,
            version = saved.version,
            "Balance updated"
        );
        Ok(saved)
    }
}
