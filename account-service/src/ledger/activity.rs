use std::sync::Arc;

use common::decimal::Quantity;
use common::error::{Error, Result};
use common::model::account::Activity;
use tracing::info;
use uuid::Uuid;

use crate::repository::AccountRepository;

/// What a validated sell will do to the activity row
#[derive(Debug, Clone, PartialEq)]
pub enum SellPlan {
    /// Keep the row with a smaller amount
    Decrement(Activity),
    /// The whole holding is sold, remove the row
    Remove { account_id: Uuid, symbol: String },
}

/// Owns the per-symbol holdings: buys create or increment, sells decrement
/// or delete, and no row ever holds zero or less.
#[derive(Clone)]
pub struct ActivityLedger {
    repo: Arc<dyn AccountRepository>,
}

impl ActivityLedger {
    pub fn new(repo: Arc<dyn AccountRepository>) -> Self {
        Self { repo }
    }

    /// Holding of one symbol
    pub async fn get_activity(&self, account_id: Uuid, symbol: &str) -> Result<Activity> {
        self.repo.get_activity(account_id, symbol).await?
            .ok_or_else(|| Error::ActivityNotFound(format!("No {} activity for account {}", symbol, account_id)))
    }

    /// Holdings of an account, optionally restricted to some symbols
    pub async fn get_activities(&self, account_id: Uuid, symbols: &[String]) -> Result<Vec<Activity>> {
        self.repo.get_activities(account_id, symbols).await
    }

    /// Create the row on the first buy of a symbol, add to it afterwards
    pub async fn upsert_on_buy(&self, account_id: Uuid, symbol: &str, delta: Quantity) -> Result<Activity> {
        ensure_positive(symbol, delta)?;
        let activity = match self.repo.get_activity(account_id, symbol).await? {
            None => {
                self.repo.create_activity(&Activity::new(account_id, symbol, delta)).await?
            }
            Some(mut existing) => {
                existing.amount = existing.amount.checked_add(delta).ok_or_else(|| {
                    Error::DecimalError(format!("Cannot add {} to {} {}", delta, existing.amount, symbol))
                })?;
                self.repo.update_activity(&existing).await?
            }
        };

        info!(
            account_id = %account_id,
            symbol = %symbol,
            delta = %delta,
            amount = %activity.amount,
            "Activity increased"
        );
        Ok(activity)
    }

    /// Check a sell against the current holding without writing anything
    pub async fn plan_sell(&self, account_id: Uuid, symbol: &str, delta: Quantity) -> Result<SellPlan> {
        ensure_positive(symbol, delta)?;
        let existing = self.get_activity(account_id, symbol).await?;
        let remaining = existing.amount - delta;

        if remaining < Quantity::ZERO {
            return Err(Error::InsufficientHoldings(format!(
                "Account {} holds {} {}, tried to sell {}", account_id, existing.amount, symbol, delta
            )));
        }

        if remaining == Quantity::ZERO {
            Ok(SellPlan::Remove { account_id, symbol: symbol.to_string() })
        } else {
            Ok(SellPlan::Decrement(Activity { amount: remaining, ..existing }))
        }
    }

    /// Carry out a previously validated sell
    pub async fn apply_sell(&self, plan: &SellPlan) -> Result<()> {
        match plan {
            SellPlan::Decrement(activity) => {
                self.repo.update_activity(activity).await?;
                info!(
                    account_id = %activity.account_id,
                    symbol = %activity.symbol,
                    amount = %activity.amount,
                    "Activity decreased"
                );
            }
            SellPlan::Remove { account_id, symbol } => {
                self.repo.delete_activity(*account_id, symbol).await?;
                info!(account_id = %account_id, symbol = %symbol, "Activity sold out and removed");
            }
        }
        Ok(())
    }
}

fn ensure_positive(symbol: &str, delta: Quantity) -> Result<()> {
    if delta <= Quantity::ZERO {
        return Err(Error::BadRequest(format!("{} quantity must be positive, got {}", symbol, delta)));
    }
    Ok(())
}
