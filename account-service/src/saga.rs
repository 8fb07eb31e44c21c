//! Compensating steps for the buy/sell sagas

use common::decimal::Amount;
use common::error::{Error, Result};
use common::model::account::Balance;
use tracing::{error, warn};
use uuid::Uuid;

use crate::ledger::BalanceLedger;

/// Restores a balance to its value from before a saga wrote it
#[derive(Debug, Clone, PartialEq)]
pub struct RollbackBalance {
    pub account_id: Uuid,
    /// USD amount to write back
    pub restore_usd: Amount,
    /// Version the balance has right after the saga's own write
    pub expected_version: i64,
}

impl RollbackBalance {
    /// Undo for a balance that was just saved as `written`
    pub fn new(written: &Balance, restore_usd: Amount) -> Self {
        Self {
            account_id: written.account_id,
            restore_usd,
            expected_version: written.version,
        }
    }

    /// Write the previous USD amount back
    pub async fn run(&self, ledger: &BalanceLedger) -> Result<Balance> {
        let restore = Balance {
            account_id: self.account_id,
            usd: Some(self.restore_usd),
            version: self.expected_version,
            updated_at: chrono::Utc::now(),
        };
        ledger.save_balance(&restore).await
    }
}

/// Run `rollback` after a saga step failed with `original`.
///
/// Returns `original` when the balance was restored, a
/// `ConsistencyViolation` carrying both errors when it was not.
pub async fn compensate(original: Error, rollback: RollbackBalance, ledger: &BalanceLedger) -> Error {
    warn!(
        account_id = %rollback.account_id,
        restore_usd = %rollback.restore_usd,
        error = %original,
        "Activity write failed, rolling back balance"
    );

    match rollback.run(ledger).await {
        Ok(_) => original,
        Err(rollback_err) => {
            error!(
                alarm = "consistency_violation",
                account_id = %rollback.account_id,
                restore_usd = %rollback.restore_usd,
                original = %original,
                rollback_error = %rollback_err,
                "Balance rollback failed; stored balance no longer matches activities"
            );
            Error::ConsistencyViolation {
                original: Box::new(original),
                rollback: Box::new(rollback_err),
            }
        }
    }
}
