//! Buy/sell transaction orchestrator
//!
//! Buy and Sell are short sagas over the two ledgers. All checks run first;
//! then the balance is written, then the activity. If the activity write
//! fails the balance write is compensated with [`RollbackBalance`].
//!
//! The whole operation holds the account's lock, and everything from the
//! balance write on runs in a spawned task so that dropping the caller's
//! future cannot stop it halfway.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use common::decimal::{checked_div, checked_mul, Amount, Price, Quantity};
use common::error::{Error, Result};
use common::model::account::Balance;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::ledger::{ActivityLedger, BalanceLedger};
use crate::locks::AccountLocks;
use crate::price::{PriceSource, PriceSourceError};
use crate::saga::{compensate, RollbackBalance};

/// Currency every balance and price is expressed in
pub const QUOTE_CURRENCY: &str = "USD";

/// Message returned for any price source failure
pub const FOREIGN_FAILURE: &str = "Foreign server issue or internal problem";

/// Direction of a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// Outcome of a completed buy or sell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub account_id: Uuid,
    pub side: TradeSide,
    pub symbol: String,
    /// Asset quantity bought or sold
    pub quantity: Quantity,
    /// USD paid or received
    pub usd: Amount,
    /// Unit price the trade used
    pub unit_price: Price,
    /// USD balance after the trade
    pub balance_usd: Amount,
}

/// Composes the balance ledger, the activity ledger and the price source
pub struct TransactionOrchestrator {
    balances: BalanceLedger,
    activities: ActivityLedger,
    prices: Arc<dyn PriceSource>,
    locks: Arc<AccountLocks>,
    price_timeout: Duration,
}

impl TransactionOrchestrator {
    pub fn new(
        balances: BalanceLedger,
        activities: ActivityLedger,
        prices: Arc<dyn PriceSource>,
        locks: Arc<AccountLocks>,
        price_timeout: Duration,
    ) -> Self {
        Self {
            balances,
            activities,
            prices,
            locks,
            price_timeout,
        }
    }

    /// Spend `usd_amount` of the balance on `symbol` at the current price
    pub async fn buy(&self, account_id: Uuid, symbol: &str, usd_amount: Amount) -> Result<TradeReceipt> {
        validate_symbol(symbol)?;
        if usd_amount <= Amount::ZERO {
            return Err(Error::BadRequest(format!("USD amount must be positive, got {}", usd_amount)));
        }

        let guard = self.locks.acquire(account_id).await;

        let balance = self.balances.get_balance(account_id).await?;
        let previous_usd = balance.usd()?;
        let remaining_usd = self.balances.debit(&balance, usd_amount)?;

        let unit_price = self.quote(symbol).await?;
        let quantity = checked_div(usd_amount, unit_price).map_err(|e| foreign_failure(symbol, e))?;
        ensure_tradable(symbol, quantity, usd_amount)?;

        let balances = self.balances.clone();
        let activities = self.activities.clone();
        let debited = balance.with_usd(remaining_usd);
        let symbol = symbol.to_string();

        run_to_completion(async move {
            let _guard = guard;

            let written = balances.save_balance(&debited).await?;
            let rollback = RollbackBalance::new(&written, previous_usd);

            if let Err(e) = activities.upsert_on_buy(account_id, &symbol, quantity).await {
                return Err(compensate(e, rollback, &balances).await);
            }

            info!(
                account_id = %account_id,
                symbol = %symbol,
                quantity = %quantity,
                usd = %usd_amount,
                unit_price = %unit_price,
                "Buy completed"
            );
            Ok(TradeReceipt {
                account_id,
                side: TradeSide::Buy,
                symbol,
                quantity,
                usd: usd_amount,
                unit_price,
                balance_usd: remaining_usd,
            })
        })
        .await
    }

    /// Sell part of a holding. The size is given either in USD
    /// (`usd_amount`, takes precedence when non-zero) or in asset units
    /// (`asset_amount`).
    pub async fn sell(
        &self,
        account_id: Uuid,
        symbol: &str,
        usd_amount: Amount,
        asset_amount: Quantity,
    ) -> Result<TradeReceipt> {
        validate_symbol(symbol)?;
        if usd_amount < Amount::ZERO || asset_amount < Quantity::ZERO {
            return Err(Error::BadRequest("Sell amounts must not be negative".to_string()));
        }
        if usd_amount.is_zero() && asset_amount.is_zero() {
            return Err(Error::BadRequest("Either a USD amount or an asset amount is required".to_string()));
        }

        let guard = self.locks.acquire(account_id).await;

        let balance = self.balances.get_balance(account_id).await?;
        let previous_usd = balance.usd()?;

        let unit_price = self.quote(symbol).await?;
        let (credited_usd, sold) = if usd_amount > Amount::ZERO {
            let sold = checked_div(usd_amount, unit_price).map_err(|e| foreign_failure(symbol, e))?;
            (usd_amount, sold)
        } else {
            let credited = checked_mul(asset_amount, unit_price).map_err(|e| foreign_failure(symbol, e))?;
            (credited, asset_amount)
        };
        ensure_tradable(symbol, sold, credited_usd)?;

        let plan = self.activities.plan_sell(account_id, symbol, sold).await?;
        let credited_balance_usd = self.balances.credit(&balance, credited_usd)?;

        let balances = self.balances.clone();
        let activities = self.activities.clone();
        let credited = balance.with_usd(credited_balance_usd);
        let symbol = symbol.to_string();

        run_to_completion(async move {
            let _guard = guard;

            let written = balances.save_balance(&credited).await?;
            let rollback = RollbackBalance::new(&written, previous_usd);

            if let Err(e) = activities.apply_sell(&plan).await {
                return Err(compensate(e, rollback, &balances).await);
            }

            info!(
                account_id = %account_id,
                symbol = %symbol,
                quantity = %sold,
                usd = %credited_usd,
                unit_price = %unit_price,
                "Sell completed"
            );
            Ok(TradeReceipt {
                account_id,
                side: TradeSide::Sell,
                symbol,
                quantity: sold,
                usd: credited_usd,
                unit_price,
                balance_usd: credited_balance_usd,
            })
        })
        .await
    }

    /// Add USD to a balance without any trade
    pub async fn fake_deposit(&self, account_id: Uuid, amount: Amount) -> Result<Balance> {
        if amount <= Amount::ZERO {
            return Err(Error::BadRequest(format!("Deposit must be positive, got {}", amount)));
        }

        let _guard = self.locks.acquire(account_id).await;

        let balance = self.balances.get_balance(account_id).await?;
        let usd = self.balances.credit(&balance, amount)?;
        let saved = self.balances.save_balance(&balance.with_usd(usd)).await?;

        info!(account_id = %account_id, amount = %amount, "Deposit completed");
        Ok(saved)
    }

    /// Current USD price of one unit of `symbol`. Any failure of the price
    /// source, including the timeout, becomes one opaque internal error.
    pub async fn quote(&self, symbol: &str) -> Result<Price> {
        let lookup = self.prices.unit_price(symbol, QUOTE_CURRENCY);

        let outcome = match tokio::time::timeout(self.price_timeout, lookup).await {
            Ok(result) => result,
            Err(_) => Err(PriceSourceError::Timeout),
        };

        outcome.map_err(|e| foreign_failure(symbol, e))
    }
}

fn validate_symbol(symbol: &str) -> Result<()> {
    if symbol.trim().is_empty() {
        return Err(Error::BadRequest("Symbol is required".to_string()));
    }
    Ok(())
}

/// Rejects trades whose size rounds to nothing at the current price
fn ensure_tradable(symbol: &str, quantity: Quantity, usd: Amount) -> Result<()> {
    if quantity <= Quantity::ZERO || usd <= Amount::ZERO {
        return Err(Error::BadRequest(format!(
            "Amount too small to trade {} at the current price", symbol
        )));
    }
    Ok(())
}

fn foreign_failure(symbol: &str, cause: impl std::fmt::Display) -> Error {
    error!(symbol = %symbol, cause = %cause, "Price lookup failed");
    Error::Internal(FOREIGN_FAILURE.to_string())
}

/// Drive a saga on its own task so that it finishes even if the caller
/// stops waiting.
async fn run_to_completion<T, F>(saga: F) -> Result<T>
where
    T: Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
{
    tokio::spawn(saga)
        .await
        .map_err(|e| Error::Internal(format!("Saga task aborted: {}", e)))?
}
