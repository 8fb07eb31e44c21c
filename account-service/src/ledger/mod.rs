//! Balance and activity ledgers
//!
//! Each ledger owns one invariant over one kind of row. Neither knows about
//! the other; the orchestrator composes them.

mod activity;
mod balance;

pub use activity::{ActivityLedger, SellPlan};
pub use balance::BalanceLedger;
