//! Account service: identity, USD balance and crypto holdings
//!
//! Buy and Sell run through the [`TransactionOrchestrator`], which keeps the
//! balance and the activity ledger consistent without a store transaction.

pub mod api;
pub mod config;
pub mod ledger;
pub mod locks;
pub mod orchestrator;
pub mod price;
pub mod repository;
pub mod saga;
pub mod service;

pub use config::{AccountServiceConfig, CredentialPolicy};
pub use orchestrator::{TradeReceipt, TradeSide, TransactionOrchestrator};
pub use price::{HttpPriceSource, PriceSource, PriceSourceError};
pub use repository::{AccountRepository, InMemoryAccountRepository, PostgresAccountRepository};
pub use service::AccountService;
