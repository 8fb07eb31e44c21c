//! Crypto price service: a thin proxy over a market data provider

pub mod api;
pub mod config;
pub mod models;
pub mod provider;
pub mod service;

pub use config::CryptoServiceConfig;
pub use models::{HistoricalData, Ohlcv, PriceDifference, Prices, Timebase};
pub use provider::{CryptoCompareClient, MarketDataProvider};
pub use service::CryptoService;
