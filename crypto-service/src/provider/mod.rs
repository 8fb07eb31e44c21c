//! Market data providers

mod cryptocompare;

use async_trait::async_trait;
use common::error::Result;

use crate::models::{HistoricalData, Prices, Timebase};

pub use cryptocompare::CryptoCompareClient;

/// Source of prices and OHLCV history
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Latest price of `symbol` in each of `symbols_to`
    async fn latest_price(&self, symbol: &str, symbols_to: &[String]) -> Result<Prices>;

    /// `limit` candles of `fsym` priced in `tsym`, oldest first
    async fn history(&self, timebase: Timebase, fsym: &str, tsym: &str, limit: u32) -> Result<HistoricalData>;
}
