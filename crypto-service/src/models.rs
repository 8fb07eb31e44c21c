//! Market data models
//!
//! Field names follow the CryptoCompare wire format so the service can
//! pass provider data through unchanged.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use common::error::Error;
use serde::{Deserialize, Serialize};

/// Latest prices of one symbol in several currencies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prices {
    #[serde(rename = "Prices")]
    pub prices: BTreeMap<String, f64>,
}

/// Candle resolution of a history request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timebase {
    Days,
    Hours,
    Minutes,
}

impl Timebase {
    /// CryptoCompare endpoint serving this resolution
    pub fn endpoint(&self) -> &'static str {
        match self {
            Timebase::Days => "/data/v2/histoday",
            Timebase::Hours => "/data/v2/histohour",
            Timebase::Minutes => "/data/v2/histominute",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timebase::Days => "days",
            Timebase::Hours => "hours",
            Timebase::Minutes => "minutes",
        }
    }
}

impl Default for Timebase {
    fn default() -> Self {
        Timebase::Days
    }
}

impl fmt::Display for Timebase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timebase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "days" => Ok(Timebase::Days),
            "hours" => Ok(Timebase::Hours),
            "minutes" => Ok(Timebase::Minutes),
            other => Err(Error::BadRequest(format!(
                "Invalid timebase {}, expected days, hours or minutes", other
            ))),
        }
    }
}

/// OHLCV history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalData {
    #[serde(rename = "TimeFrom", default)]
    pub time_from: i64,
    #[serde(rename = "TimeTo", default)]
    pub time_to: i64,
    /// Oldest candle first
    #[serde(rename = "Data", default)]
    pub data: Vec<Ohlcv>,
}

/// One candle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ohlcv {
    #[serde(rename = "Time", alias = "time")]
    pub time: i64,
    #[serde(rename = "High", alias = "high")]
    pub high: f64,
    #[serde(rename = "Low", alias = "low")]
    pub low: f64,
    #[serde(rename = "Open", alias = "open")]
    pub open: f64,
    #[serde(rename = "Close", alias = "close")]
    pub close: f64,
    #[serde(rename = "VolumeFrom", alias = "volumefrom", default)]
    pub volume_from: f64,
    #[serde(rename = "VolumeTo", alias = "volumeto", default)]
    pub volume_to: f64,
}

impl Ohlcv {
    /// Midpoint of the candle's range
    pub fn mid(&self) -> f64 {
        (self.high + self.low) / 2.0
    }
}

/// Change of the latest price against a past candle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceDifference {
    /// Latest price minus the past midpoint
    pub diff: f64,
    /// `diff` relative to the past midpoint, in percent
    pub diff_percents: f64,
}
