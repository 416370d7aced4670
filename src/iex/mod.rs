//! IEX Cloud upstream contract
//!
//! This module provides:
//! - The `MarketData` trait every collector talks to
//! - Domain payloads (`Dividend`, `KeyStats`) and the `RangeCode` vocabulary
//! - The reqwest-backed `IexClient` implementation
//!
//! Collectors never see HTTP. Tests substitute an in-memory `MarketData`.

pub mod client;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{ParameterError, UpstreamError};
use crate::util::DATE_FORMAT;

pub use client::IexClient;

/// Upstream financial-data operations used by the collectors.
///
/// THREAD SAFETY:
/// - Must be Send + Sync
/// - One instance is shared by every collector of a scrape
///
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Latest price for `symbol`.
    async fn price(&self, symbol: &str) -> Result<f64, UpstreamError>;

    /// Dividend rows for `symbol` within `range`.
    async fn dividends(
        &self,
        symbol: &str,
        range: RangeCode,
    ) -> Result<Vec<Dividend>, UpstreamError>;

    /// Key statistics snapshot for `symbol`.
    async fn key_stats(&self, symbol: &str) -> Result<KeyStats, UpstreamError>;
}

// ------------------------------------------------------------
// Range codes
// ------------------------------------------------------------
//
// Historical lookback windows accepted by range-scoped
// endpoints. The textual form is what appears in configuration,
// request paths and the `range` label.
//
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeCode {
    Max,
    FiveYears,
    TwoYears,
    OneYear,
    YearToDate,
    SixMonths,
    ThreeMonths,
    OneMonth,
    OneMonthMinute,
    FiveDays,
    FiveDaysMinute,
    Next,
}

impl RangeCode {
    pub const ALL: [RangeCode; 12] = [
        RangeCode::Max,
        RangeCode::FiveYears,
        RangeCode::TwoYears,
        RangeCode::OneYear,
        RangeCode::YearToDate,
        RangeCode::SixMonths,
        RangeCode::ThreeMonths,
        RangeCode::OneMonth,
        RangeCode::OneMonthMinute,
        RangeCode::FiveDays,
        RangeCode::FiveDaysMinute,
        RangeCode::Next,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RangeCode::Max => "max",
            RangeCode::FiveYears => "5y",
            RangeCode::TwoYears => "2y",
            RangeCode::OneYear => "1y",
            RangeCode::YearToDate => "ytd",
            RangeCode::SixMonths => "6m",
            RangeCode::ThreeMonths => "3m",
            RangeCode::OneMonth => "1m",
            RangeCode::OneMonthMinute => "1mm",
            RangeCode::FiveDays => "5d",
            RangeCode::FiveDaysMinute => "5dm",
            RangeCode::Next => "next",
        }
    }
}

impl FromStr for RangeCode {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RangeCode::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ParameterError::UnknownRange(s.to_string()))
    }
}

impl fmt::Display for RangeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ------------------------------------------------------------
// Dividend row
// ------------------------------------------------------------
//
// `amount` stays textual; the dividend collector parses it and
// reports a parse failure as a collector error.
//
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dividend {
    #[serde(deserialize_with = "decimal_text")]
    pub amount: String,

    #[serde(default, deserialize_with = "optional_date")]
    pub ex_date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "optional_date")]
    pub payment_date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "optional_date")]
    pub record_date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "optional_date")]
    pub declared_date: Option<NaiveDate>,
}

// ------------------------------------------------------------
// Key statistics
// ------------------------------------------------------------
//
// Numeric fields the API reports as `null` are read as 0.
//
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct KeyStats {
    #[serde(rename = "marketcap", default, deserialize_with = "number_or_zero")]
    pub market_cap: f64,
    #[serde(rename = "week52high", default, deserialize_with = "number_or_zero")]
    pub week52_high: f64,
    #[serde(rename = "week52low", default, deserialize_with = "number_or_zero")]
    pub week52_low: f64,
    #[serde(rename = "week52change", default, deserialize_with = "number_or_zero")]
    pub week52_change: f64,
    #[serde(rename = "sharesOutstanding", default, deserialize_with = "number_or_zero")]
    pub shares_outstanding: f64,
    #[serde(rename = "avg30Volume", default, deserialize_with = "number_or_zero")]
    pub avg30_volume: f64,
    #[serde(rename = "avg10Volume", default, deserialize_with = "number_or_zero")]
    pub avg10_volume: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub float: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub employees: f64,
    #[serde(rename = "ttmEPS", default, deserialize_with = "number_or_zero")]
    pub ttm_eps: f64,
    #[serde(rename = "ttmDividendRate", default, deserialize_with = "number_or_zero")]
    pub ttm_dividend_rate: f64,
    #[serde(rename = "dividendYield", default, deserialize_with = "number_or_zero")]
    pub dividend_yield: f64,
    #[serde(rename = "peRatio", default, deserialize_with = "number_or_zero")]
    pub pe_ratio: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub beta: f64,
    #[serde(rename = "day200MovingAvg", default, deserialize_with = "number_or_zero")]
    pub day200_moving_avg: f64,
    #[serde(rename = "day50MovingAvg", default, deserialize_with = "number_or_zero")]
    pub day50_moving_avg: f64,
    #[serde(rename = "maxChangePercent", default, deserialize_with = "number_or_zero")]
    pub max_change_percent: f64,
    #[serde(rename = "year5ChangePercent", default, deserialize_with = "number_or_zero")]
    pub year5_change_percent: f64,
    #[serde(rename = "year2ChangePercent", default, deserialize_with = "number_or_zero")]
    pub year2_change_percent: f64,
    #[serde(rename = "year1ChangePercent", default, deserialize_with = "number_or_zero")]
    pub year1_change_percent: f64,
    #[serde(rename = "ytdChangePercent", default, deserialize_with = "number_or_zero")]
    pub ytd_change_percent: f64,
    #[serde(rename = "month6ChangePercent", default, deserialize_with = "number_or_zero")]
    pub month6_change_percent: f64,
    #[serde(rename = "month3ChangePercent", default, deserialize_with = "number_or_zero")]
    pub month3_change_percent: f64,
    #[serde(rename = "month1ChangePercent", default, deserialize_with = "number_or_zero")]
    pub month1_change_percent: f64,
    #[serde(rename = "day30ChangePercent", default, deserialize_with = "number_or_zero")]
    pub day30_change_percent: f64,
    #[serde(rename = "day5ChangePercent", default, deserialize_with = "number_or_zero")]
    pub day5_change_percent: f64,

    #[serde(rename = "nextDividendDate", default, deserialize_with = "optional_date")]
    pub next_dividend_date: Option<NaiveDate>,
    #[serde(rename = "exDividendDate", default, deserialize_with = "optional_date")]
    pub ex_dividend_date: Option<NaiveDate>,
    #[serde(rename = "nextEarningsDate", default, deserialize_with = "optional_date")]
    pub next_earnings_date: Option<NaiveDate>,
}

// ------------------------------------------------------------
// Payload helpers
// ------------------------------------------------------------

/// Accepts `"0.82"` or `0.82`; keeps the textual form.
fn decimal_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected decimal amount, got {other}"
        ))),
    }
}

/// `null`, missing and `""` become `None`.
fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => {
            // Some endpoints append a time component.
            let day = s.get(..10).unwrap_or(s);
            NaiveDate::parse_from_str(day, DATE_FORMAT)
                .map(Some)
                .map_err(|e| serde::de::Error::custom(format!("invalid date {s:?}: {e}")))
        }
    }
}

fn number_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_default())
}
