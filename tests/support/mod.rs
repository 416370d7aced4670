//! In-memory market data double shared by integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use iexcloud_exporter::error::UpstreamError;
use iexcloud_exporter::iex::{Dividend, KeyStats, MarketData, RangeCode};
use iexcloud_exporter::{CollectorRegistry, Exporter, MetricDescriptors, MetricRecord};

#[derive(Default)]
pub struct FakeMarket {
    pub prices: HashMap<String, f64>,
    pub dividends: HashMap<(String, RangeCode), Vec<Dividend>>,
    pub stats: HashMap<String, KeyStats>,
    pub failing_dividends: HashSet<(String, RangeCode)>,
    pub hang_prices: bool,
    pub delay: Option<Duration>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeMarket {
    pub fn with_price(mut self, symbol: &str, price: f64) -> Self {
        self.prices.insert(symbol.to_string(), price);
        self
    }

    pub fn with_dividends(mut self, symbol: &str, range: RangeCode, rows: Vec<Dividend>) -> Self {
        self.dividends.insert((symbol.to_string(), range), rows);
        self
    }

    pub fn with_stats(mut self, symbol: &str, stats: KeyStats) -> Self {
        self.stats.insert(symbol.to_string(), stats);
        self
    }

    pub fn failing_dividends(mut self, symbol: &str, range: RangeCode) -> Self {
        self.failing_dividends.insert((symbol.to_string(), range));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn not_found(what: &str) -> UpstreamError {
    UpstreamError::Status {
        status: 404,
        url: what.to_string(),
    }
}

#[async_trait]
impl MarketData for FakeMarket {
    async fn price(&self, symbol: &str) -> Result<f64, UpstreamError> {
        self.record(format!("price {symbol}")).await;
        if self.hang_prices {
            std::future::pending::<()>().await;
        }
        self.prices.get(symbol).copied().ok_or_else(|| not_found(symbol))
    }

    async fn dividends(
        &self,
        symbol: &str,
        range: RangeCode,
    ) -> Result<Vec<Dividend>, UpstreamError> {
        self.record(format!("dividends {symbol} {range}")).await;
        let key = (symbol.to_string(), range);
        if self.failing_dividends.contains(&key) {
            return Err(UpstreamError::Decode("boom".into()));
        }
        self.dividends.get(&key).cloned().ok_or_else(|| not_found(symbol))
    }

    async fn key_stats(&self, symbol: &str) -> Result<KeyStats, UpstreamError> {
        self.record(format!("keystats {symbol}")).await;
        self.stats.get(symbol).cloned().ok_or_else(|| not_found(symbol))
    }
}

pub fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

pub fn dividend(amount: &str, ex: Option<NaiveDate>) -> Dividend {
    Dividend {
        amount: amount.to_string(),
        ex_date: ex,
        payment_date: date(2019, 8, 15),
        record_date: date(2019, 8, 12),
        declared_date: date(2019, 7, 30),
    }
}

pub fn exporter(market: Arc<FakeMarket>, config: &str) -> Exporter {
    Exporter::new(
        market,
        CollectorRegistry::all(),
        Arc::new(MetricDescriptors::new()),
        config.as_bytes().to_vec(),
    )
}

pub fn named<'a>(records: &'a [MetricRecord], name: &str) -> Vec<&'a MetricRecord> {
    records.iter().filter(|r| r.name == name).collect()
}

pub fn up(records: &[MetricRecord]) -> f64 {
    let ups = named(records, "iexcloud_up");
    assert_eq!(ups.len(), 1, "exactly one up record expected");
    ups[0].value
}
