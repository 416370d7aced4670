/// Collector module
///
/// This module groups all logic responsible for:
/// - The `Collector` contract shared by every metric type
/// - The closed set of collector kinds and their registry
/// - Running one scrape across all configured entries (`runner`)
///
/// The collector layer sits between:
/// - The upstream client (`MarketData`)
/// - The metric sink (records for the exposition layer)
///
/// Design notes:
/// - Upstream-specific logic MUST NOT live here
/// - Adding a metric type means one new `CollectorKind` variant
///   and one collector module
pub mod runner;

mod dividends;
mod keystats;
mod price;

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::ParameterSet;
use crate::error::{CollectError, ParameterError, UpstreamError};
use crate::iex::MarketData;
use crate::metrics::MetricDescriptors;
use crate::sink::MetricSink;

pub use dividends::DividendCollector;
pub use keystats::KeyStatsCollector;
pub use price::PriceCollector;

/// Collector is the contract between:
/// - The generic scrape runner
/// - Metric-type specific conversion logic
///
/// Instances are created fresh for every scrape from a validated
/// `ParameterSet` and dropped once `emit` returns.
///
/// THREAD SAFETY:
/// - Must be Send + Sync
/// - Each collector runs in its own task
///
#[async_trait]
pub trait Collector: Send + Sync {
    /// Metric type this collector serves.
    fn kind(&self) -> CollectorKind;

    /// Performs the upstream calls and pushes records into `sink`.
    ///
    /// BEHAVIOR:
    /// - Emission order follows the collector's iteration order
    /// - Stops at the first failure and returns it
    /// - Records already emitted are kept
    ///
    async fn emit(&self, sink: &MetricSink) -> Result<(), CollectError>;
}

// ------------------------------------------------------------
// Shared collector context
// ------------------------------------------------------------

/// Everything a collector needs besides its parameters.
#[derive(Clone)]
pub struct CollectorContext {
    pub client: Arc<dyn MarketData>,
    pub descriptors: Arc<MetricDescriptors>,
    pub cancel: CancellationToken,
}

impl CollectorContext {
    /// Runs one upstream call, racing it against cancellation.
    pub async fn call<T, F>(&self, symbol: &str, request: F) -> Result<T, CollectError>
    where
        F: Future<Output = Result<T, UpstreamError>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(CollectError::Cancelled),
            result = request => result.map_err(|e| CollectError::upstream(symbol, e)),
        }
    }
}

// ------------------------------------------------------------
// Collector kinds
// ------------------------------------------------------------
//
// Closed set of metric types. The configuration key of an
// entry must match `name()` exactly.
//
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectorKind {
    Price,
    Dividends,
    KeyStats,
}

impl CollectorKind {
    pub const ALL: [CollectorKind; 3] = [
        CollectorKind::Price,
        CollectorKind::Dividends,
        CollectorKind::KeyStats,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CollectorKind::Price => "price",
            CollectorKind::Dividends => "dividends",
            CollectorKind::KeyStats => "keystats",
        }
    }

    /// Validates `params` and builds the collector.
    ///
    /// Fails with `ParameterError` without building anything when
    /// any parameter is invalid.
    pub fn build(
        &self,
        params: &Value,
        ctx: CollectorContext,
    ) -> Result<Box<dyn Collector>, ParameterError> {
        let params = ParameterSet::from_value(params)?;

        Ok(match self {
            CollectorKind::Price => Box::new(PriceCollector::new(params, ctx)),
            CollectorKind::Dividends => Box::new(DividendCollector::new(params, ctx)?),
            CollectorKind::KeyStats => Box::new(KeyStatsCollector::new(params, ctx)),
        })
    }
}

impl FromStr for CollectorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CollectorKind::ALL
            .iter()
            .copied()
            .find(|k| k.name() == s)
            .ok_or_else(|| format!("unknown collector `{s}`"))
    }
}

impl fmt::Display for CollectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ------------------------------------------------------------
// Registry
// ------------------------------------------------------------

/// Resolves configuration keys to collector kinds.
///
/// Only kinds passed at construction dispatch; every other key,
/// known or not, resolves to `None` and its entry is skipped.
///
/// CONTRACT:
/// - Built once at start-up from the `--collectors` flag
/// - Shared read-only by all scrape tasks
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorRegistry {
    enabled: Vec<CollectorKind>,
}

impl CollectorRegistry {
    pub fn new(kinds: impl IntoIterator<Item = CollectorKind>) -> Self {
        let mut enabled: Vec<CollectorKind> = Vec::new();
        for kind in kinds {
            if !enabled.contains(&kind) {
                enabled.push(kind);
            }
        }
        Self { enabled }
    }

    /// Registry with every known kind enabled.
    pub fn all() -> Self {
        Self::new(CollectorKind::ALL)
    }

    pub fn resolve(&self, metric_type: &str) -> Option<CollectorKind> {
        let kind = metric_type.parse::<CollectorKind>().ok()?;
        self.enabled.contains(&kind).then_some(kind)
    }

    pub fn enabled(&self) -> &[CollectorKind] {
        &self.enabled
    }
}

impl Default for CollectorRegistry {
    fn default() -> Self {
        Self::all()
    }
}
