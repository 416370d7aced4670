use std::fmt;

/// Central record type used across the entire scrape pipeline.
///
/// This struct represents the unified shape exchanged between:
/// - Collectors (price, dividends, keystats)
/// - The metric sink
/// - The exposition layer
///
/// DESIGN NOTES:
/// - Records are created only through `MetricDesc::gauge`, which
///   enforces label arity for the metric name.
/// - Label values are ordered to match the descriptor's label names.
///
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    /// Fully qualified metric name (e.g. "iexcloud_price")
    pub name: String,

    /// Label values, same order and arity as the descriptor
    pub labels: Vec<String>,

    /// Sample value
    pub value: f64,

    /// Metric kind
    pub kind: MetricKind,
}

/// Supported metric kinds.
///
/// Everything the exporter produces is a point-in-time gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
}

impl fmt::Display for MetricRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?} = {}", self.name, self.labels, self.value)
    }
}
