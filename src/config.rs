use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{ConfigError, ParameterError};
use crate::iex::RangeCode;

// ------------------------------------------------------------
// Root configuration
// ------------------------------------------------------------
//
// This is the top-level metrics document, loaded from
// `config.json` at start-up and parsed again on every scrape.
//
// Example:
//
//   { "metrics": [
//       { "price":     { "symbols": ["AAPL", "MSFT"] } },
//       { "dividends": { "symbols": ["AAPL"], "range": ["1y"] } } ] }
//
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct MetricSpec {
    /// Ordered metric entries, one collection task each
    #[serde(default)]
    pub metrics: Vec<MetricEntry>,
}

impl MetricSpec {
    /// Parses raw configuration bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self, ConfigError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

// ------------------------------------------------------------
// Metric entry
// ------------------------------------------------------------
//
// A single-key object: metric-type name → parameter object.
// Parameters stay untyped here; they are validated by the
// collector kind the entry resolves to.
//
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(try_from = "Map<String, Value>")]
pub struct MetricEntry {
    /// Metric-type key (e.g. "price", "dividends", "keystats")
    pub metric_type: String,

    /// Raw parameter object
    pub params: Value,
}

impl TryFrom<Map<String, Value>> for MetricEntry {
    type Error = String;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        if map.len() != 1 {
            return Err(format!(
                "metric entry must have exactly one key, found {}",
                map.len()
            ));
        }

        let Some((metric_type, params)) = map.into_iter().next() else {
            return Err("empty metric entry".to_string());
        };

        Ok(Self {
            metric_type,
            params,
        })
    }
}

// ------------------------------------------------------------
// Parameter set
// ------------------------------------------------------------
//
// Validated parameters for one collector.
//
// IMPORTANT:
// - `symbols` keeps configuration order and duplicates
// - `range` is parsed eagerly; one unknown token rejects
//   the whole set
//
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSet {
    pub symbols: Vec<String>,
    pub range: Option<Vec<RangeCode>>,
}

impl ParameterSet {
    pub fn from_value(params: &Value) -> Result<Self, ParameterError> {
        let obj = params.as_object().ok_or(ParameterError::NotAnObject)?;

        let symbols = obj.get("symbols").ok_or(ParameterError::MissingSymbols)?;
        let symbols = string_list(symbols).ok_or(ParameterError::InvalidSymbols)?;
        if symbols.is_empty() {
            return Err(ParameterError::EmptySymbols);
        }

        let range = match obj.get("range") {
            None => None,
            Some(raw) => {
                let tokens = string_list(raw).ok_or(ParameterError::InvalidRange)?;
                let codes = tokens
                    .iter()
                    .map(|t| t.parse::<RangeCode>())
                    .collect::<Result<Vec<_>, _>>()?;
                Some(codes)
            }
        };

        Ok(Self { symbols, range })
    }

    /// Range codes for range-scoped collectors.
    pub fn require_range(&self) -> Result<&[RangeCode], ParameterError> {
        self.range.as_deref().ok_or(ParameterError::MissingRange)
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

// ------------------------------------------------------------
// Configuration loader
// ------------------------------------------------------------
//
// Reads the metrics document from disk. The bytes are kept
// as-is; parsing happens per scrape.
//
pub fn load_metrics_config(path: impl AsRef<Path>) -> Result<Vec<u8>, ConfigError> {
    let path = path.as_ref();
    fs::read(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}
