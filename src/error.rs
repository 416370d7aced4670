//! Error types shared across the exporter.
//!
//! Each kind maps to one failure domain:
//! - `ConfigError`:    the metrics document could not be read or parsed
//! - `ParameterError`: one collector's parameter object is invalid
//! - `UpstreamError`:  a call to the IEX Cloud API failed
//! - `CollectError`:   a collector stopped while emitting
//!
//! None of them is fatal for the process once it is serving.

use thiserror::Error;

/// Errors raised while loading or parsing the metrics configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed metrics configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A collector's parameter object failed validation.
///
/// Fails only the collector it belongs to.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParameterError {
    #[error("parameters must be an object")]
    NotAnObject,

    #[error("missing `symbols` parameter")]
    MissingSymbols,

    #[error("`symbols` must be a list of strings")]
    InvalidSymbols,

    #[error("`symbols` must not be empty")]
    EmptySymbols,

    #[error("missing `range` parameter")]
    MissingRange,

    #[error("`range` must be a list of strings")]
    InvalidRange,

    #[error("unknown range code `{0}`")]
    UnknownRange(String),
}

/// Failure of a single upstream API call.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("cannot decode response: {0}")]
    Decode(String),

    #[error("invalid endpoint: {0}")]
    Endpoint(String),
}

/// Reasons a collector stops emitting.
///
/// Records emitted before the error stay in the sink.
#[derive(Error, Debug)]
pub enum CollectError {
    #[error("upstream call for {symbol} failed: {source}")]
    Upstream {
        symbol: String,
        #[source]
        source: UpstreamError,
    },

    #[error("cannot parse {field} {value:?} for {symbol}")]
    ValueParse {
        symbol: String,
        field: &'static str,
        value: String,
    },

    #[error("collection cancelled")]
    Cancelled,
}

impl CollectError {
    pub fn upstream(symbol: &str, source: UpstreamError) -> Self {
        CollectError::Upstream {
            symbol: symbol.to_string(),
            source,
        }
    }
}
