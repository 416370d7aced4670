use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::error::UpstreamError;
use crate::util;

use super::{Dividend, KeyStats, MarketData, RangeCode};

/// IEX Cloud REST client
///
/// Endpoints used:
/// - GET {base}/stock/{symbol}/price
/// - GET {base}/stock/{symbol}/dividends/{range}
/// - GET {base}/stock/{symbol}/stats
///
/// Every request carries `?token=<api token>`.
///
/// NOTES:
/// - No retry or backoff; a failed call is reported as-is
/// - The reqwest client is cheap to clone and safe to share
///
#[derive(Clone)]
pub struct IexClient {
    http: reqwest::Client,
    base: Url,
    token: String,
}

impl IexClient {
    /// Creates a client for `endpoint`/`version`.
    ///
    /// `timeout` bounds every single request.
    pub fn new(
        endpoint: &str,
        version: &str,
        token: &str,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let base = Url::parse(&util::base_url(endpoint, version))
            .map_err(|e| UpstreamError::Endpoint(format!("{endpoint}: {e}")))?;

        if base.cannot_be_a_base() {
            return Err(UpstreamError::Endpoint(endpoint.to_string()));
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base,
            token: token.to_string(),
        })
    }

    /// Base URL requests are built from.
    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamError::Endpoint(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut().append_pair("token", &self.token);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, UpstreamError> {
        let url = self.url(segments)?;
        // path only: the query string holds the token
        let path = url.path().to_string();
        debug!("GET {}", path);

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                url: path,
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| UpstreamError::Decode(format!("{path}: {e}")))
    }
}

#[async_trait]
impl MarketData for IexClient {
    async fn price(&self, symbol: &str) -> Result<f64, UpstreamError> {
        self.get_json(&["stock", symbol, "price"]).await
    }

    async fn dividends(
        &self,
        symbol: &str,
        range: RangeCode,
    ) -> Result<Vec<Dividend>, UpstreamError> {
        self.get_json(&["stock", symbol, "dividends", range.as_str()])
            .await
    }

    async fn key_stats(&self, symbol: &str) -> Result<KeyStats, UpstreamError> {
        self.get_json(&["stock", symbol, "stats"]).await
    }
}
