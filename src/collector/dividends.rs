use async_trait::async_trait;

use crate::config::ParameterSet;
use crate::error::{CollectError, ParameterError};
use crate::iex::{Dividend, RangeCode};
use crate::schema::MetricRecord;
use crate::sink::MetricSink;
use crate::util::date_label;

use super::{Collector, CollectorContext, CollectorKind};

/// Dividend history per symbol and range.
///
/// Walks symbols × ranges (symbols outer) with one upstream call
/// per pair and emits one record per returned dividend row.
///
/// LABELS:
/// - symbol, range, exDate, paymentDate, recordDate, declaredDate
///
/// FAILURE:
/// - The first failed call or unparsable amount stops the walk;
///   later pairs are not requested
///
pub struct DividendCollector {
    symbols: Vec<String>,
    ranges: Vec<RangeCode>,
    ctx: CollectorContext,
}

impl DividendCollector {
    /// Requires a `range` parameter.
    pub fn new(params: ParameterSet, ctx: CollectorContext) -> Result<Self, ParameterError> {
        let ranges = params.require_range()?.to_vec();

        Ok(Self {
            symbols: params.symbols,
            ranges,
            ctx,
        })
    }

    fn record(
        &self,
        symbol: &str,
        range: RangeCode,
        dividend: &Dividend,
    ) -> Result<MetricRecord, CollectError> {
        let amount = parse_amount(symbol, &dividend.amount)?;

        Ok(self.ctx.descriptors.dividends.gauge(
            amount,
            vec![
                symbol.to_string(),
                range.to_string(),
                date_label(dividend.ex_date),
                date_label(dividend.payment_date),
                date_label(dividend.record_date),
                date_label(dividend.declared_date),
            ],
        ))
    }
}

#[async_trait]
impl Collector for DividendCollector {
    fn kind(&self) -> CollectorKind {
        CollectorKind::Dividends
    }

    async fn emit(&self, sink: &MetricSink) -> Result<(), CollectError> {
        for symbol in &self.symbols {
            for &range in &self.ranges {
                let rows = self
                    .ctx
                    .call(symbol, self.ctx.client.dividends(symbol, range))
                    .await?;

                for dividend in &rows {
                    sink.emit(self.record(symbol, range, dividend)?);
                }
            }
        }

        Ok(())
    }
}

/// Parses a textual decimal amount.
///
/// Accepts plain decimals only; empty, non-numeric and
/// non-finite values are rejected.
fn parse_amount(symbol: &str, raw: &str) -> Result<f64, CollectError> {
    let invalid = || CollectError::ValueParse {
        symbol: symbol.to_string(),
        field: "dividend amount",
        value: raw.to_string(),
    };

    let trimmed = raw.trim();
    let plain = !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'));
    if !plain {
        return Err(invalid());
    }

    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(invalid)
}
