use async_trait::async_trait;

use crate::config::ParameterSet;
use crate::error::CollectError;
use crate::iex::KeyStats;
use crate::metrics::KeyStat;
use crate::sink::MetricSink;
use crate::util::date_label;

use super::{Collector, CollectorContext, CollectorKind};

/// Key statistics per symbol.
///
/// Per symbol: one gauge per `KeyStat` (in `KeyStat::ALL` order),
/// then one `iexcloud_keystats_dates` record with value 1 carrying
/// the next dividend, ex-dividend and next earnings dates as labels.
///
/// Sentinel and missing dates are labeled `unknown`.
pub struct KeyStatsCollector {
    symbols: Vec<String>,
    ctx: CollectorContext,
}

impl KeyStatsCollector {
    pub fn new(params: ParameterSet, ctx: CollectorContext) -> Self {
        Self {
            symbols: params.symbols,
            ctx,
        }
    }
}

#[async_trait]
impl Collector for KeyStatsCollector {
    fn kind(&self) -> CollectorKind {
        CollectorKind::KeyStats
    }

    async fn emit(&self, sink: &MetricSink) -> Result<(), CollectError> {
        let descriptors = &self.ctx.descriptors;

        for symbol in &self.symbols {
            let stats = self
                .ctx
                .call(symbol, self.ctx.client.key_stats(symbol))
                .await?;

            for stat in KeyStat::ALL {
                sink.emit(
                    descriptors
                        .keystat(stat)
                        .gauge(stat_value(&stats, stat), vec![symbol.clone()]),
                );
            }

            sink.emit(descriptors.keystats_dates.gauge(
                1.0,
                vec![
                    symbol.clone(),
                    date_label(stats.next_dividend_date),
                    date_label(stats.ex_dividend_date),
                    date_label(stats.next_earnings_date),
                ],
            ));
        }

        Ok(())
    }
}

fn stat_value(stats: &KeyStats, stat: KeyStat) -> f64 {
    match stat {
        KeyStat::MarketCap => stats.market_cap,
        KeyStat::Week52High => stats.week52_high,
        KeyStat::Week52Low => stats.week52_low,
        KeyStat::Week52Change => stats.week52_change,
        KeyStat::SharesOutstanding => stats.shares_outstanding,
        KeyStat::Avg30Volume => stats.avg30_volume,
        KeyStat::Avg10Volume => stats.avg10_volume,
        KeyStat::Float => stats.float,
        KeyStat::Employees => stats.employees,
        KeyStat::TtmEps => stats.ttm_eps,
        KeyStat::TtmDividendRate => stats.ttm_dividend_rate,
        KeyStat::DividendYield => stats.dividend_yield,
        KeyStat::PeRatio => stats.pe_ratio,
        KeyStat::Beta => stats.beta,
        KeyStat::Day200MovingAvg => stats.day200_moving_avg,
        KeyStat::Day50MovingAvg => stats.day50_moving_avg,
        KeyStat::MaxChangePercent => stats.max_change_percent,
        KeyStat::Year5ChangePercent => stats.year5_change_percent,
        KeyStat::Year2ChangePercent => stats.year2_change_percent,
        KeyStat::Year1ChangePercent => stats.year1_change_percent,
        KeyStat::YtdChangePercent => stats.ytd_change_percent,
        KeyStat::Month6ChangePercent => stats.month6_change_percent,
        KeyStat::Month3ChangePercent => stats.month3_change_percent,
        KeyStat::Month1ChangePercent => stats.month1_change_percent,
        KeyStat::Day30ChangePercent => stats.day30_change_percent,
        KeyStat::Day5ChangePercent => stats.day5_change_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_stat_maps_to_its_field() {
        let stats = KeyStats {
            market_cap: 1.0,
            employees: 137_000.0,
            day5_change_percent: -0.02,
            ..KeyStats::default()
        };

        assert_eq!(stat_value(&stats, KeyStat::MarketCap), 1.0);
        assert_eq!(stat_value(&stats, KeyStat::Employees), 137_000.0);
        assert_eq!(stat_value(&stats, KeyStat::Day5ChangePercent), -0.02);
        assert_eq!(stat_value(&stats, KeyStat::Beta), 0.0);
    }
}
