use std::collections::HashMap;

use crate::schema::{MetricKind, MetricRecord};

/// Prefix of every metric the exporter produces.
pub const NAMESPACE: &str = "iexcloud";

/// Joins namespace, subsystem and name with `_`, skipping empty parts.
pub fn fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    [namespace, subsystem, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

/// Name, help text and label schema of one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDesc {
    name: String,
    help: &'static str,
    label_names: Vec<&'static str>,
}

impl MetricDesc {
    pub fn new(
        subsystem: &str,
        name: &str,
        help: &'static str,
        label_names: &[&'static str],
    ) -> Self {
        Self {
            name: fq_name(NAMESPACE, subsystem, name),
            help,
            label_names: label_names.to_vec(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &'static str {
        self.help
    }

    pub fn label_names(&self) -> &[&'static str] {
        &self.label_names
    }

    /// Builds a gauge record for this metric.
    ///
    /// `labels` must follow `label_names` in order and count.
    pub fn gauge(&self, value: f64, labels: Vec<String>) -> MetricRecord {
        debug_assert_eq!(
            labels.len(),
            self.label_names.len(),
            "label arity mismatch for {}",
            self.name
        );
        MetricRecord {
            name: self.name.clone(),
            labels,
            value,
            kind: MetricKind::Gauge,
        }
    }
}

// ------------------------------------------------------------
// Key statistics
// ------------------------------------------------------------
//
// One single-value gauge per variant, emitted in `ALL` order.
//
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyStat {
    MarketCap,
    Week52High,
    Week52Low,
    Week52Change,
    SharesOutstanding,
    Avg30Volume,
    Avg10Volume,
    Float,
    Employees,
    TtmEps,
    TtmDividendRate,
    DividendYield,
    PeRatio,
    Beta,
    Day200MovingAvg,
    Day50MovingAvg,
    MaxChangePercent,
    Year5ChangePercent,
    Year2ChangePercent,
    Year1ChangePercent,
    YtdChangePercent,
    Month6ChangePercent,
    Month3ChangePercent,
    Month1ChangePercent,
    Day30ChangePercent,
    Day5ChangePercent,
}

impl KeyStat {
    pub const ALL: [KeyStat; 26] = [
        KeyStat::MarketCap,
        KeyStat::Week52High,
        KeyStat::Week52Low,
        KeyStat::Week52Change,
        KeyStat::SharesOutstanding,
        KeyStat::Avg30Volume,
        KeyStat::Avg10Volume,
        KeyStat::Float,
        KeyStat::Employees,
        KeyStat::TtmEps,
        KeyStat::TtmDividendRate,
        KeyStat::DividendYield,
        KeyStat::PeRatio,
        KeyStat::Beta,
        KeyStat::Day200MovingAvg,
        KeyStat::Day50MovingAvg,
        KeyStat::MaxChangePercent,
        KeyStat::Year5ChangePercent,
        KeyStat::Year2ChangePercent,
        KeyStat::Year1ChangePercent,
        KeyStat::YtdChangePercent,
        KeyStat::Month6ChangePercent,
        KeyStat::Month3ChangePercent,
        KeyStat::Month1ChangePercent,
        KeyStat::Day30ChangePercent,
        KeyStat::Day5ChangePercent,
    ];

    /// Metric suffix, matching the upstream field name.
    pub fn field(&self) -> &'static str {
        match self {
            KeyStat::MarketCap => "marketcap",
            KeyStat::Week52High => "week52high",
            KeyStat::Week52Low => "week52low",
            KeyStat::Week52Change => "week52change",
            KeyStat::SharesOutstanding => "sharesOutstanding",
            KeyStat::Avg30Volume => "avg30Volume",
            KeyStat::Avg10Volume => "avg10Volume",
            KeyStat::Float => "float",
            KeyStat::Employees => "employees",
            KeyStat::TtmEps => "ttmEPS",
            KeyStat::TtmDividendRate => "ttmDividendRate",
            KeyStat::DividendYield => "dividendYield",
            KeyStat::PeRatio => "peRatio",
            KeyStat::Beta => "beta",
            KeyStat::Day200MovingAvg => "day200MovingAvg",
            KeyStat::Day50MovingAvg => "day50MovingAvg",
            KeyStat::MaxChangePercent => "maxChangePercent",
            KeyStat::Year5ChangePercent => "year5ChangePercent",
            KeyStat::Year2ChangePercent => "year2ChangePercent",
            KeyStat::Year1ChangePercent => "year1ChangePercent",
            KeyStat::YtdChangePercent => "ytdChangePercent",
            KeyStat::Month6ChangePercent => "month6ChangePercent",
            KeyStat::Month3ChangePercent => "month3ChangePercent",
            KeyStat::Month1ChangePercent => "month1ChangePercent",
            KeyStat::Day30ChangePercent => "day30ChangePercent",
            KeyStat::Day5ChangePercent => "day5ChangePercent",
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            KeyStat::MarketCap => {
                "Market cap of the security calculated as shares outstanding * previous day close."
            }
            KeyStat::Week52High => "52 weeks high",
            KeyStat::Week52Low => "52 weeks low",
            KeyStat::Week52Change => "52 weeks percentage change",
            KeyStat::SharesOutstanding => {
                "Number of shares outstanding as the difference between issued shares and treasury shares"
            }
            KeyStat::Avg30Volume => "Average 30 day volume",
            KeyStat::Avg10Volume => "Average 10 day volume",
            KeyStat::Float => "Annual shares outstanding minus closely held shares",
            KeyStat::Employees => "Number of employees",
            KeyStat::TtmEps => "Trailing twelve month earnings per share",
            KeyStat::TtmDividendRate => "Trailing twelve month dividend rate per share",
            KeyStat::DividendYield => {
                "Ratio of trailing twelve month dividend compared to the previous day close price"
            }
            KeyStat::PeRatio => {
                "Price to earnings ratio calculated as (previous day close price) / (ttmEPS)"
            }
            KeyStat::Beta => "Volatility of the security in relation to the overall market",
            KeyStat::Day200MovingAvg => "200 days moving average",
            KeyStat::Day50MovingAvg => "50 days moving average",
            KeyStat::MaxChangePercent => "Percent change MAX",
            KeyStat::Year5ChangePercent => "Percent change 5 years",
            KeyStat::Year2ChangePercent => "Percent change 2 years",
            KeyStat::Year1ChangePercent => "Percent change 1 year",
            KeyStat::YtdChangePercent => "Percent change YTD",
            KeyStat::Month6ChangePercent => "Percent change 6 months",
            KeyStat::Month3ChangePercent => "Percent change 3 months",
            KeyStat::Month1ChangePercent => "Percent change 1 month",
            KeyStat::Day30ChangePercent => "Percent change 30 days",
            KeyStat::Day5ChangePercent => "Percent change 5 days",
        }
    }
}

/// Metric descriptor table.
///
/// Built once at start-up and shared (behind `Arc`) with the
/// exporter, every collector and the exposition layer.
///
/// Label schemas here are the contract: a record whose label
/// count differs from its descriptor is never exposed.
#[derive(Debug, Clone)]
pub struct MetricDescriptors {
    pub up: MetricDesc,
    pub build_info: MetricDesc,
    pub price: MetricDesc,
    pub dividends: MetricDesc,
    keystats: Vec<MetricDesc>,
    pub keystats_dates: MetricDesc,
}

impl MetricDescriptors {
    pub fn new() -> Self {
        let keystats = KeyStat::ALL
            .iter()
            .map(|stat| MetricDesc::new("keystats", stat.field(), stat.help(), &["symbol"]))
            .collect();

        Self {
            up: MetricDesc::new(
                "",
                "up",
                "Was the last query of iexcloud successful.",
                &[],
            ),
            build_info: MetricDesc::new(
                "",
                "build_info",
                "Build information of the running exporter.",
                &["version"],
            ),
            price: MetricDesc::new("", "price", "Current stock price", &["symbol"]),
            dividends: MetricDesc::new(
                "",
                "dividends",
                "Dividends for the given stock symbol and the given date range",
                &[
                    "symbol",
                    "range",
                    "exDate",
                    "paymentDate",
                    "recordDate",
                    "declaredDate",
                ],
            ),
            keystats,
            keystats_dates: MetricDesc::new(
                "keystats",
                "dates",
                "Expected ex date of the next dividend, ex date of the last dividend, expected next earnings report date",
                &[
                    "symbol",
                    "nextDividendDate",
                    "exDividendDate",
                    "nextEarningsDate",
                ],
            ),
        }
    }

    /// Descriptor for one key statistic.
    pub fn keystat(&self, stat: KeyStat) -> &MetricDesc {
        &self.keystats[stat as usize]
    }

    /// Every descriptor in the table.
    pub fn iter(&self) -> impl Iterator<Item = &MetricDesc> {
        [&self.up, &self.build_info, &self.price, &self.dividends]
            .into_iter()
            .chain(self.keystats.iter())
            .chain(std::iter::once(&self.keystats_dates))
    }

    /// Name → descriptor lookup used by the exposition layer.
    pub fn by_name(&self) -> HashMap<&str, &MetricDesc> {
        self.iter().map(|d| (d.name(), d)).collect()
    }
}

impl Default for MetricDescriptors {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_namespaced() {
        let d = MetricDescriptors::new();
        assert_eq!(d.up.name(), "iexcloud_up");
        assert_eq!(d.price.name(), "iexcloud_price");
        assert_eq!(d.keystat(KeyStat::TtmEps).name(), "iexcloud_keystats_ttmEPS");
        assert_eq!(d.keystats_dates.name(), "iexcloud_keystats_dates");
    }

    #[test]
    fn keystat_table_follows_enum_order() {
        let d = MetricDescriptors::new();
        for stat in KeyStat::ALL {
            assert!(d.keystat(stat).name().ends_with(stat.field()));
        }
        assert_eq!(d.iter().count(), 4 + KeyStat::ALL.len() + 1);
    }

    #[test]
    fn names_are_unique() {
        let d = MetricDescriptors::new();
        assert_eq!(d.by_name().len(), d.iter().count());
    }

    #[test]
    fn gauge_keeps_label_order() {
        let d = MetricDescriptors::new();
        let r = d.price.gauge(12.5, vec!["AAPL".into()]);
        assert_eq!(r.name, "iexcloud_price");
        assert_eq!(r.labels, vec!["AAPL"]);
        assert_eq!(r.value, 12.5);
    }
}
