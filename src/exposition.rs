//! Prometheus exposition of a scrape.
//!
//! Each scrape gets a fresh `Registry`: only the records of that
//! scrape are exposed and nothing outlives the request.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use log::warn;
use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};

use crate::metrics::{MetricDesc, MetricDescriptors};
use crate::schema::MetricRecord;

/// Content type of `encode` output.
pub const CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

/// Encodes `records` in the Prometheus text format.
pub fn encode(
    records: &[MetricRecord],
    descriptors: &MetricDescriptors,
) -> Result<Vec<u8>, prometheus::Error> {
    let registry = registry_for(records, descriptors)?;

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(buffer)
}

/// Builds a registry holding one gauge family per metric name.
///
/// Records for undeclared names or with a label count that does
/// not match their descriptor are logged and skipped. When two
/// records share name and labels, the later value wins.
pub fn registry_for(
    records: &[MetricRecord],
    descriptors: &MetricDescriptors,
) -> Result<Registry, prometheus::Error> {
    let registry = Registry::new();
    let declared = descriptors.by_name();
    let mut families: HashMap<&str, Family> = HashMap::new();

    for record in records {
        let Some(desc) = declared.get(record.name.as_str()) else {
            warn!("dropping record for undeclared metric {}", record.name);
            continue;
        };

        if record.labels.len() != desc.label_names().len() {
            warn!(
                "dropping {}: expected {} labels, got {}",
                record.name,
                desc.label_names().len(),
                record.labels.len()
            );
            continue;
        }

        let family = match families.entry(desc.name()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                let family = Family::new(desc)?;
                family.register(&registry)?;
                e.insert(family)
            }
        };

        family.set(record)?;
    }

    Ok(registry)
}

enum Family {
    Plain(Gauge),
    Labeled(GaugeVec),
}

impl Family {
    fn new(desc: &MetricDesc) -> Result<Self, prometheus::Error> {
        let opts = Opts::new(desc.name(), desc.help());

        if desc.label_names().is_empty() {
            Ok(Family::Plain(Gauge::with_opts(opts)?))
        } else {
            Ok(Family::Labeled(GaugeVec::new(opts, desc.label_names())?))
        }
    }

    fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        match self {
            Family::Plain(g) => registry.register(Box::new(g.clone())),
            Family::Labeled(v) => registry.register(Box::new(v.clone())),
        }
    }

    fn set(&self, record: &MetricRecord) -> Result<(), prometheus::Error> {
        match self {
            Family::Plain(g) => g.set(record.value),
            Family::Labeled(v) => {
                let values: Vec<&str> = record.labels.iter().map(String::as_str).collect();
                v.get_metric_with_label_values(&values)?.set(record.value);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::MetricKind;

    fn text(records: &[MetricRecord]) -> String {
        let d = MetricDescriptors::new();
        String::from_utf8(encode(records, &d).unwrap()).unwrap()
    }

    #[test]
    fn encodes_labeled_and_plain_gauges() {
        let d = MetricDescriptors::new();
        let out = text(&[
            d.price.gauge(187.5, vec!["AAPL".into()]),
            d.up.gauge(1.0, vec![]),
        ]);

        assert!(out.contains("# TYPE iexcloud_price gauge"));
        assert!(out.contains(r#"iexcloud_price{symbol="AAPL"} 187.5"#));
        assert!(out.contains("iexcloud_up 1"));
    }

    #[test]
    fn skips_records_with_wrong_arity() {
        let bad = MetricRecord {
            name: "iexcloud_price".into(),
            labels: vec!["AAPL".into(), "extra".into()],
            value: 1.0,
            kind: MetricKind::Gauge,
        };
        let out = text(&[bad]);
        assert!(!out.contains("iexcloud_price"));
    }

    #[test]
    fn skips_undeclared_metrics() {
        let stray = MetricRecord {
            name: "iexcloud_quote".into(),
            labels: vec![],
            value: 1.0,
            kind: MetricKind::Gauge,
        };
        assert!(text(&[stray]).is_empty());
    }

    #[test]
    fn dividend_labels_are_exposed() {
        let d = MetricDescriptors::new();
        let out = text(&[d.dividends.gauge(
            0.77,
            vec![
                "AAPL".into(),
                "1y".into(),
                "2019-08-09".into(),
                "2019-08-15".into(),
                "2019-08-12".into(),
                "unknown".into(),
            ],
        )]);

        let line = out
            .lines()
            .find(|l| l.starts_with("iexcloud_dividends{"))
            .unwrap();
        for pair in [
            r#"symbol="AAPL""#,
            r#"range="1y""#,
            r#"exDate="2019-08-09""#,
            r#"paymentDate="2019-08-15""#,
            r#"recordDate="2019-08-12""#,
            r#"declaredDate="unknown""#,
        ] {
            assert!(line.contains(pair), "{pair} missing in {line}");
        }
        assert!(line.ends_with(" 0.77"));
    }
}
