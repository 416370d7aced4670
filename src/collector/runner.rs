use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::{
    collector::{CollectorContext, CollectorRegistry},
    config::{MetricEntry, MetricSpec},
    iex::MarketData,
    metrics::MetricDescriptors,
    schema::MetricRecord,
    sink::{self, MetricSink},
};

/// Default upper bound for one scrape.
pub const DEFAULT_SCRAPE_TIMEOUT: Duration = Duration::from_secs(30);

/// Time cancelled tasks get to unwind before they are aborted.
const CANCEL_GRACE: Duration = Duration::from_secs(1);

/// Summary of one `collect` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeOutcome {
    /// Entries found in the configuration (= tasks spawned)
    pub entries: usize,

    /// Tasks that ended with a parameter, upstream or parse error
    pub failed: usize,

    /// The configuration bytes could not be parsed
    pub config_error: bool,

    /// The scrape deadline fired before every task finished
    pub timed_out: bool,

    /// Value reported through `iexcloud_up`
    pub healthy: bool,
}

/// Records and outcome of one complete scrape.
#[derive(Debug, Clone)]
pub struct Scrape {
    pub records: Vec<MetricRecord>,
    pub outcome: ScrapeOutcome,
}

/// How a single entry task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryResult {
    Done,
    Skipped,
    Failed,
}

/// Runs scrapes over the configured metric entries.
///
/// DESIGN:
/// - One task per configuration entry, no pool
/// - All tasks share the sink, the client and one cancellation token
/// - `collect` returns only after every task finished
///
/// HEALTH:
/// - Unhealthy when the configuration cannot be parsed
/// - Unhealthy when the scrape deadline fires
/// - Per-collector failures are logged and counted but keep the
///   scrape healthy
///
pub struct Exporter {
    client: Arc<dyn MarketData>,
    registry: Arc<CollectorRegistry>,
    descriptors: Arc<MetricDescriptors>,
    config: Vec<u8>,
    scrape_timeout: Duration,
}

impl Exporter {
    pub fn new(
        client: Arc<dyn MarketData>,
        registry: CollectorRegistry,
        descriptors: Arc<MetricDescriptors>,
        config: Vec<u8>,
    ) -> Self {
        Self {
            client,
            registry: Arc::new(registry),
            descriptors,
            config,
            scrape_timeout: DEFAULT_SCRAPE_TIMEOUT,
        }
    }

    pub fn with_scrape_timeout(mut self, timeout: Duration) -> Self {
        self.scrape_timeout = timeout;
        self
    }

    pub fn descriptors(&self) -> &Arc<MetricDescriptors> {
        &self.descriptors
    }

    /// Runs one full scrape over the configured bytes.
    ///
    /// The returned records include every collector emission, the
    /// `up` record and `build_info`.
    pub async fn scrape(&self) -> Scrape {
        let (sink, rx) = MetricSink::channel();
        let drained = sink::drain(rx);

        let outcome = self.collect(&self.config, &sink).await;
        sink.emit(
            self.descriptors
                .build_info
                .gauge(1.0, vec![env!("CARGO_PKG_VERSION").to_string()]),
        );
        drop(sink);

        let records = match drained.await {
            Ok(records) => records,
            Err(e) => {
                error!("metric drain task failed: {}", e);
                Vec::new()
            }
        };

        Scrape { records, outcome }
    }

    /// Collects every entry of `config` into `sink`.
    ///
    /// Ends with exactly one `up` record in the sink.
    pub async fn collect(&self, config: &[u8], sink: &MetricSink) -> ScrapeOutcome {
        let (entries, config_error) = match MetricSpec::parse(config) {
            Ok(spec) => (spec.metrics, false),
            Err(e) => {
                error!("cannot read metrics configuration: {}", e);
                (Vec::new(), true)
            }
        };

        let total = entries.len();
        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();

        // Concurrently collecting all the metrics
        for (index, entry) in entries.into_iter().enumerate() {
            let ctx = CollectorContext {
                client: self.client.clone(),
                descriptors: self.descriptors.clone(),
                cancel: cancel.clone(),
            };
            let registry = self.registry.clone();
            let sink = sink.clone();

            tasks.spawn(async move { run_entry(index, entry, &registry, ctx, &sink).await });
        }

        info!("waiting for metrics to be collected, total={}", total);

        let mut failed = 0;
        let joined =
            tokio::time::timeout(self.scrape_timeout, join_tasks(&mut tasks, &mut failed)).await;

        let timed_out = joined.is_err();
        if timed_out {
            warn!(
                "scrape exceeded {:?}, cancelling {} pending collectors",
                self.scrape_timeout,
                tasks.len()
            );
            cancel.cancel();

            let unwound =
                tokio::time::timeout(CANCEL_GRACE, join_tasks(&mut tasks, &mut failed)).await;
            if unwound.is_err() {
                tasks.abort_all();
                join_tasks(&mut tasks, &mut failed).await;
            }
        }

        let healthy = !config_error && !timed_out;
        info!(
            "collecting metrics result={} entries={} failed={}",
            healthy, total, failed
        );

        sink.emit(
            self.descriptors
                .up
                .gauge(if healthy { 1.0 } else { 0.0 }, Vec::new()),
        );

        ScrapeOutcome {
            entries: total,
            failed,
            config_error,
            timed_out,
            healthy,
        }
    }
}

/// Waits for every remaining task, counting failures.
async fn join_tasks(tasks: &mut JoinSet<EntryResult>, failed: &mut usize) {
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(EntryResult::Failed) => *failed += 1,
            Ok(EntryResult::Done | EntryResult::Skipped) => {}
            Err(e) => {
                error!("collector task did not complete: {}", e);
                *failed += 1;
            }
        }
    }
}

/// Resolves, configures and runs the collector for one entry.
async fn run_entry(
    index: usize,
    entry: MetricEntry,
    registry: &CollectorRegistry,
    ctx: CollectorContext,
    sink: &MetricSink,
) -> EntryResult {
    let Some(kind) = registry.resolve(&entry.metric_type) else {
        warn!(
            "no collector configured for metric type '{}' (entry {})",
            entry.metric_type, index
        );
        return EntryResult::Skipped;
    };

    let collector = match kind.build(&entry.params, ctx) {
        Ok(collector) => collector,
        Err(e) => {
            error!("invalid parameters for {} (entry {}): {}", kind, index, e);
            return EntryResult::Failed;
        }
    };

    info!("collecting {} (entry {})", collector.kind(), index);

    match collector.emit(sink).await {
        Ok(()) => {
            debug!("{} (entry {}) finished", kind, index);
            EntryResult::Done
        }
        Err(e) => {
            error!("cannot collect {} data (entry {}): {}", kind, index, e);
            EntryResult::Failed
        }
    }
}
