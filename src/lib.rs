// ------------------------------------------------------------
// Module declarations
// ------------------------------------------------------------
//
// Each module represents a well-defined responsibility:
//
// - config:     Metrics document (entries + parameter validation)
// - error:      Error types for config, parameters, upstream, collectors
// - schema:     Metric record shape fed to the exposition layer
// - metrics:    Metric descriptor table (names, help, label schemas)
// - util:       Shared helpers (date labels, endpoint URLs)
// - iex:        Upstream market-data contract and HTTP client
// - sink:       Many-producer record channel for one scrape
// - collector:  Collector contract, registry and scrape runner
// - exposition: Prometheus text encoding of a scrape
// - server:     HTTP front end
//
pub mod config;
pub mod error;
pub mod schema;
pub mod metrics;
pub mod util;
pub mod iex;
pub mod sink;
pub mod collector;
pub mod exposition;
pub mod server;

pub use collector::runner::{Exporter, Scrape, ScrapeOutcome};
pub use collector::{CollectorKind, CollectorRegistry};
pub use metrics::MetricDescriptors;
pub use schema::MetricRecord;
