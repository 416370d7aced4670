// ------------------------------------------------------------
// External dependencies
// ------------------------------------------------------------

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::info;
use rustls::crypto::{CryptoProvider, ring};
use tokio::net::TcpListener;

use iexcloud_exporter::{
    CollectorKind, CollectorRegistry, Exporter, MetricDescriptors,
    config::load_metrics_config,
    iex::IexClient,
    server::{self, MetricsServer},
};

// ------------------------------------------------------------
// Command line
// ------------------------------------------------------------

/// Prometheus exporter for IEX Cloud market data
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on for web interface and telemetry
    #[arg(long = "web.listen-address", default_value = "0.0.0.0:9107")]
    listen_address: String,

    /// Path under which to expose metrics
    #[arg(long = "web.telemetry-path", default_value = "/metrics")]
    metrics_path: String,

    /// API token for the IEX Cloud account
    #[arg(long = "iexcloud.api-token", env = "IEXCLOUD_API_TOKEN", hide_env_values = true)]
    api_token: String,

    /// IEX Cloud API endpoint (host or full URL)
    #[arg(long = "iexcloud.endpoint", default_value = "sandbox.iexapis.com")]
    endpoint: String,

    /// IEX Cloud API version
    #[arg(long = "iexcloud.api-version", default_value = "stable")]
    api_version: String,

    /// Path of the metrics configuration file
    #[arg(long = "iexcloud.config", default_value = "config.json")]
    config_path: String,

    /// Upper bound for one scrape, in seconds
    #[arg(long = "scrape.timeout-seconds", default_value_t = 30)]
    scrape_timeout_seconds: u64,

    /// Metric types allowed to dispatch
    #[arg(long, value_delimiter = ',', default_value = "price,dividends,keystats")]
    collectors: Vec<CollectorKind>,
}

// ------------------------------------------------------------
// Application entry point
// ------------------------------------------------------------
//
// Responsibilities:
// - Initialize logging and the rustls crypto backend
// - Read the metrics configuration once
// - Build the upstream client, registry and descriptor table
// - Serve scrapes until the listener fails
//
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // rustls >= 0.23 needs a process-wide provider before the
    // first TLS connection.
    CryptoProvider::install_default(ring::default_provider())
        .map_err(|_| anyhow::anyhow!("failed to install rustls CryptoProvider"))?;

    let args = Args::parse();
    info!(
        "starting iexcloud-exporter version={}",
        env!("CARGO_PKG_VERSION")
    );

    let config = load_metrics_config(&args.config_path)?;
    info!("read the config file {}", args.config_path);

    let scrape_timeout = Duration::from_secs(args.scrape_timeout_seconds);
    let client = IexClient::new(
        &args.endpoint,
        &args.api_version,
        &args.api_token,
        scrape_timeout,
    )
    .context("invalid iexcloud endpoint")?;
    info!("initializing endpoint {}", client.base());

    let registry = CollectorRegistry::new(args.collectors.iter().copied());
    info!(
        "enabled collectors: {}",
        registry
            .enabled()
            .iter()
            .map(|k| k.name())
            .collect::<Vec<_>>()
            .join(",")
    );

    let exporter = Exporter::new(
        Arc::new(client),
        registry,
        Arc::new(MetricDescriptors::new()),
        config,
    )
    .with_scrape_timeout(scrape_timeout);

    let about = format!(
        "Endpoint: {}\nAPI version: {}",
        args.endpoint, args.api_version
    );
    let server = Arc::new(MetricsServer::new(exporter, &args.metrics_path, &about));

    let listener = TcpListener::bind(&args.listen_address)
        .await
        .with_context(|| format!("cannot bind {}", args.listen_address))?;

    server::serve(listener, server)
        .await
        .context("error running HTTP server")?;

    Ok(())
}
