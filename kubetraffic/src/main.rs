mod config;
mod ebpf;
mod event;
mod filter;
mod identity;
mod metrics;
mod pipeline;
mod source;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::ebpf::loader::EbpfLoader;
use crate::filter::{ExclusionFilter, HealthCheckFilter};
use crate::identity::IdentityResolver;
use crate::metrics::{MetricSink, Metrics};
use crate::pipeline::{ConnectHandler, HttpHandler, Pipeline};

#[derive(Parser)]
#[command(
    name = "kubetraffic",
    about = "eBPF-powered in-cluster traffic metrics agent"
)]
struct Cli {
    /// Path to the config file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Extra comma-separated process name prefixes to ignore for L4 events
    #[arg(long)]
    exclude_comms: Option<String>,

    /// Extra comma-separated HTTP path prefixes treated as health checks
    #[arg(long)]
    health_check_patterns: Option<String>,

    /// Count health check requests instead of dropping them
    #[arg(long)]
    no_health_check_filter: bool,

    /// Port for the Prometheus endpoint
    #[arg(long)]
    metrics_port: Option<u16>,

    /// Compiled BPF object to load
    #[arg(long)]
    bpf_object: Option<PathBuf>,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(exclude) = self.exclude_comms {
            config.filters.exclude_comms = exclude;
        }
        if let Some(patterns) = self.health_check_patterns {
            config.filters.health_check_patterns = patterns;
        }
        if self.no_health_check_filter {
            config.filters.health_check_enabled = false;
        }
        if let Some(port) = self.metrics_port {
            config.metrics.port = port;
        }
        if let Some(path) = self.bpf_object {
            config.ebpf.object_path = path;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    // Filters are built once and shared read-only with their pipeline.
    let exclusion = Arc::new(ExclusionFilter::new(&config.filters.exclude_comms));
    let health = Arc::new(HealthCheckFilter::new(
        config.filters.health_check_enabled,
        &config.filters.health_check_patterns,
    ));

    let metrics = Arc::new(Metrics::new().context("registering metrics")?);
    let table = config.workload_table();
    info!("identity table seeded with {} workloads", table.len());
    let resolver: Arc<dyn IdentityResolver> = Arc::new(table);
    let outcomes: Arc<dyn MetricSink> = Arc::new(metrics.pipeline_events.clone());

    let mut loader = EbpfLoader::load(&config.ebpf).context("loading eBPF programs")?;
    let l4_source = loader.ring_buffer(&config.ebpf.connect_map)?;
    let l7_source = loader.ring_buffer(&config.ebpf.http_map)?;
    let closers = [l4_source.closer(), l7_source.closer()];
    info!(
        "reading events from ring buffers {} and {}",
        l4_source.name(),
        l7_source.name()
    );

    let l4 = Pipeline::new(
        l4_source,
        ConnectHandler::new(
            exclusion,
            resolver.clone(),
            Arc::new(metrics.l4_connections.clone()),
        ),
        outcomes.clone(),
    );
    let l7 = Pipeline::new(
        l7_source,
        HttpHandler::new(health, resolver, Arc::new(metrics.l7_requests.clone())),
        outcomes,
    );

    let l4_cancel = CancellationToken::new();
    let l7_cancel = CancellationToken::new();
    let tasks = [
        ("L4", l4.spawn(l4_cancel.clone())),
        ("L7", l7.spawn(l7_cancel.clone())),
    ];

    let server_shutdown = CancellationToken::new();
    let server = tokio::spawn({
        let config = config.metrics.clone();
        let metrics = metrics.clone();
        let shutdown = server_shutdown.clone();
        async move {
            if let Err(e) = crate::metrics::server::serve(config, metrics, shutdown).await {
                error!("metrics server exited: {e:#}");
            }
        }
    });

    info!("Waiting for Ctrl-C...");
    signal::ctrl_c().await.context("listening for Ctrl-C")?;
    info!("Exiting...");

    // Cancel first so each loop stops at its next iteration; closing the
    // sources wakes any loop parked in a read.
    l4_cancel.cancel();
    l7_cancel.cancel();
    for closer in &closers {
        closer.cancel();
    }

    for (name, task) in tasks {
        match task.await {
            Ok(state) => info!("[{name}] pipeline finished: {state:?}"),
            Err(e) => warn!("[{name}] pipeline task failed: {e}"),
        }
    }

    server_shutdown.cancel();
    if let Err(e) = server.await {
        warn!("metrics server task failed: {e}");
    }

    drop(loader);
    Ok(())
}
