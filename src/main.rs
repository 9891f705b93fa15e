// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use clap::Parser;
use kube::Client;
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use svcdns::{
    config::SourceConfig,
    constants::DEFAULT_PASS_INTERVAL_SECS,
    context::Stores,
    metrics,
    source::{HostnameResolver, NoopResolver, ServiceSource, SystemResolver},
};
use tokio::sync::Notify;
use tracing::{debug, error, info};

/// Command-line flags. Flags override values from `--config`.
#[derive(Debug, Parser)]
#[command(
    name = "svcdns",
    version,
    about = "Derive DNS records from Kubernetes Services"
)]
#[allow(clippy::struct_excessive_bools)]
struct Args {
    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Namespace to watch; all namespaces when unset
    #[arg(long)]
    namespace: Option<String>,

    /// Label-selector expression matched against Service annotations
    #[arg(long)]
    annotation_filter: Option<String>,

    /// Template for hostnames of Services without hostname annotations
    #[arg(long)]
    fqdn_template: Option<String>,

    /// Use template hostnames in addition to annotation hostnames
    #[arg(long)]
    combine_fqdn_annotation: bool,

    /// Legacy annotation format: mate, molecule or kops-dns-controller
    #[arg(long)]
    compatibility: Option<String>,

    /// Publish cluster IPs of ClusterIP Services
    #[arg(long)]
    publish_internal: bool,

    /// Publish Pod host IPs for headless Services
    #[arg(long)]
    publish_host_ip: bool,

    /// Publish not-ready addresses of headless Services
    #[arg(long)]
    always_publish_not_ready_addresses: bool,

    /// Service types to consider, comma separated
    #[arg(long, value_delimiter = ',')]
    service_type_filter: Vec<String>,

    /// Ignore hostname annotations
    #[arg(long)]
    ignore_hostname_annotation: bool,

    /// Label selector restricting the Services considered
    #[arg(long)]
    label_selector: Option<String>,

    /// Resolve load balancer hostnames to addresses
    #[arg(long)]
    resolve_load_balancer_hostname: bool,

    /// Seconds between passes when nothing changes
    #[arg(long, default_value_t = DEFAULT_PASS_INTERVAL_SECS)]
    interval: u64,

    /// Address for the Prometheus `/metrics` endpoint
    #[arg(long)]
    metrics_addr: Option<SocketAddr>,

    /// Run a single pass and exit
    #[arg(long)]
    once: bool,
}

impl Args {
    /// The file configuration with flags applied on top.
    fn source_config(&self) -> Result<SourceConfig> {
        let mut config = match &self.config {
            Some(path) => SourceConfig::from_yaml_file(path)?,
            None => SourceConfig::default(),
        };

        let overrides = [
            (&self.namespace, &mut config.namespace),
            (&self.annotation_filter, &mut config.annotation_filter),
            (&self.fqdn_template, &mut config.fqdn_template),
            (&self.compatibility, &mut config.compatibility),
            (&self.label_selector, &mut config.label_selector),
        ];
        for (flag, field) in overrides {
            if let Some(value) = flag {
                field.clone_from(value);
            }
        }
        if !self.service_type_filter.is_empty() {
            config.service_type_filter.clone_from(&self.service_type_filter);
        }

        config.combine_fqdn_annotation |= self.combine_fqdn_annotation;
        config.publish_internal |= self.publish_internal;
        config.publish_host_ip |= self.publish_host_ip;
        config.always_publish_not_ready_addresses |= self.always_publish_not_ready_addresses;
        config.ignore_hostname_annotation |= self.ignore_hostname_annotation;
        config.resolve_load_balancer_hostname |= self.resolve_load_balancer_hostname;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("svcdns")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<()> {
    // Format: timestamp file:line LEVEL message
    // RUST_LOG sets the filter (default info), RUST_LOG_FORMAT=json switches to JSON
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_writer(std::io::stderr)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    info!("Starting svcdns");

    let config = args.source_config()?;
    debug!(?config, "Configuration loaded");

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;

    let stores = Stores::start(client, &config.namespace).await?;

    let source = Arc::new(tokio::task::spawn_blocking(move || build_source(config, stores)).await??);

    let changed = Arc::new(Notify::new());
    {
        let changed = changed.clone();
        source.add_event_handler(Arc::new(move || changed.notify_one()));
    }

    if let Some(addr) = args.metrics_addr {
        tokio::spawn(async move {
            if let Err(e) = serve_metrics(addr).await {
                error!(error = %e, "Metrics server exited");
            }
        });
    }

    let result = run_passes(&source, &changed, &args).await;

    // The system resolver owns its own runtime, which cannot be dropped on an
    // async worker thread.
    tokio::task::spawn_blocking(move || drop(source)).await?;
    result
}

/// Build the source with the resolver the configuration asks for.
fn build_source(config: SourceConfig, stores: Stores) -> Result<ServiceSource<Stores>> {
    let resolver: Arc<dyn HostnameResolver> = if config.resolve_load_balancer_hostname {
        Arc::new(SystemResolver::from_system_conf()?)
    } else {
        Arc::new(NoopResolver)
    };
    Ok(ServiceSource::new(config, stores, resolver)?)
}

/// Run a pass on start, on every Service change and on every interval tick
/// until interrupted (or once, with `--once`).
async fn run_passes(
    source: &Arc<ServiceSource<Stores>>,
    changed: &Notify,
    args: &Args,
) -> Result<()> {
    let mut ticker = tokio::time::interval(Duration::from_secs(args.interval.max(1)));

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            () = changed.notified() => {
                debug!("Service change observed");
                ticker.reset();
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received interrupt, shutting down");
                return Ok(());
            }
        }

        match run_pass(source.clone()).await {
            Ok(()) if args.once => return Ok(()),
            Ok(()) => {}
            Err(e) if args.once => return Err(e),
            Err(e) => error!(error = %e, "Pass failed; retrying on next trigger"),
        }
    }
}

/// Compute endpoints on a blocking thread and print them as JSON lines.
async fn run_pass(source: Arc<ServiceSource<Stores>>) -> Result<()> {
    let endpoints = tokio::task::spawn_blocking(move || source.endpoints()).await??;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for endpoint in &endpoints {
        serde_json::to_writer(&mut out, endpoint)?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

async fn serve_metrics(addr: SocketAddr) -> Result<()> {
    let app = Router::new().route("/metrics", get(metrics_handler));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Serving metrics");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn metrics_handler() -> impl IntoResponse {
    match metrics::gather_metrics() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
