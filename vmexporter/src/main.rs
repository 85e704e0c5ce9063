//! VictoriaMetrics to Prometheus exposition format exporter.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};

use vmexporter::{Exporter, ExporterConfig, ExporterMetrics, HttpServer, init_tracing};

/// Exports data from VictoriaMetrics in Prometheus exposition format.
///
/// Query the export path with a `target` parameter holding the
/// VictoriaMetrics address and optional `start`, `end`, `last` and
/// `match[]` parameters.
#[derive(Parser, Debug)]
#[command(name = "vmexporter")]
#[command(version)]
#[command(after_help = "Written by Alexander Pozlevich <apozlevich@gmail.com>.")]
struct Args {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(short = 'H', long, value_name = "ADDR")]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short = 'P', long)]
    port: Option<u16>,

    /// Path to serve exported metrics on (overrides config).
    #[arg(short = 'U', long)]
    path: Option<String>,

    /// Path to serve own metrics on (overrides config).
    #[arg(short = 's', long = "self", value_name = "PATH")]
    self_path: Option<String>,

    /// Upstream request timeout in seconds (overrides config).
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error) (overrides config).
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn apply(self, config: &mut ExporterConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(path) = self.path {
            config.server.export_path = path;
        }
        if let Some(path) = self.self_path {
            config.server.metrics_path = path;
        }
        if let Some(timeout) = self.timeout {
            config.upstream.timeout_secs = timeout;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        ExporterConfig::load_from_file(config_path)?
    } else {
        ExporterConfig::default()
    };
    args.apply(&mut config);
    config.validate()?;

    init_tracing(&config.logging)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting vmexporter");

    let listen_addr = config.server.listen_addr()?;
    let metrics = Arc::new(ExporterMetrics::new());
    let exporter = Arc::new(Exporter::new(&config, metrics)?);

    info!(
        timeout_secs = config.upstream.timeout_secs,
        escape_label_values = config.convert.escape_label_values,
        "Configuration loaded"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let http_server = HttpServer::new(
        exporter,
        listen_addr,
        config.server.export_path.clone(),
        config.server.metrics_path.clone(),
    );
    let mut http_task = tokio::spawn(async move {
        if let Err(e) = http_server.run(shutdown_rx).await {
            error!("HTTP server error: {}", e);
        }
    });

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate() => {
            info!("Received SIGTERM, shutting down...");
        }
        _ = &mut http_task => {
            anyhow::bail!("HTTP server exited unexpectedly");
        }
    }

    shutdown_tx.send(true)?;

    let _ = tokio::time::timeout(Duration::from_secs(5), http_task).await;

    info!("Exporter stopped");
    Ok(())
}

#[cfg(unix)]
async fn terminate() {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            error!("Failed to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
