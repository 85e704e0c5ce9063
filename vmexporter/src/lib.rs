//! Export VictoriaMetrics data in Prometheus exposition format.
//!
//! The exporter is an HTTP proxy: a request to the export endpoint names an
//! upstream with the `target` parameter, the exporter queries the upstream's
//! JSON line export API and answers with one exposition line per sample.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  /export?target=..  ┌──────────────┐  /api/v1/export  ┌──────────────┐
//! │   Scraper    │────────────────────>│  vmexporter  │─────────────────>│   Upstream   │
//! │              │<────────────────────│  (convert)   │<─────────────────│ (JSON lines) │
//! └──────────────┘   exposition text   └──────────────┘                  └──────────────┘
//! ```
//!
//! # Query parameters
//!
//! - `target`: upstream base URL (required)
//! - `start`, `end`: export window, forwarded verbatim
//! - `last`: export the last N seconds, overrides `start`
//! - `match[]`: series selector, defaults to `{__name__!=''}`
//!
//! # Configuration
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod http;
pub mod metrics;
pub mod params;
pub mod query;
pub mod upstream;

pub use config::ExporterConfig;
pub use convert::{Converter, Rendered};
pub use error::{ExportError, Result};
pub use export::{Exporter, SharedExporter};
pub use http::HttpServer;
pub use metrics::{ExporterMetrics, SharedMetrics};
pub use params::ExportParams;
pub use query::build_upstream_query;

/// Initialize tracing with the given configuration.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &config::LoggingConfig) -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let result = match config.format {
        config::LogFormat::Text => tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .try_init(),
        config::LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))
}
