//! Export orchestration: validate, translate, fetch, convert.

use std::sync::Arc;
use std::time::Instant;

use axum::http::HeaderMap;
use tracing::{info, warn};

use crate::config::ExporterConfig;
use crate::convert::{Converter, Rendered};
use crate::error::Result;
use crate::metrics::SharedMetrics;
use crate::params::ExportParams;
use crate::query::build_upstream_query;
use crate::upstream::UpstreamClient;

/// Serves export requests against caller-chosen upstreams.
pub struct Exporter {
    client: UpstreamClient,
    converter: Converter,
    metrics: SharedMetrics,
}

impl Exporter {
    /// Create an exporter reporting into `metrics`.
    pub fn new(config: &ExporterConfig, metrics: SharedMetrics) -> Result<Self> {
        Ok(Self {
            client: UpstreamClient::new(&config.upstream)?,
            converter: Converter::new(&config.convert),
            metrics,
        })
    }

    /// The metrics this exporter reports into.
    pub fn metrics(&self) -> &SharedMetrics {
        &self.metrics
    }

    /// Run one export for the given query pairs.
    ///
    /// Request errors leave the metrics untouched. Fetch and conversion
    /// errors count as a failure for the target.
    pub async fn export(&self, pairs: &[(String, String)], headers: &HeaderMap) -> Result<Rendered> {
        let started = Instant::now();
        let params = ExportParams::from_pairs(pairs)?;
        let query = build_upstream_query(&params);

        let result = self.fetch_and_convert(&params.target, &query, headers).await;

        match &result {
            Ok(rendered) => {
                let elapsed = started.elapsed();
                self.metrics
                    .record_success(&params.target, elapsed, rendered.records);
                info!(
                    upstream = %params.target,
                    records = rendered.records,
                    samples = rendered.samples,
                    duration_ms = elapsed.as_millis() as u64,
                    "Export completed"
                );
            }
            Err(e) => {
                self.metrics.record_failure(&params.target);
                warn!(upstream = %params.target, query = %query, error = %e, "Export failed");
            }
        }

        result
    }

    async fn fetch_and_convert(&self, target: &str, query: &str, headers: &HeaderMap) -> Result<Rendered> {
        let body = self.client.fetch_export(target, query, headers).await?;
        self.converter.render(&body)
    }
}

/// Create a shareable exporter handle.
pub type SharedExporter = Arc<Exporter>;
