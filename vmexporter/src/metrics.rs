//! The exporter's own operational metrics.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Duration;

use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::info::Info;
use prometheus_client::registry::Registry;

/// Program name, used as the metric namespace.
pub const PROGRAM: &str = "vmexporter";

/// Release status reported by the info metric.
pub const STATUS: &str = "Release";

/// Labels identifying an upstream.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct TargetLabels {
    pub target: String,
}

impl TargetLabels {
    fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
        }
    }
}

/// Per-target values, as read back from the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TargetSnapshot {
    pub duration_secs: f64,
    pub exports: u64,
    pub failures: u64,
    pub records: u64,
}

/// Registry of export counters keyed by target.
pub struct ExporterMetrics {
    registry: Registry,
    duration: Family<TargetLabels, Gauge<f64, AtomicU64>>,
    exports: Family<TargetLabels, Counter>,
    failures: Family<TargetLabels, Counter>,
    records: Family<TargetLabels, Counter>,
}

impl ExporterMetrics {
    /// Create the registry with every instrument registered.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let version = env!("CARGO_PKG_VERSION");
        let mut parts = version.split('.');
        let mut info_labels = vec![
            ("version".to_string(), version.to_string()),
            ("status".to_string(), STATUS.to_string()),
        ];
        for key in ["major", "minor", "patchlevel"] {
            info_labels.push((key.to_string(), parts.next().unwrap_or("0").to_string()));
        }
        registry.register(
            PROGRAM,
            format!("{} version information", PROGRAM),
            Info::new(info_labels),
        );

        let duration = Family::<TargetLabels, Gauge<f64, AtomicU64>>::default();
        registry.register(
            format!("{}_export_duration", PROGRAM),
            "Last export duration",
            duration.clone(),
        );

        let exports = Family::<TargetLabels, Counter>::default();
        registry.register(
            format!("{}_export_count", PROGRAM),
            "Exports done total",
            exports.clone(),
        );

        let failures = Family::<TargetLabels, Counter>::default();
        registry.register(
            format!("{}_export_failures", PROGRAM),
            "Exports failed total",
            failures.clone(),
        );

        let records = Family::<TargetLabels, Counter>::default();
        registry.register(
            format!("{}_export_metrics", PROGRAM),
            "Exported metrics total",
            records.clone(),
        );

        Self {
            registry,
            duration,
            exports,
            failures,
            records,
        }
    }

    /// Record a completed export.
    pub fn record_success(&self, target: &str, duration: Duration, records: u64) {
        let labels = TargetLabels::new(target);
        self.duration
            .get_or_create(&labels)
            .set(duration.as_secs_f64());
        self.exports.get_or_create(&labels).inc();
        self.records.get_or_create(&labels).inc_by(records);
    }

    /// Record a failed export.
    pub fn record_failure(&self, target: &str) {
        self.failures.get_or_create(&TargetLabels::new(target)).inc();
    }

    /// Read the current values for `target`.
    ///
    /// Series that were never recorded read as zero and are not created.
    pub fn snapshot(&self, target: &str) -> TargetSnapshot {
        let labels = TargetLabels::new(target);
        TargetSnapshot {
            duration_secs: self.duration.get(&labels).map(|g| g.get()).unwrap_or_default(),
            exports: self.exports.get(&labels).map(|c| c.get()).unwrap_or_default(),
            failures: self.failures.get(&labels).map(|c| c.get()).unwrap_or_default(),
            records: self.records.get(&labels).map(|c| c.get()).unwrap_or_default(),
        }
    }

    /// Render all metrics in OpenMetrics text format.
    pub fn render(&self) -> String {
        let mut output = String::new();
        // Writing into a String cannot fail.
        let _ = encode(&mut output, &self.registry);
        output
    }
}

impl Default for ExporterMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a shareable metrics handle.
pub type SharedMetrics = Arc<ExporterMetrics>;
