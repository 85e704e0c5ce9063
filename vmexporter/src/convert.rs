//! Conversion of JSON line export records into exposition format.
//!
//! Each line of the upstream body holds one series:
//!
//! ```text
//! {"metric":{"__name__":"up","job":"x"},"values":[1,null],"timestamps":[100,200]}
//! ```
//!
//! which renders as one line per sample:
//!
//! ```text
//! up{job="x"} 1 100
//! up{job="x"} 0 200
//! ```

use std::fmt::Write;

use serde::Deserialize;
use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::config::ConvertConfig;
use crate::error::{ExportError, Result};

/// Reserved label holding the metric name.
pub const NAME_LABEL: &str = "__name__";

/// One series as produced by the upstream export API.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportRecord {
    /// Label set, including `__name__`, in upstream order.
    pub metric: Map<String, Value>,
    /// Sample values; `null` marks a missing value.
    pub values: Vec<Option<Number>>,
    /// Sample timestamps in milliseconds.
    pub timestamps: Vec<i64>,
}

/// Result of converting a whole upstream body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    /// Exposition text, one newline-terminated line per sample.
    pub body: String,
    /// Number of input records converted.
    pub records: u64,
    /// Number of sample lines emitted.
    pub samples: u64,
}

/// Converts export bodies into exposition text.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    escape_label_values: bool,
}

impl Converter {
    /// Create a converter from configuration.
    pub fn new(config: &ConvertConfig) -> Self {
        Self {
            escape_label_values: config.escape_label_values,
        }
    }

    /// Convert a full upstream body.
    ///
    /// Trailing blank content is ignored. Any other line that is not a
    /// valid record, blank lines included, fails the whole conversion.
    pub fn render(&self, body: &[u8]) -> Result<Rendered> {
        let mut rendered = Rendered::default();

        let body = body.trim_ascii_end();
        if body.is_empty() {
            return Ok(rendered);
        }

        for (idx, line) in body.split(|b| *b == b'\n').enumerate() {
            let line_no = idx + 1;
            let record: ExportRecord = serde_json::from_slice(line)
                .map_err(|source| ExportError::Record { line: line_no, source })?;

            rendered.samples += self.render_record(record, line_no, &mut rendered.body)?;
            rendered.records += 1;
        }

        Ok(rendered)
    }

    /// Append one record's samples to `out`, returning the sample count.
    fn render_record(&self, mut record: ExportRecord, line: usize, out: &mut String) -> Result<u64> {
        let name = match record.metric.shift_remove(NAME_LABEL) {
            Some(Value::String(name)) => name,
            Some(other) => other.to_string(),
            None => return Err(ExportError::MissingName { line }),
        };

        if record.values.len() != record.timestamps.len() {
            debug!(
                line,
                metric = %name,
                values = record.values.len(),
                timestamps = record.timestamps.len(),
                "Value and timestamp counts differ, truncating"
            );
        }

        let labels = self.format_labels(&record.metric);
        let mut samples = 0;

        for (value, timestamp) in record.values.iter().zip(&record.timestamps) {
            // null renders as 0
            let value = value.as_ref().map_or_else(|| "0".to_string(), Number::to_string);
            writeln!(out, "{}{} {} {}", name, labels, value, timestamp).ok();
            samples += 1;
        }

        Ok(samples)
    }

    /// Format a label set as `{k="v",...}`.
    fn format_labels(&self, labels: &Map<String, Value>) -> String {
        let parts: Vec<String> = labels
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                if self.escape_label_values {
                    format!("{}=\"{}\"", k, escape_label_value(&value))
                } else {
                    format!("{}=\"{}\"", k, value)
                }
            })
            .collect();

        format!("{{{}}}", parts.join(","))
    }
}

/// Escape special characters in label values.
fn escape_label_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            _ => result.push(c),
        }
    }
    result
}
