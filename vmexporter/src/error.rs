//! Error types for the export path.

use thiserror::Error;

/// Result type alias using [`ExportError`].
pub type Result<T> = std::result::Result<T, ExportError>;

/// Errors that can occur while serving an export request.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The request did not name an upstream to export from.
    #[error("Missing 'target' query field")]
    MissingTarget,

    /// The `last` window is not a usable number of seconds.
    #[error("Invalid 'last' query field: {0:?}")]
    InvalidLast(String),

    /// The upstream could not be reached or its body could not be read.
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// A line of the upstream body is not a valid export record.
    #[error("Malformed record on line {line}: {source}")]
    Record {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A record has no `__name__` label.
    #[error("Record on line {line} has no __name__ label")]
    MissingName { line: usize },
}

impl ExportError {
    /// Whether this error was caused by the incoming request itself.
    ///
    /// Client errors are rejected before any upstream call and are not
    /// counted as export failures.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::MissingTarget | Self::InvalidLast(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(ExportError::MissingTarget.is_client_error());
        assert!(ExportError::InvalidLast("abc".to_string()).is_client_error());
        assert!(!ExportError::MissingName { line: 1 }.is_client_error());
    }

    #[test]
    fn test_record_error_message() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ExportError::Record { line: 3, source };
        assert!(err.to_string().starts_with("Malformed record on line 3"));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_missing_target_message() {
        assert_eq!(
            ExportError::MissingTarget.to_string(),
            "Missing 'target' query field"
        );
    }
}
