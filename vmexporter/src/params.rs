//! Typed view of the export endpoint's query parameters.

use crate::error::{ExportError, Result};

/// Parameters of a single export request.
///
/// Built from the raw, possibly repeated query pairs. The first occurrence
/// of each key wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportParams {
    /// Base URL of the upstream store.
    pub target: String,
    /// Start of the export window, passed through verbatim.
    pub start: Option<String>,
    /// End of the export window, passed through verbatim.
    pub end: Option<String>,
    /// Relative window in seconds; overrides `start` when set.
    pub last: Option<f64>,
    /// Series selector, passed through verbatim.
    pub selector: Option<String>,
}

impl ExportParams {
    /// Parse parameters from decoded query pairs.
    pub fn from_pairs<K, V>(pairs: &[(K, V)]) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let first = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k.as_ref() == key)
                .map(|(_, v)| v.as_ref())
        };
        let non_empty = |key: &str| first(key).filter(|v| !v.is_empty()).map(str::to_string);

        let target = first("target")
            .map(str::to_string)
            .ok_or(ExportError::MissingTarget)?;

        let last = match first("last") {
            Some(raw) => Some(parse_last(raw)?),
            None => None,
        };

        Ok(Self {
            target,
            start: non_empty("start"),
            end: non_empty("end"),
            last,
            selector: first("match[]").map(str::to_string),
        })
    }
}

fn parse_last(raw: &str) -> Result<f64> {
    match raw.trim().parse::<f64>() {
        Ok(secs) if secs.is_finite() => Ok(secs),
        _ => Err(ExportError::InvalidLast(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_missing_target() {
        let result = ExportParams::from_pairs(&pairs(&[("start", "1")]));
        assert!(matches!(result, Err(ExportError::MissingTarget)));
    }

    #[test]
    fn test_empty_target_is_present() {
        let params = ExportParams::from_pairs(&pairs(&[("target", "")])).unwrap();
        assert_eq!(params.target, "");
    }

    #[test]
    fn test_full_params() {
        let params = ExportParams::from_pairs(&pairs(&[
            ("target", "http://vm:8428"),
            ("start", "2024-01-01T00:00:00Z"),
            ("end", "1700000000"),
            ("last", "3600"),
            ("match[]", "up"),
        ]))
        .unwrap();

        assert_eq!(params.target, "http://vm:8428");
        assert_eq!(params.start.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(params.end.as_deref(), Some("1700000000"));
        assert_eq!(params.last, Some(3600.0));
        assert_eq!(params.selector.as_deref(), Some("up"));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let params = ExportParams::from_pairs(&pairs(&[
            ("target", "http://a"),
            ("match[]", "first"),
            ("match[]", "second"),
            ("target", "http://b"),
        ]))
        .unwrap();

        assert_eq!(params.target, "http://a");
        assert_eq!(params.selector.as_deref(), Some("first"));
    }

    #[test]
    fn test_empty_window_bounds_are_absent() {
        let params =
            ExportParams::from_pairs(&pairs(&[("target", "http://a"), ("start", ""), ("end", "")]))
                .unwrap();

        assert_eq!(params.start, None);
        assert_eq!(params.end, None);
    }

    #[test]
    fn test_empty_selector_is_kept() {
        let params =
            ExportParams::from_pairs(&pairs(&[("target", "http://a"), ("match[]", "")])).unwrap();
        assert_eq!(params.selector.as_deref(), Some(""));
    }

    #[test]
    fn test_invalid_last() {
        for raw in ["", "abc", "inf", "NaN"] {
            let result = ExportParams::from_pairs(&pairs(&[("target", "http://a"), ("last", raw)]));
            assert!(
                matches!(result, Err(ExportError::InvalidLast(_))),
                "last={:?} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_negative_last() {
        let params =
            ExportParams::from_pairs(&pairs(&[("target", "http://a"), ("last", "-60")])).unwrap();
        assert_eq!(params.last, Some(-60.0));
    }

    #[test]
    fn test_fractional_last() {
        let params =
            ExportParams::from_pairs(&pairs(&[("target", "http://a"), ("last", "1.5")])).unwrap();
        assert_eq!(params.last, Some(1.5));
    }
}
