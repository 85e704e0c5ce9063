//! Translation of export parameters into an upstream export query.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::params::ExportParams;

/// Path of the upstream JSON line export API.
pub const EXPORT_API_PATH: &str = "/api/v1/export";

/// Selector used when the caller does not supply `match[]`.
pub const DEFAULT_SELECTOR: &str = "{__name__!=''}";

/// Build the upstream query using the current wall clock.
pub fn build_upstream_query(params: &ExportParams) -> String {
    build_upstream_query_at(params, SystemTime::now())
}

/// Build the upstream query relative to `now`.
///
/// Parameters are emitted in a fixed order: `start`, `end`, `match[]`.
/// Values are not validated or re-encoded; the upstream rejects malformed
/// ones.
pub fn build_upstream_query_at(params: &ExportParams, now: SystemTime) -> String {
    let mut query = format!("{}?", EXPORT_API_PATH);

    let start = match params.last {
        Some(last) => Some(epoch_seconds(now, last)),
        None => params.start.clone(),
    };

    if let Some(start) = start {
        query.push_str(&format!("start={}&", start));
    }

    if let Some(end) = &params.end {
        query.push_str(&format!("end={}&", end));
    }

    let selector = params.selector.as_deref().unwrap_or(DEFAULT_SELECTOR);
    query.push_str(&format!("match[]={}", selector));

    query
}

/// Decimal epoch seconds of `now - last`.
fn epoch_seconds(now: SystemTime, last: f64) -> String {
    let now = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default();
    format!("{}", now - last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn params() -> ExportParams {
        ExportParams {
            target: "http://vm:8428".to_string(),
            ..Default::default()
        }
    }

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn test_defaults() {
        let query = build_upstream_query_at(&params(), at(1_000));
        assert_eq!(query, "/api/v1/export?match[]={__name__!=''}");
    }

    #[test]
    fn test_start_and_end() {
        let params = ExportParams {
            start: Some("100".to_string()),
            end: Some("200".to_string()),
            ..params()
        };
        let query = build_upstream_query_at(&params, at(1_000));
        assert_eq!(
            query,
            "/api/v1/export?start=100&end=200&match[]={__name__!=''}"
        );
    }

    #[test]
    fn test_last_overrides_start() {
        let params = ExportParams {
            start: Some("100".to_string()),
            last: Some(60.0),
            ..params()
        };
        let query = build_upstream_query_at(&params, at(1_000));
        assert_eq!(query, "/api/v1/export?start=940&match[]={__name__!=''}");
    }

    #[test]
    fn test_negative_last_starts_in_future() {
        let params = ExportParams {
            last: Some(-60.0),
            ..params()
        };
        let query = build_upstream_query_at(&params, at(1_000));
        assert_eq!(query, "/api/v1/export?start=1060&match[]={__name__!=''}");
    }

    #[test]
    fn test_fractional_last() {
        let params = ExportParams {
            last: Some(0.5),
            ..params()
        };
        let query = build_upstream_query_at(&params, at(10));
        assert!(query.starts_with("/api/v1/export?start=9.5&"));
    }

    #[test]
    fn test_end_only() {
        let params = ExportParams {
            end: Some("2024-01-01T00:00:00Z".to_string()),
            ..params()
        };
        let query = build_upstream_query_at(&params, at(1_000));
        assert!(!query.contains("start="));
        assert!(query.contains("end=2024-01-01T00:00:00Z&"));
    }

    #[test]
    fn test_selector_forwarded_verbatim() {
        let params = ExportParams {
            selector: Some("{job=\"node\"}".to_string()),
            ..params()
        };
        let query = build_upstream_query_at(&params, at(1_000));
        assert_eq!(query, "/api/v1/export?match[]={job=\"node\"}");
    }

    #[test]
    fn test_last_uses_wall_clock() {
        let params = ExportParams {
            last: Some(3600.0),
            ..params()
        };
        let before = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs_f64();
        let query = build_upstream_query(&params);

        let start: f64 = query
            .trim_start_matches("/api/v1/export?start=")
            .split('&')
            .next()
            .unwrap()
            .parse()
            .unwrap();
        assert!((start - (before - 3600.0)).abs() < 5.0);
    }
}
