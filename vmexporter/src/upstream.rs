//! HTTP client for the upstream export API.

use axum::http::HeaderMap;
use axum::http::header::{self, HeaderName};
use bytes::Bytes;
use tracing::debug;

use crate::config::UpstreamConfig;
use crate::error::Result;

/// Headers that describe the incoming connection rather than the request.
static SKIPPED_HEADERS: [HeaderName; 10] = [
    header::HOST,
    header::CONNECTION,
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::TE,
    header::TRAILER,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    // Bodies are read undecoded.
    header::ACCEPT_ENCODING,
];

/// Client used for every export fetch.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
}

impl UpstreamClient {
    /// Build a pooled client with explicit timeouts.
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;
        Ok(Self { http })
    }

    /// Fetch the raw export body for `query` from `target`.
    ///
    /// `query` is appended to `target` as is. The upstream status code is
    /// not inspected; whatever body comes back is returned.
    pub async fn fetch_export(&self, target: &str, query: &str, headers: &HeaderMap) -> Result<Bytes> {
        let url = format!("{}{}", target.trim_end_matches('/'), query);
        debug!(url = %url, "Fetching upstream export");

        let response = self
            .http
            .get(&url)
            .headers(forwarded_headers(headers))
            .send()
            .await?;

        debug!(url = %url, status = %response.status(), "Upstream responded");
        Ok(response.bytes().await?)
    }
}

/// Copy the caller's headers, minus connection-bound ones.
fn forwarded_headers(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = headers.clone();
    for name in &SKIPPED_HEADERS {
        forwarded.remove(name);
    }
    forwarded.remove("keep-alive");
    forwarded
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_forwarded_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("proxy:8080"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t"));
        headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1"));

        let forwarded = forwarded_headers(&headers);

        assert!(forwarded.get(header::HOST).is_none());
        assert!(forwarded.get(header::ACCEPT_ENCODING).is_none());
        assert!(forwarded.get("keep-alive").is_none());
        assert_eq!(forwarded.get(header::AUTHORIZATION).unwrap(), "Bearer t");
        assert_eq!(forwarded.get("x-forwarded-for").unwrap(), "10.0.0.1");
    }

    #[test]
    fn test_client_builds() {
        assert!(UpstreamClient::new(&UpstreamConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = UpstreamClient::new(&UpstreamConfig::default()).unwrap();
        let result = client
            .fetch_export(&format!("http://{}", addr), "/api/v1/export?match[]=up", &HeaderMap::new())
            .await;

        assert!(matches!(result, Err(crate::error::ExportError::Upstream(_))));
    }
}
