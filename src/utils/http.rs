// src/utils/http.rs

//! HTTP transport for the catalog and resource downloads.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::ServerConfig;

/// JSON-over-HTTP transport consumed by the walker and the fetch pool.
///
/// The production implementation is [`HttpTransport`]; tests substitute an
/// in-memory catalog.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` and parse the body as JSON.
    ///
    /// Any non-success status is surfaced as [`AppError::Transport`]
    /// carrying the URL and status code.
    async fn get_json(&self, url: &str) -> Result<Value>;
}

/// reqwest-backed transport with the configured auth headers.
pub struct HttpTransport {
    client: reqwest::Client,
    headers: HeaderMap,
}

impl HttpTransport {
    /// Create a configured transport.
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let headers = parse_headers(&config.headers)?;
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, headers })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, url: &str) -> Result<Value> {
        log::debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::transport(url, status.as_u16()));
        }
        Ok(response.json().await?)
    }
}

/// Parse raw `Name: value` header strings into a header map.
pub fn parse_headers(raw: &[String]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(raw.len());
    for line in raw {
        let (name, value) = line.split_once(':').ok_or_else(|| {
            AppError::config(format!("header '{line}' is not in 'Name: value' form"))
        })?;
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|e| AppError::config(format!("invalid header name in '{line}': {e}")))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|e| AppError::config(format!("invalid header value in '{line}': {e}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_headers_valid() {
        let raw = vec![
            "Authorization: Bearer abc123".to_string(),
            "X-Custom:value".to_string(),
        ];
        let headers = parse_headers(&raw).unwrap();
        assert_eq!(headers["authorization"], "Bearer abc123");
        assert_eq!(headers["x-custom"], "value");
    }

    #[test]
    fn test_parse_headers_rejects_missing_colon() {
        let raw = vec!["NotAHeader".to_string()];
        let err = parse_headers(&raw).unwrap_err();
        assert!(err.to_string().contains("Name: value"));
    }

    #[test]
    fn test_parse_headers_empty() {
        assert!(parse_headers(&[]).unwrap().is_empty());
    }
}
