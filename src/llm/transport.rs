//! HTTP transport seam for the LLM pipeline.
//!
//! The pipeline only needs "POST this JSON, give me status + body". Keeping
//! that behind a trait lets tests count calls per endpoint without a server.

use crate::error::{Result, SparkError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Raw HTTP outcome of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmTransport: Send + Sync {
    /// POST `payload` as JSON to `url`
    async fn post_json(&self, url: &str, payload: &Value) -> Result<TransportResponse>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    http: Client,
    api_key: Option<String>,
}

impl HttpTransport {
    pub fn new(timeout: Duration, api_key: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SparkError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }
}

#[async_trait]
impl LlmTransport for HttpTransport {
    async fn post_json(&self, url: &str, payload: &Value) -> Result<TransportResponse> {
        let mut request = self
            .http
            .post(url)
            .header("Content-Type", "application/json")
            .json(payload);

        if let Some(ref key) = self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(url, status, bytes = body.len(), "LLM endpoint responded");
        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        assert!(TransportResponse::ok("{}").is_success());
        assert!(TransportResponse::new(204, "").is_success());
        assert!(!TransportResponse::new(404, "").is_success());
        assert!(!TransportResponse::new(503, "").is_success());
    }

    #[test]
    fn test_empty_api_key_is_ignored() {
        let transport = HttpTransport::new(Duration::from_secs(1), Some(String::new())).unwrap();
        assert!(transport.api_key.is_none());
    }
}
