//! `reqwest`-backed transport for the catalog/library API.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpRequest, HttpResponse},
};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("music-bridge/", env!("CARGO_PKG_VERSION"));

/// Pooled HTTPS client (rustls). Performs a single attempt per request.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| BridgeError::NotAvailable(format!("HTTP client unavailable: {}", e)))?;

        Ok(Self { client })
    }

    /// Wrap a preconfigured client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn send_error(e: reqwest::Error) -> BridgeError {
    let kind = if e.is_timeout() {
        "timed out"
    } else if e.is_connect() {
        "connection failed"
    } else {
        "failed"
    };
    BridgeError::OperationFailed(format!("request {}: {}", kind, e))
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(url = %request.url, "GET");

        let mut builder = self.client.get(&request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, url = %request.url, "HTTP request failed");
            send_error(e)
        })?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect();
        let body = response.bytes().await.map_err(send_error)?;

        debug!(status, bytes = body.len(), "HTTP response received");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builds_with_default_timeout() {
        assert!(ReqwestHttpClient::new().is_ok());
    }

    #[tokio::test]
    async fn connection_failure_is_an_error_not_a_response() {
        let client = ReqwestHttpClient::with_timeout(Duration::from_millis(500)).unwrap();
        // Port 9 on localhost is the discard service and is closed on test hosts.
        let result = client
            .execute(HttpRequest::get("http://127.0.0.1:9/v1/catalog/us/songs/1"))
            .await;
        assert!(matches!(result, Err(BridgeError::OperationFailed(_))));
    }
}
