//! HTTP transport contract
//!
//! The catalog/library API is read-only, so the bridge only carries GET
//! requests. Hosts back [`HttpClient`] with whatever stack their platform
//! provides (reqwest on desktop, `URLSession` or `fetch` elsewhere).

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{BridgeError, Result};

/// A GET request against the remote API.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: HashMap<String, String>,
    /// Overrides the client's default timeout
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
            timeout: None,
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn bearer_token(self, token: impl Into<String>) -> Self {
        self.header("Authorization", format!("Bearer {}", token.into()))
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| BridgeError::OperationFailed(format!("Malformed JSON body: {}", e)))
    }

    /// Body as text, lossy on invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Async HTTP transport.
///
/// One call is one attempt. Neither the core nor the client retries; a
/// non-2xx status is returned as a response, not an error.
///
/// ```ignore
/// let response = client
///     .execute(HttpRequest::get("https://api.music.apple.com/v1/catalog/us/songs/1").bearer_token(token))
///     .await?;
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fails only when no response was received (connection, TLS, timeout).
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}
