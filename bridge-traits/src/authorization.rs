//! Authorization and credential contracts.
//!
//! The OS permission prompt, the settings hand-off and the service SDK's token
//! handling all live in the host. The core reads the authorization status,
//! asks the host to prompt, and pulls tokens when it talks to the remote API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Authorization status as reported by the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthorizationStatus {
    /// The service is not available on this device or runtime.
    Unavailable,
    NotDetermined,
    Denied,
    Restricted,
    Authorized,
}

impl AuthorizationStatus {
    pub fn is_authorized(&self) -> bool {
        matches!(self, AuthorizationStatus::Authorized)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorizationStatus::Unavailable => "unavailable",
            AuthorizationStatus::NotDetermined => "notDetermined",
            AuthorizationStatus::Denied => "denied",
            AuthorizationStatus::Restricted => "restricted",
            AuthorizationStatus::Authorized => "authorized",
        }
    }
}

impl fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application identity passed along with the developer token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfo {
    pub name: String,
    pub build: String,
}

/// Payload of the `configure` call.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    pub developer_token: String,
    #[serde(default)]
    pub app: AppInfo,
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("developer_token", &"[REDACTED]")
            .field("app", &self.app)
            .finish()
    }
}

/// Host-side authorization collaborator.
#[async_trait]
pub trait AuthorizationProvider: Send + Sync {
    /// Initialize the service SDK with the developer credentials.
    async fn configure(&self, config: &ServiceConfig) -> Result<()>;

    /// Current authorization status without prompting.
    async fn status(&self) -> Result<AuthorizationStatus>;

    /// Prompt the user for access and return the resulting status.
    async fn request_authorization(&self) -> Result<AuthorizationStatus>;

    /// Revoke access, or hand the user off to where they can revoke it.
    async fn unauthorize(&self) -> Result<()>;

    /// Open the platform settings screen for this application.
    async fn open_settings(&self) -> Result<()>;

    /// Whether the user holds an active streaming subscription.
    async fn has_subscription(&self) -> Result<bool>;
}

/// Supplies credentials for the remote catalog/library API.
#[async_trait]
pub trait MusicTokenProvider: Send + Sync {
    async fn developer_token(&self) -> Result<String>;

    /// Per-user token required by `/v1/me/*` endpoints, when signed in.
    async fn music_user_token(&self) -> Result<Option<String>>;
}
