//! Token providers for the remote catalog/library API.

use async_trait::async_trait;
use bridge_traits::{
    authorization::MusicTokenProvider,
    error::{BridgeError, Result},
};
use parking_lot::RwLock;
use std::fmt;

/// Environment variable holding the developer token.
pub const DEVELOPER_TOKEN_ENV: &str = "APPLE_MUSIC_DEVELOPER_TOKEN";
/// Environment variable holding the music user token.
pub const USER_TOKEN_ENV: &str = "APPLE_MUSIC_USER_TOKEN";

/// Reads tokens from the process environment on every call.
#[derive(Debug, Clone)]
pub struct EnvTokenProvider {
    developer_var: String,
    user_var: String,
}

impl EnvTokenProvider {
    pub fn new() -> Self {
        Self::with_vars(DEVELOPER_TOKEN_ENV, USER_TOKEN_ENV)
    }

    pub fn with_vars(developer_var: impl Into<String>, user_var: impl Into<String>) -> Self {
        Self {
            developer_var: developer_var.into(),
            user_var: user_var.into(),
        }
    }
}

impl Default for EnvTokenProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MusicTokenProvider for EnvTokenProvider {
    async fn developer_token(&self) -> Result<String> {
        match std::env::var(&self.developer_var) {
            Ok(token) if !token.is_empty() => Ok(token),
            _ => Err(BridgeError::NotAvailable(format!(
                "{} is not set",
                self.developer_var
            ))),
        }
    }

    async fn music_user_token(&self) -> Result<Option<String>> {
        Ok(std::env::var(&self.user_var)
            .ok()
            .filter(|token| !token.is_empty()))
    }
}

/// Holds tokens in memory. The developer token can be replaced after
/// `configure` hands over a new one.
pub struct StaticTokenProvider {
    developer_token: RwLock<Option<String>>,
    user_token: RwLock<Option<String>>,
}

impl StaticTokenProvider {
    pub fn new(developer_token: Option<String>, user_token: Option<String>) -> Self {
        Self {
            developer_token: RwLock::new(developer_token),
            user_token: RwLock::new(user_token),
        }
    }

    pub fn set_developer_token(&self, token: impl Into<String>) {
        *self.developer_token.write() = Some(token.into());
    }

    pub fn set_user_token(&self, token: Option<String>) {
        *self.user_token.write() = token;
    }
}

impl fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("developer_token", &"[REDACTED]")
            .field("user_token", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl MusicTokenProvider for StaticTokenProvider {
    async fn developer_token(&self) -> Result<String> {
        self.developer_token
            .read()
            .clone()
            .ok_or_else(|| BridgeError::NotAvailable("Developer token not configured".into()))
    }

    async fn music_user_token(&self) -> Result<Option<String>> {
        Ok(self.user_token.read().clone())
    }
}
