//! # Authorization Manager
//!
//! Wraps the host authorization bridge and reports status changes on the
//! event bus.
//!
//! ## Usage
//!
//! ```ignore
//! use core_auth::AuthorizationManager;
//! use core_runtime::events::EventBus;
//!
//! let manager = Arc::new(AuthorizationManager::new(provider, EventBus::default()));
//! manager.configure(&service_config).await?;
//!
//! if !manager.authorize().await? {
//!     // The user was sent to the settings screen.
//! }
//!
//! manager.watch_lifecycle(lifecycle_observer).await?;
//! ```

use crate::error::{AuthError, Result};
use bridge_traits::lifecycle::{LifecycleObserver, LifecycleState};
use bridge_traits::{AuthorizationProvider, AuthorizationStatus, ServiceConfig};
use core_runtime::events::{CoreEvent, EventBus};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Authorization orchestrator.
///
/// `authorizationStatusDidChange` is emitted when the host returns to the
/// foreground and after a prompt that changed the status. `unauthorize` only
/// hands off to the host and emits nothing.
pub struct AuthorizationManager {
    provider: Arc<dyn AuthorizationProvider>,
    event_bus: EventBus,
    lifecycle_task: Mutex<Option<JoinHandle<()>>>,
}

impl AuthorizationManager {
    pub fn new(provider: Arc<dyn AuthorizationProvider>, event_bus: EventBus) -> Self {
        Self {
            provider,
            event_bus,
            lifecycle_task: Mutex::new(None),
        }
    }

    /// Hand the developer credentials to the service SDK.
    #[instrument(skip(self, config), fields(app = %config.app.name))]
    pub async fn configure(&self, config: &ServiceConfig) -> Result<()> {
        if config.developer_token.trim().is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "developer token is empty".to_string(),
            ));
        }

        self.provider.configure(config).await?;
        info!("Service configured");
        Ok(())
    }

    /// Current status without prompting.
    pub async fn status(&self) -> Result<AuthorizationStatus> {
        Ok(self.provider.status().await?)
    }

    pub async fn is_authorized(&self) -> Result<bool> {
        Ok(self.status().await?.is_authorized())
    }

    /// Ask for access.
    ///
    /// Prompts only while the status is undetermined. A refused or restricted
    /// status, already present or returned by the prompt, opens the settings
    /// screen and reports `false`.
    #[instrument(skip(self))]
    pub async fn authorize(&self) -> Result<bool> {
        let current = self.provider.status().await?;

        match current {
            AuthorizationStatus::Authorized => Ok(true),
            AuthorizationStatus::NotDetermined => {
                let status = self.provider.request_authorization().await?;
                info!(%status, "Authorization prompt answered");
                if status != current {
                    self.emit_status(status);
                }
                if !status.is_authorized() {
                    info!(%status, "Prompt refused, opening settings");
                    self.provider.open_settings().await?;
                }
                Ok(status.is_authorized())
            }
            AuthorizationStatus::Denied | AuthorizationStatus::Restricted => {
                info!(status = %current, "Access refused, opening settings");
                self.provider.open_settings().await?;
                Ok(false)
            }
            AuthorizationStatus::Unavailable => {
                warn!("Authorization requested but the service is unavailable");
                Ok(false)
            }
        }
    }

    /// Revoke access through the host.
    #[instrument(skip(self))]
    pub async fn unauthorize(&self) -> Result<()> {
        self.provider.unauthorize().await?;
        Ok(())
    }

    pub async fn has_music_subscription(&self) -> Result<bool> {
        Ok(self.provider.has_subscription().await?)
    }

    /// Read the current status and emit it.
    pub async fn refresh_status(&self) -> Result<AuthorizationStatus> {
        let status = self.provider.status().await?;
        self.emit_status(status);
        Ok(status)
    }

    fn emit_status(&self, status: AuthorizationStatus) {
        let delivered = self
            .event_bus
            .emit(CoreEvent::AuthorizationStatusDidChange { result: status });
        debug!(%status, delivered, "Authorization status emitted");
    }

    /// Refresh the status every time the host returns to the foreground.
    ///
    /// Replaces any previous observation.
    pub async fn watch_lifecycle(self: &Arc<Self>, observer: Arc<dyn LifecycleObserver>) -> Result<()> {
        let mut changes = observer
            .subscribe_changes()
            .await
            .map_err(|e| AuthError::LifecycleUnavailable(e.to_string()))?;

        let manager = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            while let Some(state) = changes.next().await {
                if state != LifecycleState::Foreground {
                    continue;
                }
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                if let Err(err) = manager.refresh_status().await {
                    warn!(error = %err, "Failed to refresh authorization status");
                }
            }
            debug!("Lifecycle observation ended");
        });

        if let Some(previous) = self.lifecycle_task.lock().replace(handle) {
            previous.abort();
        }
        Ok(())
    }

    /// Stop lifecycle observation.
    pub fn stop_watching(&self) {
        if let Some(handle) = self.lifecycle_task.lock().take() {
            handle.abort();
        }
    }
}

impl Drop for AuthorizationManager {
    fn drop(&mut self) {
        self.stop_watching();
    }
}
