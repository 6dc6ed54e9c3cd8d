//! # Bridge Configuration Module
//!
//! Provides configuration management for the music bridge core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `BridgeConfig`
//! instance that holds the host bridges and the tuning knobs of the core. It
//! enforces fail-fast validation so that a missing capability is reported at
//! startup rather than on the first `setSong`.
//!
//! ## Required Dependencies
//!
//! - `SubscriptionEngine` - Managed-queue streaming engine
//! - `ClipPlayerFactory` - Direct-URL audio element for preview clips
//! - `AuthorizationProvider` - Permission prompt and subscription check
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `MusicCatalog` - Catalog/library API. When absent, the service builds the
//!   Apple Music connector from `HttpClient` + `MusicTokenProvider`.
//! - `HttpClient` - HTTP operations (desktop default: reqwest)
//! - `MusicTokenProvider` - API tokens (desktop default: environment variables)
//! - `LifecycleObserver` - Foreground notifications for authorization refresh
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{BridgeConfig, PlaybackTuning};
//! use std::time::Duration;
//!
//! let config = BridgeConfig::builder()
//!     .subscription_engine(engine)
//!     .clip_player_factory(clips)
//!     .authorization_provider(auth)
//!     .storefront("gb")
//!     .playback_tuning(PlaybackTuning {
//!         completion_threshold: Duration::from_secs(2),
//!         ..PlaybackTuning::default()
//!     })
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! The builder validates all required dependencies and returns
//! [`Error::CapabilityMissing`] with an actionable message when one is absent.

use crate::error::{Error, Result};
use bridge_traits::{
    AuthorizationProvider, ClipPlayerFactory, HttpClient, LifecycleObserver, MusicCatalog,
    MusicTokenProvider, SubscriptionEngine,
};
use std::sync::Arc;
use std::time::Duration;

/// Default Apple Music API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.music.apple.com";

/// Default storefront for catalog lookups.
pub const DEFAULT_STOREFRONT: &str = "us";

/// The library search endpoint caps `limit` at 25.
pub const MAX_LIBRARY_SEARCH_LIMIT: u32 = 25;

/// Timing and volume knobs of the playback pipeline.
///
/// The completion threshold and clip end tolerance approximate a missing
/// "track finished" signal and are empirically tuned, hence configurable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackTuning {
    /// Length of the preview fade-in and fade-out ramps.
    pub fade_duration: Duration,

    /// Number of volume steps per ramp.
    pub fade_steps: u32,

    /// A pause this close to the end of a full-service track reports `completed`.
    pub completion_threshold: Duration,

    /// A stopped clip within this distance of its duration reports `completed`.
    pub clip_end_tolerance: Duration,

    /// Target volume until the host calls `setVolume`.
    pub default_volume: f32,

    /// Hard cap on page fetches for any single paginated search.
    pub max_page_fetches: u32,
}

impl Default for PlaybackTuning {
    fn default() -> Self {
        Self {
            fade_duration: Duration::from_millis(2000),
            fade_steps: 20,
            completion_threshold: Duration::from_secs(3),
            clip_end_tolerance: Duration::ZERO,
            default_volume: 1.0,
            max_page_fetches: 10,
        }
    }
}

impl PlaybackTuning {
    /// Validates the tuning values.
    pub fn validate(&self) -> Result<()> {
        if self.fade_steps == 0 {
            return Err(Error::Config(
                "Fade steps must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.default_volume) {
            return Err(Error::Config(format!(
                "Default volume must be within 0.0..=1.0, got {}",
                self.default_volume
            )));
        }

        if self.max_page_fetches == 0 {
            return Err(Error::Config(
                "Max page fetches must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration for the music bridge core.
///
/// Use [`BridgeConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct BridgeConfig {
    /// Subscription streaming engine (required)
    pub subscription_engine: Arc<dyn SubscriptionEngine>,

    /// Preview clip element factory (required)
    pub clip_player_factory: Arc<dyn ClipPlayerFactory>,

    /// Authorization collaborator (required)
    pub authorization_provider: Arc<dyn AuthorizationProvider>,

    /// Catalog/library API override (optional)
    pub music_catalog: Option<Arc<dyn MusicCatalog>>,

    /// HTTP client for the catalog connector (optional with desktop default)
    pub http_client: Option<Arc<dyn HttpClient>>,

    /// Token source for the catalog connector (optional with desktop default)
    pub token_provider: Option<Arc<dyn MusicTokenProvider>>,

    /// App lifecycle observer (optional)
    pub lifecycle_observer: Option<Arc<dyn LifecycleObserver>>,

    /// Catalog/library API base URL
    pub api_base_url: String,

    /// Storefront used for catalog lookups
    pub storefront: String,

    /// Page size of library searches
    pub library_search_limit: u32,

    /// Per-request timeout for catalog/library calls
    pub request_timeout: Duration,

    /// Event bus channel capacity
    pub event_buffer_size: usize,

    pub playback: PlaybackTuning,
}

impl std::fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("subscription_engine", &"SubscriptionEngine { ... }")
            .field("clip_player_factory", &"ClipPlayerFactory { ... }")
            .field("authorization_provider", &"AuthorizationProvider { ... }")
            .field(
                "music_catalog",
                &self.music_catalog.as_ref().map(|_| "MusicCatalog { ... }"),
            )
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field(
                "token_provider",
                &self
                    .token_provider
                    .as_ref()
                    .map(|_| "MusicTokenProvider { ... }"),
            )
            .field(
                "lifecycle_observer",
                &self
                    .lifecycle_observer
                    .as_ref()
                    .map(|_| "LifecycleObserver { ... }"),
            )
            .field("api_base_url", &self.api_base_url)
            .field("storefront", &self.storefront)
            .field("library_search_limit", &self.library_search_limit)
            .field("request_timeout", &self.request_timeout)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("playback", &self.playback)
            .finish()
    }
}

impl BridgeConfig {
    /// Creates a new builder for constructing a `BridgeConfig`.
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - API base URL and storefront are not empty
    /// - Search limit is within the endpoint's bounds
    /// - Timeout and event buffer are non-zero
    /// - A catalog can be reached, either injected or through HTTP + tokens
    /// - Playback tuning is consistent
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(Error::Config("API base URL cannot be empty".to_string()));
        }

        if self.storefront.trim().is_empty() {
            return Err(Error::Config("Storefront cannot be empty".to_string()));
        }

        if self.library_search_limit == 0 || self.library_search_limit > MAX_LIBRARY_SEARCH_LIMIT
        {
            return Err(Error::Config(format!(
                "Library search limit must be within 1..={}",
                MAX_LIBRARY_SEARCH_LIMIT
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.music_catalog.is_none() {
            if self.http_client.is_none() {
                return Err(http_client_missing_error());
            }
            if self.token_provider.is_none() {
                return Err(token_provider_missing_error());
            }
        }

        self.playback.validate()
    }
}

fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "No MusicCatalog was injected, so an HttpClient is required to reach the catalog API. \
                 Desktop: ensure the 'desktop-shims' feature is enabled. \
                 Mobile/Web: inject a platform-native adapter or a MusicCatalog."
            .to_string(),
    }
}

fn token_provider_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "MusicTokenProvider".to_string(),
        message: "No MusicCatalog was injected, so a MusicTokenProvider is required for API credentials. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to read tokens from the environment. \
                 Mobile/Web: inject the SDK's token source."
            .to_string(),
    }
}

fn required_bridge_error(capability: &str, purpose: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: format!(
            "{} implementation is required for {}. The host must inject it; there is no desktop default.",
            capability, purpose
        ),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(timeout: Duration) -> Result<Option<Arc<dyn HttpClient>>> {
    use bridge_desktop::ReqwestHttpClient;

    let client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::with_timeout(timeout)?);
    Ok(Some(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_timeout: Duration) -> Result<Option<Arc<dyn HttpClient>>> {
    Ok(None)
}

#[cfg(feature = "desktop-shims")]
fn provide_default_token_provider() -> Option<Arc<dyn MusicTokenProvider>> {
    use bridge_desktop::EnvTokenProvider;

    let provider: Arc<dyn MusicTokenProvider> = Arc::new(EnvTokenProvider::new());
    Some(provider)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_token_provider() -> Option<Arc<dyn MusicTokenProvider>> {
    None
}

/// Builder for constructing [`BridgeConfig`] instances.
#[derive(Default)]
pub struct BridgeConfigBuilder {
    subscription_engine: Option<Arc<dyn SubscriptionEngine>>,
    clip_player_factory: Option<Arc<dyn ClipPlayerFactory>>,
    authorization_provider: Option<Arc<dyn AuthorizationProvider>>,
    music_catalog: Option<Arc<dyn MusicCatalog>>,
    http_client: Option<Arc<dyn HttpClient>>,
    token_provider: Option<Arc<dyn MusicTokenProvider>>,
    lifecycle_observer: Option<Arc<dyn LifecycleObserver>>,
    api_base_url: Option<String>,
    storefront: Option<String>,
    library_search_limit: Option<u32>,
    request_timeout: Option<Duration>,
    event_buffer_size: Option<usize>,
    playback: Option<PlaybackTuning>,
}

impl BridgeConfigBuilder {
    /// Sets the subscription streaming engine (required).
    pub fn subscription_engine(mut self, engine: Arc<dyn SubscriptionEngine>) -> Self {
        self.subscription_engine = Some(engine);
        self
    }

    /// Sets the preview clip element factory (required).
    pub fn clip_player_factory(mut self, factory: Arc<dyn ClipPlayerFactory>) -> Self {
        self.clip_player_factory = Some(factory);
        self
    }

    /// Sets the authorization collaborator (required).
    pub fn authorization_provider(mut self, provider: Arc<dyn AuthorizationProvider>) -> Self {
        self.authorization_provider = Some(provider);
        self
    }

    /// Injects a catalog/library API implementation.
    ///
    /// When set, `http_client` and `token_provider` are not needed.
    pub fn music_catalog(mut self, catalog: Arc<dyn MusicCatalog>) -> Self {
        self.music_catalog = Some(catalog);
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the desktop default (reqwest-based) will be used when
    /// the `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the API token source.
    ///
    /// If not provided, environment variables are read when the
    /// `desktop-shims` feature is enabled.
    pub fn token_provider(mut self, provider: Arc<dyn MusicTokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    /// Sets the lifecycle observer implementation (optional).
    ///
    /// Foreground transitions trigger an `authorizationStatusDidChange` event.
    pub fn lifecycle_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.lifecycle_observer = Some(observer);
        self
    }

    /// Sets the API base URL.
    ///
    /// Default: `https://api.music.apple.com`
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// Sets the catalog storefront.
    ///
    /// Default: `us`
    pub fn storefront(mut self, storefront: impl Into<String>) -> Self {
        self.storefront = Some(storefront.into());
        self
    }

    /// Sets the library search page size.
    ///
    /// Default: 25
    pub fn library_search_limit(mut self, limit: u32) -> Self {
        self.library_search_limit = Some(limit);
        self
    }

    /// Sets the per-request timeout.
    ///
    /// Default: 30 seconds
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the event bus channel capacity.
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Overrides the playback tuning.
    pub fn playback_tuning(mut self, tuning: PlaybackTuning) -> Self {
        self.playback = Some(tuning);
        self
    }

    /// Builds the final [`BridgeConfig`] after validating the inputs.
    pub fn build(self) -> Result<BridgeConfig> {
        let subscription_engine = self.subscription_engine.ok_or_else(|| {
            required_bridge_error("SubscriptionEngine", "full-service playback")
        })?;

        let clip_player_factory = self
            .clip_player_factory
            .ok_or_else(|| required_bridge_error("ClipPlayerFactory", "preview playback"))?;

        let authorization_provider = self.authorization_provider.ok_or_else(|| {
            required_bridge_error("AuthorizationProvider", "authorization checks")
        })?;

        let request_timeout = self.request_timeout.unwrap_or(Duration::from_secs(30));

        // Defaults are only needed when the catalog is built in-house.
        let (http_client, token_provider) = if self.music_catalog.is_some() {
            (self.http_client, self.token_provider)
        } else {
            let http_client = match self.http_client {
                Some(client) => Some(client),
                None => provide_default_http_client(request_timeout)?,
            };
            let token_provider = self.token_provider.or_else(provide_default_token_provider);
            (http_client, token_provider)
        };

        let config = BridgeConfig {
            subscription_engine,
            clip_player_factory,
            authorization_provider,
            music_catalog: self.music_catalog,
            http_client,
            token_provider,
            lifecycle_observer: self.lifecycle_observer,
            api_base_url: self
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            storefront: self
                .storefront
                .unwrap_or_else(|| DEFAULT_STOREFRONT.to_string()),
            library_search_limit: self
                .library_search_limit
                .unwrap_or(MAX_LIBRARY_SEARCH_LIMIT),
            request_timeout,
            event_buffer_size: self
                .event_buffer_size
                .unwrap_or(crate::events::DEFAULT_EVENT_BUFFER_SIZE),
            playback: self.playback.unwrap_or_default(),
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::catalog::{
        CatalogSong, LibraryAlbumSummary, LibraryAlbumTrack, LibrarySong, Page,
    };
    use bridge_traits::engine::{ClipPlayer, EnginePlaybackState, QueueItem};
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{AuthorizationStatus, ServiceConfig};
    use mockall::mock;
    use tokio::sync::broadcast;

    mock! {
        Engine {}

        #[async_trait]
        impl SubscriptionEngine for Engine {
            async fn set_queue(&self, item: QueueItem) -> BridgeResult<()>;
            async fn clear_queue(&self) -> BridgeResult<()>;
            async fn play(&self) -> BridgeResult<()>;
            async fn pause(&self) -> BridgeResult<()>;
            async fn stop(&self) -> BridgeResult<()>;
            async fn seek(&self, position: f64) -> BridgeResult<()>;
            async fn playback_time(&self) -> BridgeResult<f64>;
            async fn playback_duration(&self) -> BridgeResult<f64>;
            async fn set_volume(&self, volume: f32) -> BridgeResult<()>;
            fn state_changes(&self) -> broadcast::Receiver<EnginePlaybackState>;
        }
    }

    mock! {
        Clips {}

        #[async_trait]
        impl ClipPlayerFactory for Clips {
            async fn load(&self, url: &str, initial_volume: f32) -> BridgeResult<Arc<dyn ClipPlayer>>;
        }
    }

    mock! {
        Auth {}

        #[async_trait]
        impl AuthorizationProvider for Auth {
            async fn configure(&self, config: &ServiceConfig) -> BridgeResult<()>;
            async fn status(&self) -> BridgeResult<AuthorizationStatus>;
            async fn request_authorization(&self) -> BridgeResult<AuthorizationStatus>;
            async fn unauthorize(&self) -> BridgeResult<()>;
            async fn open_settings(&self) -> BridgeResult<()>;
            async fn has_subscription(&self) -> BridgeResult<bool>;
        }
    }

    struct EmptyCatalog;

    #[async_trait]
    impl MusicCatalog for EmptyCatalog {
        async fn catalog_song(&self, song_id: &str) -> BridgeResult<CatalogSong> {
            Err(bridge_traits::BridgeError::NotFound(song_id.to_string()))
        }

        async fn search_library_songs(
            &self,
            _term: &str,
            _cursor: Option<&str>,
        ) -> BridgeResult<Page<LibrarySong>> {
            Ok(Page::last(Vec::new()))
        }

        async fn library_albums(
            &self,
            _limit: u32,
            _offset: u32,
        ) -> BridgeResult<Page<LibraryAlbumSummary>> {
            Ok(Page::last(Vec::new()))
        }

        async fn search_library_albums(
            &self,
            _term: &str,
            _cursor: Option<&str>,
        ) -> BridgeResult<Page<LibraryAlbumSummary>> {
            Ok(Page::last(Vec::new()))
        }

        async fn library_album(&self, album_id: &str) -> BridgeResult<LibraryAlbumSummary> {
            Err(bridge_traits::BridgeError::NotFound(album_id.to_string()))
        }

        async fn library_album_tracks(
            &self,
            _album_id: &str,
            _cursor: Option<&str>,
        ) -> BridgeResult<Page<LibraryAlbumTrack>> {
            Ok(Page::last(Vec::new()))
        }
    }

    fn base_builder() -> BridgeConfigBuilder {
        BridgeConfig::builder()
            .subscription_engine(Arc::new(MockEngine::new()))
            .clip_player_factory(Arc::new(MockClips::new()))
            .authorization_provider(Arc::new(MockAuth::new()))
            .music_catalog(Arc::new(EmptyCatalog))
    }

    #[test]
    fn test_builder_with_all_required_fields() {
        let config = base_builder().build().unwrap();

        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.storefront, "us");
        assert_eq!(config.library_search_limit, 25);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.playback, PlaybackTuning::default());
    }

    #[test]
    fn test_default_tuning_values() {
        let tuning = PlaybackTuning::default();

        assert_eq!(tuning.fade_duration, Duration::from_millis(2000));
        assert_eq!(tuning.completion_threshold, Duration::from_secs(3));
        assert_eq!(tuning.max_page_fetches, 10);
        assert_eq!(tuning.default_volume, 1.0);
    }

    #[test]
    fn test_builder_requires_subscription_engine() {
        let result = BridgeConfig::builder()
            .clip_player_factory(Arc::new(MockClips::new()))
            .authorization_provider(Arc::new(MockAuth::new()))
            .music_catalog(Arc::new(EmptyCatalog))
            .build();

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("SubscriptionEngine"));
    }

    #[test]
    fn test_builder_requires_authorization_provider() {
        let result = BridgeConfig::builder()
            .subscription_engine(Arc::new(MockEngine::new()))
            .clip_player_factory(Arc::new(MockClips::new()))
            .music_catalog(Arc::new(EmptyCatalog))
            .build();

        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { ref capability, .. }) if capability == "AuthorizationProvider"
        ));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_http_client_without_catalog() {
        let result = BridgeConfig::builder()
            .subscription_engine(Arc::new(MockEngine::new()))
            .clip_player_factory(Arc::new(MockClips::new()))
            .authorization_provider(Arc::new(MockAuth::new()))
            .build();

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("HttpClient"));
    }

    #[test]
    fn test_validate_rejects_search_limit_above_endpoint_cap() {
        let result = base_builder().library_search_limit(50).build();
        assert!(result.unwrap_err().to_string().contains("1..=25"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_volume() {
        let result = base_builder()
            .playback_tuning(PlaybackTuning {
                default_volume: 1.5,
                ..PlaybackTuning::default()
            })
            .build();

        assert!(result.unwrap_err().to_string().contains("Default volume"));
    }

    #[test]
    fn test_validate_rejects_zero_page_cap() {
        let result = base_builder()
            .playback_tuning(PlaybackTuning {
                max_page_fetches: 0,
                ..PlaybackTuning::default()
            })
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_debug_hides_bridges() {
        let config = base_builder().storefront("gb").build().unwrap();
        let debug = format!("{:?}", config);

        assert!(debug.contains("SubscriptionEngine { ... }"));
        assert!(debug.contains("\"gb\""));
    }
}
