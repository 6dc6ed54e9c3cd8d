//! # Music Bridge Service
//!
//! The call surface handed to host applications. Every operation answers
//! with a response struct; failures are logged and reported as
//! `result: false`, never returned as errors.

use std::sync::Arc;

use bridge_traits::{MusicCatalog, ServiceConfig};
use core_auth::AuthorizationManager;
use core_library::{AlbumBrowser, AlbumQuery};
use core_playback::{PlaybackRequest, ResolvedSource, SongResolver};
use core_runtime::events::Receiver;
use core_runtime::{BridgeConfig, CoreEvent, EventBus, EventKind, ListenerHandle, PlaybackState};
use provider_apple_music::{AppleMusicConnector, ConnectorSettings};
use tracing::{debug, info, instrument, warn};

use crate::error::{CoreError, Result};
use crate::response::{
    AlbumListRequest, AlbumLookup, AlbumResponse, AlbumsResponse, ResultResponse, SeekRequest,
    SetSongResponse, TimeResponse, VolumeRequest,
};

/// Primary façade exposed to host applications.
pub struct MusicBridgeService {
    event_bus: EventBus,
    auth: Arc<AuthorizationManager>,
    resolver: SongResolver,
    albums: AlbumBrowser,
}

impl MusicBridgeService {
    /// Wire the configured bridges into a running service.
    ///
    /// The catalog is the injected one when present, otherwise an
    /// [`AppleMusicConnector`] over the configured HTTP client and tokens.
    pub async fn new(config: BridgeConfig) -> Result<Self> {
        let catalog = build_catalog(&config)?;
        let event_bus = EventBus::new(config.event_buffer_size);

        let auth = Arc::new(AuthorizationManager::new(
            config.authorization_provider.clone(),
            event_bus.clone(),
        ));

        if let Some(observer) = config.lifecycle_observer.clone() {
            auth.watch_lifecycle(observer).await?;
        }

        let resolver = SongResolver::new(
            config.subscription_engine.clone(),
            config.clip_player_factory.clone(),
            catalog.clone(),
            auth.clone(),
            event_bus.clone(),
            config.playback,
        );
        let albums = AlbumBrowser::new(catalog, config.playback.max_page_fetches);

        info!(storefront = %config.storefront, "Music bridge service ready");

        Ok(Self {
            event_bus,
            auth,
            resolver,
            albums,
        })
    }

    // ------------------------------------------------------------------------
    // Authorization
    // ------------------------------------------------------------------------

    pub async fn configure(&self, config: ServiceConfig) -> ResultResponse {
        report("configure", self.auth.configure(&config).await.map_err(CoreError::from)).into()
    }

    pub async fn is_authorized(&self) -> ResultResponse {
        flag("isAuthorized", self.auth.is_authorized().await.map_err(CoreError::from)).into()
    }

    /// Prompt for access; denied users are sent to the settings screen.
    pub async fn authorize(&self) -> ResultResponse {
        flag("authorize", self.auth.authorize().await.map_err(CoreError::from)).into()
    }

    pub async fn unauthorize(&self) -> ResultResponse {
        report("unauthorize", self.auth.unauthorize().await.map_err(CoreError::from)).into()
    }

    pub async fn has_music_subscription(&self) -> ResultResponse {
        flag(
            "hasMusicSubscription",
            self.auth.has_music_subscription().await.map_err(CoreError::from),
        )
        .into()
    }

    // ------------------------------------------------------------------------
    // Playback
    // ------------------------------------------------------------------------

    /// Resolve `request` and load it as the live source.
    #[instrument(skip(self, request), fields(song_id = %request.song_id))]
    pub async fn set_song(&self, request: PlaybackRequest) -> SetSongResponse {
        if request.song_id.trim().is_empty() {
            warn!("setSong called without a song id");
            return SetSongResponse::default();
        }

        match self.resolver.resolve(&request).await {
            Ok(resolution) => {
                debug!(source = %resolution.source, "Song loaded");
                SetSongResponse {
                    result: true,
                    library_song_id: resolution.library_song_id,
                    album_title: resolution.album_title,
                }
            }
            Err(err) => {
                warn!(error = %err, recoverable = err.is_recoverable(), "setSong failed");
                SetSongResponse::default()
            }
        }
    }

    pub async fn play(&self) -> ResultResponse {
        report("play", self.resolver.play().await.map_err(CoreError::from)).into()
    }

    pub async fn pause(&self) -> ResultResponse {
        report("pause", self.resolver.pause().await.map_err(CoreError::from)).into()
    }

    pub async fn stop(&self) -> ResultResponse {
        report("stop", self.resolver.stop().await.map_err(CoreError::from)).into()
    }

    pub async fn current_playback_time(&self) -> TimeResponse {
        TimeResponse {
            result: seconds(
                "currentPlaybackTime",
                self.resolver.current_time().await.map_err(CoreError::from),
            ),
        }
    }

    pub async fn current_playback_duration(&self) -> TimeResponse {
        TimeResponse {
            result: seconds(
                "currentPlaybackDuration",
                self.resolver.duration().await.map_err(CoreError::from),
            ),
        }
    }

    pub async fn seek_to_time(&self, request: SeekRequest) -> ResultResponse {
        report(
            "seekToTime",
            self.resolver
                .seek(request.playback_time)
                .await
                .map_err(CoreError::from),
        )
        .into()
    }

    pub async fn set_volume(&self, request: VolumeRequest) -> ResultResponse {
        report(
            "setVolume",
            self.resolver
                .set_volume(request.volume)
                .await
                .map_err(CoreError::from),
        )
        .into()
    }

    /// Canonical state of the live source, `stopped` when nothing is loaded.
    pub async fn playback_state(&self) -> PlaybackState {
        self.resolver.state().await
    }

    pub async fn current_source(&self) -> Option<ResolvedSource> {
        self.resolver.current_source().await
    }

    // ------------------------------------------------------------------------
    // Library
    // ------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn get_library_album(&self, lookup: AlbumLookup) -> AlbumResponse {
        let query = match album_query(lookup) {
            Ok(query) => query,
            Err(err) => {
                warn!(error = %err, "getLibraryAlbum rejected");
                return AlbumResponse::default();
            }
        };

        match self.albums.get_album(&query).await {
            Ok(album) => AlbumResponse {
                result: true,
                album: Some(album),
            },
            Err(err) => {
                warn!(error = %err, "getLibraryAlbum failed");
                AlbumResponse::default()
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn get_library_albums(&self, request: AlbumListRequest) -> AlbumsResponse {
        match self.albums.list_albums(request.limit, request.offset).await {
            Ok(page) => AlbumsResponse {
                result: true,
                albums: page.albums,
                has_next: page.has_next,
            },
            Err(err) => {
                warn!(error = %err, "getLibraryAlbums failed");
                AlbumsResponse::default()
            }
        }
    }

    // ------------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------------

    pub fn add_listener<F>(&self, kind: EventKind, callback: F) -> ListenerHandle
    where
        F: Fn(&CoreEvent) + Send + Sync + 'static,
    {
        self.event_bus.add_listener(kind, callback)
    }

    /// Register a listener by wire name, e.g. `playbackStateDidChange`.
    pub fn add_listener_by_name<F>(&self, name: &str, callback: F) -> Result<ListenerHandle>
    where
        F: Fn(&CoreEvent) + Send + Sync + 'static,
    {
        let kind =
            EventKind::from_name(name).ok_or_else(|| CoreError::UnknownEvent(name.to_string()))?;
        Ok(self.add_listener(kind, callback))
    }

    pub fn remove_all_listeners(&self) {
        self.event_bus.remove_all_listeners();
    }

    /// Stream of every event emitted from now on.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.event_bus.subscribe()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Release the live source and stop lifecycle observation.
    pub async fn shutdown(&self) {
        self.resolver.reset().await;
        self.auth.stop_watching();
        info!("Music bridge service shut down");
    }
}

fn build_catalog(config: &BridgeConfig) -> Result<Arc<dyn MusicCatalog>> {
    if let Some(catalog) = &config.music_catalog {
        return Ok(catalog.clone());
    }

    let http_client = config.http_client.clone().ok_or_else(|| {
        CoreError::CapabilityMissing {
            capability: "HttpClient".to_string(),
            message: "required to reach the catalog API".to_string(),
        }
    })?;
    let tokens = config.token_provider.clone().ok_or_else(|| {
        CoreError::CapabilityMissing {
            capability: "MusicTokenProvider".to_string(),
            message: "required to authenticate catalog requests".to_string(),
        }
    })?;

    let settings = ConnectorSettings {
        base_url: config.api_base_url.clone(),
        storefront: config.storefront.clone(),
        search_limit: config.library_search_limit,
        request_timeout: config.request_timeout,
    };
    Ok(Arc::new(AppleMusicConnector::new(http_client, tokens, settings)))
}

/// `id` wins over `title`; blank values count as absent.
fn album_query(lookup: AlbumLookup) -> Result<AlbumQuery> {
    let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    match (present(lookup.id), present(lookup.title)) {
        (Some(id), _) => Ok(AlbumQuery::Id(id)),
        (None, Some(title)) => Ok(AlbumQuery::Title(title)),
        (None, None) => Err(CoreError::InvalidRequest(
            "album lookup needs an id or a title".to_string(),
        )),
    }
}

fn report(operation: &str, outcome: Result<()>) -> bool {
    match outcome {
        Ok(()) => true,
        Err(err) => {
            warn!(operation, error = %err, "Operation failed");
            false
        }
    }
}

fn flag(operation: &str, outcome: Result<bool>) -> bool {
    outcome.unwrap_or_else(|err| {
        warn!(operation, error = %err, "Operation failed");
        false
    })
}

fn seconds(operation: &str, outcome: Result<f64>) -> f64 {
    outcome.unwrap_or_else(|err| {
        warn!(operation, error = %err, "Operation failed");
        0.0
    })
}
