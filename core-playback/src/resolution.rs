//! # Song Resolution
//!
//! Picks exactly one playable source for a song and owns it until the next
//! request.
//!
//! ## Tiers
//!
//! 1. Tear down the live source.
//! 2. Unauthorized or `forcePreview`: preview clip, or fail.
//! 3. Cached library id: library track, no network.
//! 4. Catalog lookup. On failure continue at 6 when a title hint exists.
//! 5. Streamable catalog track.
//! 6. Library search for the purchased copy (bounded pagination).
//! 7. Preview clip from the catalog or the request.
//! 8. Fail.
//!
//! Requests are serialized: the live-source slot stays locked for the whole
//! resolution, so a transport call issued meanwhile waits for it.

use crate::adapter::PlaybackSourceAdapter;
use crate::clip::FallbackClipAdapter;
use crate::error::{PlaybackError, Result};
use crate::full_service::FullServiceAdapter;
use crate::request::{PlaybackRequest, Resolution, ResolvedSource};
use bridge_traits::{CatalogSong, ClipPlayerFactory, MusicCatalog, QueueItem, SubscriptionEngine};
use core_auth::AuthorizationManager;
use core_library::{derive_search_term, LibraryResolver};
use core_runtime::config::PlaybackTuning;
use core_runtime::events::{EventBus, PlaybackState};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, instrument, warn};

type Slot = Option<Box<dyn PlaybackSourceAdapter>>;

pub struct SongResolver {
    engine: Arc<dyn SubscriptionEngine>,
    clips: Arc<dyn ClipPlayerFactory>,
    catalog: Arc<dyn MusicCatalog>,
    auth: Arc<AuthorizationManager>,
    library: LibraryResolver,
    event_bus: EventBus,
    tuning: PlaybackTuning,
    volume: Mutex<f32>,
    active: AsyncMutex<Slot>,
}

impl SongResolver {
    pub fn new(
        engine: Arc<dyn SubscriptionEngine>,
        clips: Arc<dyn ClipPlayerFactory>,
        catalog: Arc<dyn MusicCatalog>,
        auth: Arc<AuthorizationManager>,
        event_bus: EventBus,
        tuning: PlaybackTuning,
    ) -> Self {
        Self {
            library: LibraryResolver::new(catalog.clone(), tuning.max_page_fetches),
            engine,
            clips,
            catalog,
            auth,
            event_bus,
            volume: Mutex::new(tuning.default_volume),
            tuning,
            active: AsyncMutex::new(None),
        }
    }

    /// Resolve `request` and make the result the live source.
    #[instrument(skip(self, request), fields(song_id = %request.song_id))]
    pub async fn resolve(&self, request: &PlaybackRequest) -> Result<Resolution> {
        let mut slot = self.active.lock().await;
        Self::release(&mut slot).await;

        let authorized = match self.auth.is_authorized().await {
            Ok(authorized) => authorized,
            Err(err) => {
                warn!(error = %err, "Authorization status unavailable");
                false
            }
        };

        if !authorized || request.force_preview {
            debug!(authorized, force_preview = request.force_preview, "Preview only");
            return match request.preview_url() {
                Some(url) => self.commit_clip(&mut slot, url).await,
                None if !authorized => Err(PlaybackError::AuthorizationDenied),
                None => Err(PlaybackError::NoPlayableSource {
                    song_id: request.song_id.clone(),
                }),
            };
        }

        if let Some(library_id) = request.library_song_id() {
            let source = ResolvedSource::LibraryTrack {
                id: library_id.to_string(),
                album_title: request.album_title().map(str::to_string),
            };
            return self
                .commit_engine(&mut slot, source, request.song_title())
                .await;
        }

        let song = match self.catalog.catalog_song(&request.song_id).await {
            Ok(song) => Some(song),
            Err(err) => {
                let err = PlaybackError::CatalogLookupFailed {
                    song_id: request.song_id.clone(),
                    reason: err.to_string(),
                };
                if request.song_title().is_none() {
                    return Err(err);
                }
                warn!(error = %err, "Catalog lookup failed, searching library");
                None
            }
        };

        if let Some(song) = song.as_ref().filter(|song| song.is_playable()) {
            let source = ResolvedSource::CatalogTrack {
                id: request.song_id.clone(),
            };
            match self.commit_engine(&mut slot, source, None).await {
                Ok(resolution) => return Ok(resolution),
                Err(err) => warn!(error = %err, title = %song.title, "Catalog track could not be queued"),
            }
        }

        if let Some(resolution) = self.try_library(&mut slot, request, song.as_ref()).await {
            return Ok(resolution);
        }

        let preview = song
            .as_ref()
            .and_then(|song| song.preview_url.as_deref())
            .filter(|url| !url.is_empty())
            .or_else(|| request.preview_url());

        match preview {
            Some(url) => self.commit_clip(&mut slot, url).await,
            None => Err(PlaybackError::NoPlayableSource {
                song_id: request.song_id.clone(),
            }),
        }
    }

    async fn try_library(
        &self,
        slot: &mut Slot,
        request: &PlaybackRequest,
        song: Option<&CatalogSong>,
    ) -> Option<Resolution> {
        let title = request
            .song_title()
            .or_else(|| song.map(|song| song.title.as_str()))?;
        let term = derive_search_term(title);

        let found = match self.library.find_purchased_track(&term, &request.song_id).await {
            Ok(found) => found,
            Err(err) => {
                let err = PlaybackError::from(err);
                if err.is_recoverable() {
                    debug!(error = %err, "No purchased copy");
                } else {
                    warn!(error = %err, "Library search failed");
                }
                return None;
            }
        };

        let source = ResolvedSource::LibraryTrack {
            id: found.id,
            album_title: found.album_title,
        };
        match self.commit_engine(slot, source, Some(found.title.as_str())).await {
            Ok(resolution) => Some(resolution),
            Err(err) => {
                // Purchases can take a while to reach the device library.
                warn!(error = %err, "Purchased track not yet playable");
                None
            }
        }
    }

    async fn commit_engine(
        &self,
        slot: &mut Slot,
        source: ResolvedSource,
        title: Option<&str>,
    ) -> Result<Resolution> {
        let item = match &source {
            ResolvedSource::CatalogTrack { id } => QueueItem::Catalog { id: id.clone() },
            ResolvedSource::LibraryTrack { id, album_title } => QueueItem::Library {
                id: id.clone(),
                title: title.map(str::to_string),
                album_title: album_title.clone(),
            },
            ResolvedSource::PreviewClip { url } => return self.commit_clip(slot, url).await,
        };

        let adapter = FullServiceAdapter::attach(
            self.engine.clone(),
            source.clone(),
            item,
            self.volume(),
            self.event_bus.clone(),
            self.tuning.completion_threshold,
        )
        .await?;

        info!(%source, "Source committed");
        *slot = Some(Box::new(adapter));
        Ok(Resolution::from(source))
    }

    async fn commit_clip(&self, slot: &mut Slot, url: &str) -> Result<Resolution> {
        let adapter = FallbackClipAdapter::attach(
            self.clips.as_ref(),
            url,
            self.volume(),
            self.event_bus.clone(),
            &self.tuning,
        )
        .await?;

        let source = adapter.source().clone();
        info!(%source, "Source committed");
        *slot = Some(Box::new(adapter));
        Ok(Resolution::from(source))
    }

    async fn release(slot: &mut Slot) {
        if let Some(previous) = slot.take() {
            debug!(source = %previous.source(), "Releasing source");
            if let Err(err) = previous.teardown().await {
                warn!(error = %err, "Teardown failed");
            }
        }
    }

    /// Tear down the live source, if any.
    pub async fn reset(&self) {
        let mut slot = self.active.lock().await;
        Self::release(&mut slot).await;
    }

    // ------------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------------

    pub async fn play(&self) -> Result<()> {
        let slot = self.active.lock().await;
        live(&slot)?.play().await
    }

    pub async fn pause(&self) -> Result<()> {
        let slot = self.active.lock().await;
        live(&slot)?.pause().await
    }

    pub async fn stop(&self) -> Result<()> {
        let slot = self.active.lock().await;
        live(&slot)?.stop().await
    }

    pub async fn seek(&self, position: f64) -> Result<()> {
        if !position.is_finite() || position < 0.0 {
            return Err(PlaybackError::TransientPlaybackError(format!(
                "invalid seek position {}",
                position
            )));
        }
        let slot = self.active.lock().await;
        live(&slot)?.seek(position).await
    }

    /// Position of the live source, `0` when nothing is loaded.
    pub async fn current_time(&self) -> Result<f64> {
        match self.active.lock().await.as_ref() {
            Some(adapter) => adapter.current_time().await,
            None => Ok(0.0),
        }
    }

    /// Duration of the live source, `0` when nothing is loaded.
    pub async fn duration(&self) -> Result<f64> {
        match self.active.lock().await.as_ref() {
            Some(adapter) => adapter.duration().await,
            None => Ok(0.0),
        }
    }

    /// Store the target volume and apply it to the live source.
    pub async fn set_volume(&self, volume: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(PlaybackError::InvalidVolume(volume));
        }
        *self.volume.lock() = volume;

        match self.active.lock().await.as_ref() {
            Some(adapter) => adapter.set_volume(volume).await,
            None => Ok(()),
        }
    }

    pub fn volume(&self) -> f32 {
        *self.volume.lock()
    }

    pub async fn state(&self) -> PlaybackState {
        self.active
            .lock()
            .await
            .as_ref()
            .map_or(PlaybackState::Stopped, |adapter| adapter.state())
    }

    pub async fn current_source(&self) -> Option<ResolvedSource> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|adapter| adapter.source().clone())
    }
}

fn live(slot: &Slot) -> Result<&dyn PlaybackSourceAdapter> {
    slot.as_deref().ok_or(PlaybackError::NoSourceLoaded)
}
