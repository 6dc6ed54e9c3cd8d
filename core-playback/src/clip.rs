//! # Fallback-Clip Adapter
//!
//! Plays a direct preview URL on a generic streaming audio element. The clip
//! is loaded silent and faded in by the [`FadeScheduler`].

use crate::adapter::PlaybackSourceAdapter;
use crate::error::Result;
use crate::fade::FadeScheduler;
use crate::normalizer::{ClipEventNormalizer, StateCell};
use crate::request::ResolvedSource;
use async_trait::async_trait;
use bridge_traits::{ClipEvent, ClipPlayer, ClipPlayerFactory};
use core_runtime::config::PlaybackTuning;
use core_runtime::events::{EventBus, PlaybackState};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

pub struct FallbackClipAdapter {
    player: Arc<dyn ClipPlayer>,
    fade: Arc<FadeScheduler>,
    source: ResolvedSource,
    state: StateCell,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl FallbackClipAdapter {
    /// Load `url` silent and start forwarding the element's events.
    #[instrument(skip(factory, event_bus, tuning))]
    pub async fn attach(
        factory: &dyn ClipPlayerFactory,
        url: &str,
        volume: f32,
        event_bus: EventBus,
        tuning: &PlaybackTuning,
    ) -> Result<Self> {
        let player = factory.load(url, 0.0).await?;
        let receiver = player.events();

        let fade = Arc::new(FadeScheduler::new(
            player.clone(),
            tuning.fade_duration,
            tuning.fade_steps,
            volume,
        ));
        let state = StateCell::new();
        let normalizer = ClipEventNormalizer::new(event_bus, state.clone(), tuning.clip_end_tolerance);
        let listener = tokio::spawn(forward_clip_events(receiver, normalizer, fade.clone()));

        debug!("Preview clip loaded");
        Ok(Self {
            player,
            fade,
            source: ResolvedSource::PreviewClip {
                url: url.to_string(),
            },
            state,
            listener: Mutex::new(Some(listener)),
        })
    }

    /// Whether a fade-out timer is pending.
    pub fn is_fade_out_armed(&self) -> bool {
        self.fade.is_fade_out_armed()
    }

    fn detach(&self) {
        self.state.detach();
        if let Some(listener) = self.listener.lock().take() {
            listener.abort();
        }
        self.fade.cancel();
    }
}

async fn forward_clip_events(
    mut receiver: broadcast::Receiver<ClipEvent>,
    mut normalizer: ClipEventNormalizer,
    fade: Arc<FadeScheduler>,
) {
    loop {
        let event = match receiver.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Clip events dropped");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        match normalizer.observe(event) {
            Some(PlaybackState::Playing) => {
                if let Err(err) = fade.on_play().await {
                    warn!(error = %err, "Fade-in failed");
                }
            }
            Some(state) => {
                debug!(%state, "Clip state normalized");
                fade.cancel_fade_out();
            }
            None => {}
        }
    }
}

#[async_trait]
impl PlaybackSourceAdapter for FallbackClipAdapter {
    fn source(&self) -> &ResolvedSource {
        &self.source
    }

    fn state(&self) -> PlaybackState {
        self.state.get()
    }

    async fn play(&self) -> Result<()> {
        Ok(self.player.play().await?)
    }

    async fn pause(&self) -> Result<()> {
        self.fade.cancel_fade_out();
        Ok(self.player.pause().await?)
    }

    async fn stop(&self) -> Result<()> {
        self.fade.cancel_fade_out();
        Ok(self.player.stop().await?)
    }

    async fn seek(&self, position: f64) -> Result<()> {
        self.fade.cancel_fade_out();
        self.player.seek(position).await?;
        self.fade
            .on_seek(self.state.get() == PlaybackState::Playing)
            .await
    }

    async fn current_time(&self) -> Result<f64> {
        Ok(self.player.position().await?)
    }

    async fn duration(&self) -> Result<f64> {
        Ok(self.player.duration().await?)
    }

    async fn set_volume(&self, volume: f32) -> Result<()> {
        self.fade.set_target(volume);
        if self.state.get() == PlaybackState::Playing && self.player.volume().await? > 0.0 {
            self.player.set_volume(volume).await?;
        }
        Ok(())
    }

    async fn teardown(&self) -> Result<()> {
        self.detach();
        self.player.stop().await?;
        Ok(())
    }
}

impl Drop for FallbackClipAdapter {
    fn drop(&mut self) {
        self.detach();
    }
}
