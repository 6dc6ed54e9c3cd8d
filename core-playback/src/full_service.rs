//! # Full-Service Adapter
//!
//! Plays catalog and library tracks on the subscription engine's managed
//! queue.

use crate::adapter::PlaybackSourceAdapter;
use crate::error::Result;
use crate::normalizer::{EngineStateNormalizer, Progress, StateCell};
use crate::request::ResolvedSource;
use async_trait::async_trait;
use bridge_traits::{EnginePlaybackState, QueueItem, SubscriptionEngine};
use core_runtime::events::{EventBus, PlaybackState};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

pub struct FullServiceAdapter {
    engine: Arc<dyn SubscriptionEngine>,
    source: ResolvedSource,
    state: StateCell,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl FullServiceAdapter {
    /// Queue `item` on the engine and start forwarding its state changes.
    ///
    /// The engine volume is set to `volume` first. Nothing is left running
    /// when queueing fails.
    #[instrument(skip(engine, item, event_bus, completion_threshold))]
    pub async fn attach(
        engine: Arc<dyn SubscriptionEngine>,
        source: ResolvedSource,
        item: QueueItem,
        volume: f32,
        event_bus: EventBus,
        completion_threshold: Duration,
    ) -> Result<Self> {
        let receiver = engine.state_changes();

        engine.set_volume(volume).await?;
        engine.set_queue(item).await?;

        let state = StateCell::new();
        let normalizer = EngineStateNormalizer::new(event_bus, state.clone(), completion_threshold);
        let listener = tokio::spawn(forward_engine_states(engine.clone(), receiver, normalizer));

        debug!("Engine queue set");
        Ok(Self {
            engine,
            source,
            state,
            listener: Mutex::new(Some(listener)),
        })
    }

    fn detach(&self) {
        self.state.detach();
        if let Some(listener) = self.listener.lock().take() {
            listener.abort();
        }
    }
}

async fn forward_engine_states(
    engine: Arc<dyn SubscriptionEngine>,
    mut receiver: broadcast::Receiver<EnginePlaybackState>,
    mut normalizer: EngineStateNormalizer,
) {
    loop {
        let raw = match receiver.recv().await {
            Ok(raw) => raw,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Engine state notifications dropped");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        let progress = if EngineStateNormalizer::needs_progress(raw) {
            sample_progress(engine.as_ref()).await
        } else {
            None
        };

        if let Some(state) = normalizer.observe(raw, progress) {
            debug!(raw = ?raw, %state, "Engine state normalized");
        }
    }
}

async fn sample_progress(engine: &dyn SubscriptionEngine) -> Option<Progress> {
    let position = engine.playback_time().await;
    let duration = engine.playback_duration().await;
    match (position, duration) {
        (Ok(position), Ok(duration)) => Some(Progress { position, duration }),
        (Err(err), _) | (_, Err(err)) => {
            warn!(error = %err, "Could not sample engine progress");
            None
        }
    }
}

#[async_trait]
impl PlaybackSourceAdapter for FullServiceAdapter {
    fn source(&self) -> &ResolvedSource {
        &self.source
    }

    fn state(&self) -> PlaybackState {
        self.state.get()
    }

    async fn play(&self) -> Result<()> {
        Ok(self.engine.play().await?)
    }

    async fn pause(&self) -> Result<()> {
        Ok(self.engine.pause().await?)
    }

    async fn stop(&self) -> Result<()> {
        Ok(self.engine.stop().await?)
    }

    async fn seek(&self, position: f64) -> Result<()> {
        Ok(self.engine.seek(position).await?)
    }

    async fn current_time(&self) -> Result<f64> {
        Ok(self.engine.playback_time().await?)
    }

    async fn duration(&self) -> Result<f64> {
        Ok(self.engine.playback_duration().await?)
    }

    async fn set_volume(&self, volume: f32) -> Result<()> {
        Ok(self.engine.set_volume(volume).await?)
    }

    async fn teardown(&self) -> Result<()> {
        self.detach();
        self.engine.stop().await?;
        self.engine.clear_queue().await?;
        Ok(())
    }
}

impl Drop for FullServiceAdapter {
    fn drop(&mut self) {
        self.detach();
    }
}
