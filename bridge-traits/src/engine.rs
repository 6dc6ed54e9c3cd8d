//! Audio engine bridge traits.
//!
//! Two unrelated engines sit behind the core: the platform's subscription
//! streaming engine (managed queue, native state notifications) and a generic
//! streaming audio element used for direct-URL clips. Hosts implement these
//! traits over their native SDKs; the core only consumes the contracts below.
//!
//! Times are expressed in seconds as `f64` and volume is normalized to
//! `0.0..=1.0`, mirroring what host SDKs report.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::error::Result;

/// Raw playback state vocabulary reported by subscription engines.
///
/// This is the union of the native engine's playback-state enumeration and
/// the browser SDK's numeric `PlaybackStates`. Only a subset maps onto a
/// canonical state; the rest are transient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnginePlaybackState {
    None,
    Loading,
    Stopped,
    Playing,
    Paused,
    /// Playback was interrupted externally (e.g., an incoming call).
    Interrupted,
    SeekingForward,
    SeekingBackward,
    Seeking,
    Waiting,
    Stalled,
    Ended,
    Completed,
}

impl EnginePlaybackState {
    /// Map a browser SDK `PlaybackStates` code onto the raw vocabulary.
    ///
    /// Returns `None` for codes the SDK does not define.
    pub fn from_sdk_code(code: u8) -> Option<Self> {
        let state = match code {
            0 => Self::None,
            1 => Self::Loading,
            2 => Self::Playing,
            3 => Self::Paused,
            4 => Self::Stopped,
            5 => Self::Ended,
            6 => Self::Seeking,
            7 => Self::Waiting,
            8 => Self::Stalled,
            9 => Self::Completed,
            _ => return None,
        };
        Some(state)
    }
}

/// Item handed to the subscription engine's managed queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum QueueItem {
    /// Streamable catalog track.
    Catalog { id: String },
    /// Purchased copy in the user's library.
    Library {
        id: String,
        title: Option<String>,
        album_title: Option<String>,
    },
}

impl QueueItem {
    pub fn id(&self) -> &str {
        match self {
            QueueItem::Catalog { id } | QueueItem::Library { id, .. } => id,
        }
    }
}

/// Platform subscription streaming engine with a managed playback queue.
///
/// Implementations must broadcast every native state notification through
/// [`SubscriptionEngine::state_changes`]; the core decides which of them are
/// meaningful.
#[async_trait]
pub trait SubscriptionEngine: Send + Sync {
    /// Replace the managed queue with a single item.
    ///
    /// Fails when the engine cannot locate the item (for library items this
    /// includes purchases that have not reached the device yet).
    async fn set_queue(&self, item: QueueItem) -> Result<()>;

    /// Empty the managed queue.
    async fn clear_queue(&self) -> Result<()>;

    async fn play(&self) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    /// Seek to an absolute position in seconds.
    async fn seek(&self, position: f64) -> Result<()>;

    /// Current playback position in seconds.
    async fn playback_time(&self) -> Result<f64>;

    /// Duration of the now-playing item in seconds (0 when nothing is loaded).
    async fn playback_duration(&self) -> Result<f64>;

    async fn set_volume(&self, volume: f32) -> Result<()>;

    /// Subscribe to raw state notifications.
    fn state_changes(&self) -> broadcast::Receiver<EnginePlaybackState>;
}

/// Raw notifications emitted by a generic streaming audio element.
///
/// HTML5-audio style libraries report discrete events; native generic players
/// only expose a continuous rate/position observation, reported as
/// [`ClipEvent::RateChanged`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ClipEvent {
    Play,
    Pause,
    End,
    Stop,
    RateChanged {
        rate: f32,
        position: f64,
        duration: f64,
    },
}

/// Generic streaming audio element pointed at a direct URL.
#[async_trait]
pub trait ClipPlayer: Send + Sync {
    async fn play(&self) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    /// Seek to an absolute position in seconds.
    async fn seek(&self, position: f64) -> Result<()>;

    async fn position(&self) -> Result<f64>;

    async fn duration(&self) -> Result<f64>;

    async fn volume(&self) -> Result<f32>;

    async fn set_volume(&self, volume: f32) -> Result<()>;

    /// Subscribe to raw element notifications.
    fn events(&self) -> broadcast::Receiver<ClipEvent>;
}

/// Creates clip players for direct URLs.
#[async_trait]
pub trait ClipPlayerFactory: Send + Sync {
    /// Load `url` into a fresh element without starting playback.
    async fn load(&self, url: &str, initial_volume: f32) -> Result<Arc<dyn ClipPlayer>>;
}
