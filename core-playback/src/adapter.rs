//! # Playback Source Adapter
//!
//! Common transport contract over the two audio backends. The resolver holds
//! exactly one adapter at a time and always calls [`teardown`] before
//! replacing it.
//!
//! [`teardown`]: PlaybackSourceAdapter::teardown

use crate::error::Result;
use crate::request::ResolvedSource;
use async_trait::async_trait;
use core_runtime::events::PlaybackState;

#[async_trait]
pub trait PlaybackSourceAdapter: Send + Sync {
    /// Source this adapter was attached for.
    fn source(&self) -> &ResolvedSource;

    /// Last canonical state this adapter reported.
    fn state(&self) -> PlaybackState;

    async fn play(&self) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    /// Seek to an absolute position in seconds.
    async fn seek(&self, position: f64) -> Result<()>;

    /// Current position in seconds.
    async fn current_time(&self) -> Result<f64>;

    /// Duration in seconds.
    async fn duration(&self) -> Result<f64>;

    /// Volume in `0.0..=1.0`.
    async fn set_volume(&self, volume: f32) -> Result<()>;

    /// Detach listeners, cancel timers and stop the backend.
    ///
    /// No event from this adapter reaches listeners once this returns.
    async fn teardown(&self) -> Result<()>;
}
