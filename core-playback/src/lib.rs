//! # Playback Module
//!
//! Song resolution and transport control over two audio backends.
//!
//! ## Overview
//!
//! This module handles:
//! - `SongResolver`: picks a catalog track, a purchased library copy or a
//!   preview clip for a song, and owns the single live source
//! - `FullServiceAdapter` / `FallbackClipAdapter`: the two
//!   [`PlaybackSourceAdapter`] backends
//! - Event normalization into `playbackStateDidChange`
//! - Fade-in and fade-out of preview clips

pub mod adapter;
pub mod clip;
pub mod error;
pub mod fade;
pub mod full_service;
pub mod normalizer;
pub mod request;
pub mod resolution;

pub use adapter::PlaybackSourceAdapter;
pub use clip::FallbackClipAdapter;
pub use error::{PlaybackError, Result};
pub use fade::{fade_out_delay, FadeScheduler};
pub use full_service::FullServiceAdapter;
pub use normalizer::{ClipEventNormalizer, EngineStateNormalizer, Progress, StateCell};
pub use request::{PlaybackRequest, Resolution, ResolvedSource};
pub use resolution::SongResolver;
