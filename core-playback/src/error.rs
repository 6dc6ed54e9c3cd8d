//! # Playback Error Types
//!
//! Failures of song resolution and transport control.

use bridge_traits::BridgeError;
use core_library::LibraryError;
use thiserror::Error;

/// Errors that can occur during resolution and playback.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Resolution Errors
    // ========================================================================
    /// Not authorized and nothing playable without authorization.
    #[error("Not authorized and no preview available")]
    AuthorizationDenied,

    /// Catalog metadata lookup failed.
    #[error("Catalog lookup failed for {song_id}: {reason}")]
    CatalogLookupFailed { song_id: String, reason: String },

    /// Library search ended without a purchased match.
    #[error("Library search exhausted after {pages} page(s)")]
    LibrarySearchExhausted { pages: u32 },

    /// No catalog track, library copy or preview clip for the song.
    #[error("No playable source for {song_id}")]
    NoPlayableSource { song_id: String },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// An engine or clip operation failed; the live source is unchanged.
    #[error("Playback operation failed: {0}")]
    TransientPlaybackError(String),

    /// Attempted a transport operation with no live source.
    #[error("No source loaded")]
    NoSourceLoaded,

    /// Invalid volume value (must be in range [0.0, 1.0]).
    #[error("Invalid volume: {0} (must be between 0.0 and 1.0)")]
    InvalidVolume(f32),

    /// Host engine error.
    #[error("Engine error: {0}")]
    Engine(#[from] BridgeError),
}

impl PlaybackError {
    /// Returns `true` if the same request may succeed when issued again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PlaybackError::TransientPlaybackError(_) | PlaybackError::Engine(_)
        )
    }

    /// Returns `true` if resolution can continue with a lower tier.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PlaybackError::AuthorizationDenied
                | PlaybackError::CatalogLookupFailed { .. }
                | PlaybackError::LibrarySearchExhausted { .. }
        )
    }
}

impl From<LibraryError> for PlaybackError {
    fn from(err: LibraryError) -> Self {
        match err {
            LibraryError::SearchExhausted { pages } => {
                PlaybackError::LibrarySearchExhausted { pages }
            }
            other => PlaybackError::TransientPlaybackError(other.to_string()),
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
