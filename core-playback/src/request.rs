//! Request and resolution types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Input of `setSong`.
///
/// Optional string hints are treated as absent when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackRequest {
    pub song_id: String,
    #[serde(default)]
    pub library_song_id: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub song_title: Option<String>,
    #[serde(default)]
    pub album_title: Option<String>,
    #[serde(default)]
    pub force_preview: bool,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl PlaybackRequest {
    pub fn new(song_id: impl Into<String>) -> Self {
        Self {
            song_id: song_id.into(),
            ..Default::default()
        }
    }

    pub fn with_library_song_id(mut self, id: impl Into<String>) -> Self {
        self.library_song_id = Some(id.into());
        self
    }

    pub fn with_preview_url(mut self, url: impl Into<String>) -> Self {
        self.preview_url = Some(url.into());
        self
    }

    pub fn with_song_title(mut self, title: impl Into<String>) -> Self {
        self.song_title = Some(title.into());
        self
    }

    pub fn with_album_title(mut self, title: impl Into<String>) -> Self {
        self.album_title = Some(title.into());
        self
    }

    pub fn force_preview(mut self) -> Self {
        self.force_preview = true;
        self
    }

    pub fn library_song_id(&self) -> Option<&str> {
        non_empty(&self.library_song_id)
    }

    pub fn preview_url(&self) -> Option<&str> {
        non_empty(&self.preview_url)
    }

    pub fn song_title(&self) -> Option<&str> {
        non_empty(&self.song_title)
    }

    pub fn album_title(&self) -> Option<&str> {
        non_empty(&self.album_title)
    }
}

/// Source a request was resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ResolvedSource {
    CatalogTrack {
        id: String,
    },
    #[serde(rename_all = "camelCase")]
    LibraryTrack {
        id: String,
        album_title: Option<String>,
    },
    PreviewClip {
        url: String,
    },
}

impl ResolvedSource {
    /// Whether the source plays on the subscription engine.
    pub fn is_full_service(&self) -> bool {
        !matches!(self, ResolvedSource::PreviewClip { .. })
    }
}

impl fmt::Display for ResolvedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedSource::CatalogTrack { id } => write!(f, "catalog:{}", id),
            ResolvedSource::LibraryTrack { id, .. } => write!(f, "library:{}", id),
            ResolvedSource::PreviewClip { .. } => f.write_str("preview"),
        }
    }
}

/// Successful resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub source: ResolvedSource,
    /// Library id to cache for the fast path on the next request.
    pub library_song_id: Option<String>,
    pub album_title: Option<String>,
}

impl From<ResolvedSource> for Resolution {
    fn from(source: ResolvedSource) -> Self {
        let (library_song_id, album_title) = match &source {
            ResolvedSource::LibraryTrack { id, album_title } => {
                (Some(id.clone()), album_title.clone())
            }
            _ => (None, None),
        };
        Self {
            source,
            library_song_id,
            album_title,
        }
    }
}
