//! Remote catalog and library API abstraction.
//!
//! The catalog is the subscription-gated song database; the library holds the
//! user's own purchased and saved items. Paginated endpoints return a [`Page`]
//! whose `next` cursor is opaque to callers and must be handed back verbatim.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One page of a paginated feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Cursor for the following page, absent on the last page.
    pub next: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next: Option<String>) -> Self {
        Self { items, next }
    }

    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

/// Catalog metadata for a single song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSong {
    pub id: String,
    pub title: String,
    pub album_title: Option<String>,
    /// Whether the song carries playback parameters, i.e. it is streamable
    /// under the current subscription.
    pub has_play_params: bool,
    /// First preview asset, when the catalog offers one.
    pub preview_url: Option<String>,
}

impl CatalogSong {
    pub fn is_playable(&self) -> bool {
        self.has_play_params
    }
}

/// Library search hit for a song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibrarySong {
    pub id: String,
    pub title: String,
    pub album_title: Option<String>,
    /// Catalog identifier of the purchase this library item corresponds to.
    pub purchased_id: Option<String>,
    pub catalog_id: Option<String>,
}

/// Library album without its track list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryAlbumSummary {
    pub id: String,
    pub title: String,
    pub artist_name: Option<String>,
    pub track_count: Option<u32>,
}

/// Track entry of a library album.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryAlbumTrack {
    pub id: String,
    pub title: String,
    pub disc_number: Option<u32>,
    pub track_number: Option<u32>,
    pub purchased_id: Option<String>,
}

/// Remote catalog/library API.
///
/// Every method issues exactly one request. Callers own pagination and its
/// bounds.
#[async_trait]
pub trait MusicCatalog: Send + Sync {
    /// Look up catalog metadata for `song_id`.
    ///
    /// Returns [`BridgeError::NotFound`](crate::error::BridgeError::NotFound)
    /// when the catalog has no such song.
    async fn catalog_song(&self, song_id: &str) -> Result<CatalogSong>;

    /// Full-text search over library songs.
    async fn search_library_songs(
        &self,
        term: &str,
        cursor: Option<&str>,
    ) -> Result<Page<LibrarySong>>;

    /// One page of the user's saved albums.
    async fn library_albums(&self, limit: u32, offset: u32) -> Result<Page<LibraryAlbumSummary>>;

    /// Full-text search over library albums.
    async fn search_library_albums(
        &self,
        term: &str,
        cursor: Option<&str>,
    ) -> Result<Page<LibraryAlbumSummary>>;

    /// Album resource by library identifier.
    async fn library_album(&self, album_id: &str) -> Result<LibraryAlbumSummary>;

    /// One page of an album's tracks.
    async fn library_album_tracks(
        &self,
        album_id: &str,
        cursor: Option<&str>,
    ) -> Result<Page<LibraryAlbumTrack>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_cursor_helpers() {
        let page = Page::new(vec![1, 2], Some("/v1/next".to_string()));
        assert!(page.has_next());
        assert!(!Page::last(vec![3]).has_next());
    }

    #[test]
    fn catalog_song_playability() {
        let song = CatalogSong {
            id: "1".into(),
            title: "Song".into(),
            album_title: None,
            has_play_params: false,
            preview_url: Some("https://example.com/preview.m4a".into()),
        };
        assert!(!song.is_playable());
    }
}
