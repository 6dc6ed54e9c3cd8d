//! # Album Browser
//!
//! Saved album listing and album lookup by id or exact title.

use crate::error::{LibraryError, Result};
use crate::models::{LibraryAlbum, LibraryTrack};
use crate::search_term::derive_search_term;
use bridge_traits::{LibraryAlbumSummary, LibraryAlbumTrack, MusicCatalog};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// One page of saved albums.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumPage {
    pub albums: Vec<LibraryAlbumSummary>,
    pub has_next: bool,
}

/// How `get_album` identifies the album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlbumQuery {
    Id(String),
    /// Exact title match among library album search results.
    Title(String),
}

pub struct AlbumBrowser {
    catalog: Arc<dyn MusicCatalog>,
    max_page_fetches: u32,
}

impl AlbumBrowser {
    pub fn new(catalog: Arc<dyn MusicCatalog>, max_page_fetches: u32) -> Self {
        Self {
            catalog,
            max_page_fetches,
        }
    }

    /// Fetch one page of saved albums. Single request, no retry.
    #[instrument(skip(self))]
    pub async fn list_albums(&self, limit: u32, offset: u32) -> Result<AlbumPage> {
        if limit == 0 {
            return Err(LibraryError::InvalidInput {
                field: "limit".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        let page = self.catalog.library_albums(limit, offset).await?;
        let has_next = page.has_next();
        Ok(AlbumPage {
            albums: page.items,
            has_next,
        })
    }

    /// Resolve an album and its purchased tracks.
    ///
    /// Tracks without a purchased id are dropped. An album left with no
    /// tracks is reported as [`LibraryError::EmptyAlbum`].
    #[instrument(skip(self))]
    pub async fn get_album(&self, query: &AlbumQuery) -> Result<LibraryAlbum> {
        let summary = match query {
            AlbumQuery::Id(id) => match self.catalog.library_album(id).await {
                Ok(summary) => summary,
                Err(err) if err.is_not_found() => {
                    return Err(LibraryError::AlbumNotFound(id.clone()))
                }
                Err(err) => return Err(err.into()),
            },
            AlbumQuery::Title(title) => self.find_album_by_title(title).await?,
        };

        let tracks: Vec<LibraryTrack> = self
            .album_tracks(&summary.id)
            .await?
            .into_iter()
            .filter(|track| track.purchased_id.is_some())
            .map(LibraryTrack::from)
            .collect();

        if tracks.is_empty() {
            return Err(LibraryError::EmptyAlbum(summary.id));
        }

        debug!(album_id = %summary.id, tracks = tracks.len(), "Album resolved");
        Ok(LibraryAlbum::new(summary, tracks))
    }

    async fn find_album_by_title(&self, title: &str) -> Result<LibraryAlbumSummary> {
        let term = derive_search_term(title);
        if term.is_empty() {
            return Err(LibraryError::InvalidInput {
                field: "title".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        let mut cursor: Option<String> = None;
        for _ in 0..self.max_page_fetches {
            let page = self
                .catalog
                .search_library_albums(&term, cursor.as_deref())
                .await?;

            if let Some(found) = page.items.into_iter().find(|album| album.title == title) {
                return Ok(found);
            }

            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Err(LibraryError::AlbumNotFound(title.to_string()))
    }

    async fn album_tracks(&self, album_id: &str) -> Result<Vec<LibraryAlbumTrack>> {
        let mut tracks = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..self.max_page_fetches {
            let page = self
                .catalog
                .library_album_tracks(album_id, cursor.as_deref())
                .await?;
            tracks.extend(page.items);

            match page.next {
                Some(next) => cursor = Some(next),
                None => return Ok(tracks),
            }
        }

        warn!(
            album_id,
            pages = self.max_page_fetches,
            "Album track list truncated at page cap"
        );
        Ok(tracks)
    }
}
