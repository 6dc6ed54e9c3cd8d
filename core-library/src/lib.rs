//! # Library Module
//!
//! Read access to the user's own library on the remote service.
//!
//! ## Overview
//!
//! This module provides:
//! - Search term derivation from song titles
//! - `LibraryResolver`: finds the purchased library copy of a catalog song
//! - `AlbumBrowser`: saved album listing and album track lists
//!
//! Every paginated walk is a bounded loop. A feed that keeps handing out
//! `next` cursors stops after `max_page_fetches` requests.

pub mod browser;
pub mod error;
pub mod models;
pub mod resolver;
pub mod search_term;

pub use browser::{AlbumBrowser, AlbumPage, AlbumQuery};
pub use error::{LibraryError, Result};
pub use models::{LibraryAlbum, LibraryTrack};
pub use resolver::LibraryResolver;
pub use search_term::derive_search_term;

/// Default cap on page fetches for a single paginated walk.
pub const DEFAULT_MAX_PAGE_FETCHES: u32 = 10;

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result};
    use bridge_traits::{
        CatalogSong, LibraryAlbumSummary, LibraryAlbumTrack, LibrarySong, MusicCatalog, Page,
    };
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Cursor-paginated in-memory catalog that records every request.
    #[derive(Default)]
    pub struct FakeCatalog {
        pub song_pages: Vec<Vec<LibrarySong>>,
        /// Keep handing out `next` cursors past the last page.
        pub endless: bool,
        pub albums: Vec<LibraryAlbumSummary>,
        pub album_search_pages: Vec<Vec<LibraryAlbumSummary>>,
        pub tracks: HashMap<String, Vec<Vec<LibraryAlbumTrack>>>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeCatalog {
        pub fn call_count(&self, prefix: &str) -> usize {
            self.calls
                .lock()
                .iter()
                .filter(|call| call.starts_with(prefix))
                .count()
        }

        fn page<T: Clone>(&self, pages: &[Vec<T>], cursor: Option<&str>) -> Page<T> {
            let index = cursor.and_then(|c| c.parse::<usize>().ok()).unwrap_or(0);
            let items = pages.get(index).cloned().unwrap_or_default();
            let next = (self.endless || index + 1 < pages.len()).then(|| (index + 1).to_string());
            Page::new(items, next)
        }
    }

    pub fn song(id: &str, title: &str, purchased_id: Option<&str>) -> LibrarySong {
        LibrarySong {
            id: id.to_string(),
            title: title.to_string(),
            album_title: Some("Album".to_string()),
            purchased_id: purchased_id.map(str::to_string),
            catalog_id: None,
        }
    }

    pub fn album(id: &str, title: &str) -> LibraryAlbumSummary {
        LibraryAlbumSummary {
            id: id.to_string(),
            title: title.to_string(),
            artist_name: Some("Artist".to_string()),
            track_count: None,
        }
    }

    pub fn track(id: &str, number: u32, purchased_id: Option<&str>) -> LibraryAlbumTrack {
        LibraryAlbumTrack {
            id: id.to_string(),
            title: format!("Track {}", number),
            disc_number: Some(1),
            track_number: Some(number),
            purchased_id: purchased_id.map(str::to_string),
        }
    }

    #[async_trait]
    impl MusicCatalog for FakeCatalog {
        async fn catalog_song(&self, song_id: &str) -> Result<CatalogSong> {
            self.calls.lock().push(format!("song:{}", song_id));
            Err(BridgeError::NotFound(song_id.to_string()))
        }

        async fn search_library_songs(
            &self,
            term: &str,
            cursor: Option<&str>,
        ) -> Result<Page<LibrarySong>> {
            self.calls.lock().push(format!("search-songs:{}", term));
            Ok(self.page(&self.song_pages, cursor))
        }

        async fn library_albums(&self, limit: u32, offset: u32) -> Result<Page<LibraryAlbumSummary>> {
            self.calls.lock().push(format!("albums:{}:{}", limit, offset));
            let start = (offset as usize).min(self.albums.len());
            let end = (start + limit as usize).min(self.albums.len());
            let next = (end < self.albums.len()).then(|| format!("offset={}", end));
            Ok(Page::new(self.albums[start..end].to_vec(), next))
        }

        async fn search_library_albums(
            &self,
            term: &str,
            cursor: Option<&str>,
        ) -> Result<Page<LibraryAlbumSummary>> {
            self.calls.lock().push(format!("search-albums:{}", term));
            Ok(self.page(&self.album_search_pages, cursor))
        }

        async fn library_album(&self, album_id: &str) -> Result<LibraryAlbumSummary> {
            self.calls.lock().push(format!("album:{}", album_id));
            self.albums
                .iter()
                .find(|album| album.id == album_id)
                .cloned()
                .ok_or_else(|| BridgeError::NotFound(album_id.to_string()))
        }

        async fn library_album_tracks(
            &self,
            album_id: &str,
            cursor: Option<&str>,
        ) -> Result<Page<LibraryAlbumTrack>> {
            self.calls.lock().push(format!("tracks:{}", album_id));
            let pages = self.tracks.get(album_id).cloned().unwrap_or_default();
            Ok(self.page(&pages, cursor))
        }
    }
}
