//! # Library Resolver
//!
//! Finds the library copy of a purchased catalog song by walking the library
//! search feed page by page.

use crate::error::{LibraryError, Result};
use bridge_traits::{LibrarySong, MusicCatalog};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Bounded search for purchased library tracks.
pub struct LibraryResolver {
    catalog: Arc<dyn MusicCatalog>,
    max_page_fetches: u32,
}

impl LibraryResolver {
    pub fn new(catalog: Arc<dyn MusicCatalog>, max_page_fetches: u32) -> Self {
        Self {
            catalog,
            max_page_fetches,
        }
    }

    pub fn max_page_fetches(&self) -> u32 {
        self.max_page_fetches
    }

    /// Find the library song whose purchased id equals `purchased_id`.
    ///
    /// Issues at most `max_page_fetches` search requests. Returns
    /// [`LibraryError::SearchExhausted`] when the feed ends or the cap is hit
    /// without a match. Request failures propagate as
    /// [`LibraryError::Catalog`].
    #[instrument(skip(self))]
    pub async fn find_purchased_track(&self, term: &str, purchased_id: &str) -> Result<LibrarySong> {
        if term.trim().is_empty() {
            return Err(LibraryError::SearchExhausted { pages: 0 });
        }

        let mut cursor: Option<String> = None;
        let mut pages = 0;
        let mut feed_ended = false;

        while pages < self.max_page_fetches {
            let page = self
                .catalog
                .search_library_songs(term, cursor.as_deref())
                .await?;
            pages += 1;

            if let Some(found) = page
                .items
                .into_iter()
                .find(|song| song.purchased_id.as_deref() == Some(purchased_id))
            {
                debug!(page = pages, library_id = %found.id, "Purchased track found");
                return Ok(found);
            }

            match page.next {
                Some(next) => cursor = Some(next),
                None => {
                    feed_ended = true;
                    break;
                }
            }
        }

        debug!(pages, feed_ended, "No purchased track in library");
        Err(LibraryError::SearchExhausted { pages })
    }
}
