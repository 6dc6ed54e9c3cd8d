use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] BridgeError),

    /// No match after `pages` page fetches, either because the feed ended or
    /// because the page cap was reached.
    #[error("Library search exhausted after {pages} page(s)")]
    SearchExhausted { pages: u32 },

    #[error("Album not found: {0}")]
    AlbumNotFound(String),

    #[error("Album {0} has no purchased tracks")]
    EmptyAlbum(String),

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },
}

pub type Result<T> = std::result::Result<T, LibraryError>;
