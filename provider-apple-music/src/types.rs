//! Apple Music API response types
//!
//! Data structures for deserializing Apple Music API v1 responses. Only the
//! attributes the bridge consumes are modelled; everything else is ignored.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Generic resource object
///
/// See: https://developer.apple.com/documentation/applemusicapi/resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource<A> {
    pub id: String,

    /// Resource type, e.g. `songs`, `library-songs`, `library-albums`
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Missing on relationship stubs
    #[serde(default = "Option::default")]
    pub attributes: Option<A>,
}

/// Response carrying a `data` array and an optional `next` path
#[derive(Debug, Deserialize)]
pub struct DataResponse<A> {
    #[serde(default = "Vec::new")]
    pub data: Vec<Resource<A>>,

    /// Relative path of the next page
    #[serde(default)]
    pub next: Option<String>,
}

/// Library search response
///
/// `results` is keyed by the requested type and omits types with no hits.
#[derive(Debug, Deserialize)]
pub struct SearchResponse<A> {
    #[serde(default = "HashMap::new")]
    pub results: HashMap<String, DataResponse<A>>,
}

/// Playback parameters; present only when the item is playable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayParams {
    pub id: String,

    #[serde(default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub is_library: bool,

    /// Catalog identifier of the purchased item (library items only)
    #[serde(default)]
    pub purchased_id: Option<String>,

    #[serde(default)]
    pub catalog_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preview {
    pub url: String,
}

/// `songs` attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongAttributes {
    pub name: String,

    #[serde(default)]
    pub album_name: Option<String>,

    #[serde(default)]
    pub play_params: Option<PlayParams>,

    #[serde(default)]
    pub previews: Vec<Preview>,
}

/// `library-songs` attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibrarySongAttributes {
    pub name: String,

    #[serde(default)]
    pub album_name: Option<String>,

    #[serde(default)]
    pub disc_number: Option<u32>,

    #[serde(default)]
    pub track_number: Option<u32>,

    #[serde(default)]
    pub play_params: Option<PlayParams>,
}

/// `library-albums` attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryAlbumAttributes {
    pub name: String,

    #[serde(default)]
    pub artist_name: Option<String>,

    #[serde(default)]
    pub track_count: Option<u32>,
}

/// Error object returned alongside non-2xx statuses
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub errors: Vec<ApiErrorObject>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorObject {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub detail: Option<String>,
}

impl ApiErrorBody {
    /// First human-readable message, if any.
    pub fn message(&self) -> Option<String> {
        self.errors
            .first()
            .and_then(|e| e.detail.clone().or_else(|| e.title.clone()))
    }
}
