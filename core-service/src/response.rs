//! Call payloads and responses.
//!
//! Everything serializes in camelCase so a transport can marshal it as JSON
//! unchanged.

use bridge_traits::LibraryAlbumSummary;
use core_library::LibraryAlbum;
use serde::{Deserialize, Serialize};

/// `{result: bool}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultResponse {
    pub result: bool,
}

impl From<bool> for ResultResponse {
    fn from(result: bool) -> Self {
        Self { result }
    }
}

/// `{result: seconds}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeResponse {
    pub result: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSongResponse {
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library_song_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeekRequest {
    pub playback_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeRequest {
    pub volume: f32,
}

/// Album lookup; `id` wins when both are given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumLookup {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumResponse {
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<LibraryAlbum>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumListRequest {
    #[serde(default = "default_album_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_album_limit() -> u32 {
    25
}

impl Default for AlbumListRequest {
    fn default() -> Self {
        Self {
            limit: default_album_limit(),
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumsResponse {
    pub result: bool,
    pub albums: Vec<LibraryAlbumSummary>,
    pub has_next: bool,
}
