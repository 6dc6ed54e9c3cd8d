//! Library models handed back to the host.

use bridge_traits::{LibraryAlbumSummary, LibraryAlbumTrack};
use serde::{Deserialize, Serialize};

/// Playable track of a library album.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryTrack {
    pub id: String,
    pub title: String,
    pub disc_number: Option<u32>,
    pub track_number: Option<u32>,
}

impl From<LibraryAlbumTrack> for LibraryTrack {
    fn from(track: LibraryAlbumTrack) -> Self {
        Self {
            id: track.id,
            title: track.title,
            disc_number: track.disc_number,
            track_number: track.track_number,
        }
    }
}

/// Library album with its purchased tracks in feed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryAlbum {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist_name: Option<String>,
    pub tracks: Vec<LibraryTrack>,
}

impl LibraryAlbum {
    pub fn new(summary: LibraryAlbumSummary, tracks: Vec<LibraryTrack>) -> Self {
        Self {
            id: summary.id,
            title: summary.title,
            artist_name: summary.artist_name,
            tracks,
        }
    }
}
