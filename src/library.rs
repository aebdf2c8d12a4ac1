use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub album: String,
    pub artist: String,
    pub album_artist: String,
    pub genre: String,
    pub source: String,
    pub image: String,
    pub track_number: u32,
    pub total_track_count: u32,
    pub duration_ms: u64,
    pub site: String,
}

/// Aggregate over every track sharing an album title.
///
/// Artist, artwork, genre and track count come from the first track seen for the album.
/// `total_track_count` is the declared count on that track, not the number of tracks found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Album {
    pub title: String,
    pub artist: String,
    pub image: String,
    pub genre: String,
    pub total_track_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogState {
    Uninitialized,
    Initializing,
    Initialized,
    Error,
}

impl CatalogState {
    pub fn is_terminal(self) -> bool {
        matches!(self, CatalogState::Initialized | CatalogState::Error)
    }
}

/// One published catalog snapshot. Never mutated after publication.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub version: u64,
    pub state: CatalogState,
    pub tracks: Arc<Vec<Track>>,
    pub albums: Arc<Vec<Album>>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self {
            version: 0,
            state: CatalogState::Uninitialized,
            tracks: Arc::new(Vec::new()),
            albums: Arc::new(Vec::new()),
        }
    }

    pub fn find_track(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|track| track.id == id)
    }

    pub fn album_tracks<'a>(&'a self, album: &'a str) -> impl Iterator<Item = &'a Track> + 'a {
        self.tracks.iter().filter(move |track| track.album == album)
    }
}
