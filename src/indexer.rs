use std::collections::HashSet;

use crate::library::{Album, CatalogState, Track};

/// Groups tracks into albums, keeping albums in order of first appearance.
///
/// Album metadata is taken from the first track seen for each title and is never
/// revised by later tracks.
pub fn group_albums(tracks: &[Track]) -> Vec<Album> {
    let mut albums: Vec<Album> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for track in tracks {
        if !seen.insert(track.album.as_str()) {
            continue;
        }
        albums.push(Album {
            title: track.album.clone(),
            artist: track.artist.clone(),
            image: track.image.clone(),
            genre: track.genre.clone(),
            total_track_count: track.total_track_count,
        });
    }

    albums
}

/// Readiness after indexing: an empty album list is an error.
pub fn readiness(albums: &[Album]) -> CatalogState {
    if albums.is_empty() {
        CatalogState::Error
    } else {
        CatalogState::Initialized
    }
}
