//! Navigable hierarchy over a catalog snapshot.
//!
//! The root holds two categories. Recommended is the first half of the album list
//! (rounded down) and Albums is the remainder. Each album id is its exact title and
//! lists that album's tracks in catalog order.

use serde::Serialize;

use crate::library::{Album, Catalog, Track};
use crate::storage::LastPlayed;

pub const ROOT_ID: &str = "__ROOT__";
pub const RECOMMENDED_ROOT_ID: &str = "__RECOMMENDED__";
pub const ALBUMS_ROOT_ID: &str = "__ALBUMS__";
pub const RECENT_ROOT_ID: &str = "__RECENT__";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaItem {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub icon_uri: String,
    pub source: Option<String>,
    pub duration_ms: Option<u64>,
    pub track_number: Option<u32>,
    pub browsable: bool,
    pub playable: bool,
}

impl MediaItem {
    fn category(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            subtitle: String::new(),
            description: String::new(),
            icon_uri: String::new(),
            source: None,
            duration_ms: None,
            track_number: None,
            browsable: true,
            playable: false,
        }
    }
}

impl From<&Album> for MediaItem {
    fn from(album: &Album) -> Self {
        Self {
            id: album.title.clone(),
            title: album.title.clone(),
            subtitle: album.artist.clone(),
            description: album.genre.clone(),
            icon_uri: album.image.clone(),
            source: None,
            duration_ms: None,
            track_number: None,
            browsable: true,
            playable: false,
        }
    }
}

impl From<&Track> for MediaItem {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id.clone(),
            title: track.title.clone(),
            subtitle: track.artist.clone(),
            description: track.album.clone(),
            icon_uri: track.image.clone(),
            source: Some(track.source.clone()),
            duration_ms: Some(track.duration_ms),
            track_number: Some(track.track_number),
            browsable: false,
            playable: true,
        }
    }
}

/// Recommended and Albums buckets as slices of the album list.
pub fn partition(albums: &[Album]) -> (&[Album], &[Album]) {
    albums.split_at(albums.len() / 2)
}

/// Children of `parent_id`. Unknown ids yield an empty list.
pub fn children(catalog: &Catalog, parent_id: &str, recent: Option<&LastPlayed>) -> Vec<MediaItem> {
    let (recommended, all_albums) = partition(&catalog.albums);

    match parent_id {
        ROOT_ID => vec![
            MediaItem::category(RECOMMENDED_ROOT_ID, "Recommended"),
            MediaItem::category(ALBUMS_ROOT_ID, "Albums"),
        ],
        RECOMMENDED_ROOT_ID => recommended.iter().map(MediaItem::from).collect(),
        ALBUMS_ROOT_ID => all_albums.iter().map(MediaItem::from).collect(),
        RECENT_ROOT_ID => recent
            .and_then(|last| catalog.find_track(&last.media_id))
            .map(|track| vec![MediaItem::from(track)])
            .unwrap_or_default(),
        album => catalog.album_tracks(album).map(MediaItem::from).collect(),
    }
}
