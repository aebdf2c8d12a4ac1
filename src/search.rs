//! Search & selection: turns a playback request into an ordered playlist.
//!
//! Nothing here fails. An empty catalog, an unknown id or a query with no hits
//! all resolve to an empty playlist.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::library::{Catalog, Track};

/// Structured search hint, as sent by voice assistants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFocus {
    Genre { genre: String },
    Artist { artist: String },
    Album { artist: String, album: String },
    Song { artist: String, album: String, title: String },
}

impl SearchFocus {
    /// Builds a focus from loosely typed fields. Any field the focus kind needs
    /// that is missing makes the whole focus absent.
    pub fn from_fields(
        kind: Option<&str>,
        genre: Option<String>,
        artist: Option<String>,
        album: Option<String>,
        title: Option<String>,
    ) -> Option<Self> {
        match kind? {
            "genre" => Some(SearchFocus::Genre { genre: genre? }),
            "artist" => Some(SearchFocus::Artist { artist: artist? }),
            "album" => Some(SearchFocus::Album {
                artist: artist?,
                album: album?,
            }),
            "song" | "media" => Some(SearchFocus::Song {
                artist: artist?,
                album: album?,
                title: title?,
            }),
            _ => None,
        }
    }

    fn matches(&self, track: &Track) -> bool {
        match self {
            SearchFocus::Genre { genre } => track.genre == *genre,
            SearchFocus::Artist { artist } => artist_matches(track, artist),
            SearchFocus::Album { artist, album } => artist_matches(track, artist) && track.album == *album,
            SearchFocus::Song { artist, album, title } => {
                artist_matches(track, artist) && track.album == *album && track.title == *title
            }
        }
    }
}

fn artist_matches(track: &Track, artist: &str) -> bool {
    track.artist == artist || track.album_artist == artist
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackTarget {
    ById { media_id: String },
    Search { query: String, focus: Option<SearchFocus> },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RequestFields")]
pub struct PlaybackRequest {
    pub target: PlaybackTarget,
    pub play_when_ready: bool,
    pub position_ms: u64,
}

/// Wire shape of a playback request: a media id, or a query with optional focus fields.
#[derive(Deserialize)]
struct RequestFields {
    media_id: Option<String>,
    #[serde(default)]
    query: String,
    focus: Option<String>,
    genre: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    title: Option<String>,
    #[serde(default = "default_play_when_ready")]
    play_when_ready: bool,
    #[serde(default)]
    position_ms: u64,
}

fn default_play_when_ready() -> bool {
    true
}

impl From<RequestFields> for PlaybackRequest {
    fn from(fields: RequestFields) -> Self {
        let target = match fields.media_id {
            Some(media_id) => PlaybackTarget::ById { media_id },
            None => PlaybackTarget::Search {
                query: fields.query,
                focus: SearchFocus::from_fields(
                    fields.focus.as_deref(),
                    fields.genre,
                    fields.artist,
                    fields.album,
                    fields.title,
                ),
            },
        };

        Self {
            target,
            play_when_ready: fields.play_when_ready,
            position_ms: fields.position_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackResolution {
    pub playlist: Vec<Track>,
    pub selected: Option<Track>,
    pub position_ms: u64,
    pub play_when_ready: bool,
}

impl PlaybackResolution {
    /// Index of the selected track in the playlist, 0 when there is none.
    pub fn start_index(&self) -> usize {
        self.selected
            .as_ref()
            .and_then(|selected| self.playlist.iter().position(|track| track.id == selected.id))
            .unwrap_or(0)
    }
}

/// Resolves a request against `catalog`. `rng` is only consulted for the
/// blank-query fallback, which shuffles the whole catalog.
pub fn resolve<R: Rng + ?Sized>(
    catalog: &Catalog,
    request: &PlaybackRequest,
    rng: &mut R,
) -> PlaybackResolution {
    let (playlist, selected) = match &request.target {
        PlaybackTarget::ById { media_id } => {
            let playlist = playlist_for_id(&catalog.tracks, media_id);
            let selected = playlist.first().cloned();
            (playlist, selected)
        }
        PlaybackTarget::Search { query, focus } => {
            let playlist = search(&catalog.tracks, query, focus.as_ref(), rng);
            let selected = playlist.first().cloned();
            (playlist, selected)
        }
    };

    PlaybackResolution {
        playlist,
        selected,
        position_ms: request.position_ms,
        play_when_ready: request.play_when_ready,
    }
}

/// The matched track followed by the rest of its album in catalog order.
pub fn playlist_for_id(tracks: &[Track], media_id: &str) -> Vec<Track> {
    let Some(item) = tracks.iter().find(|track| track.id == media_id) else {
        return Vec::new();
    };

    std::iter::once(item.clone())
        .chain(
            tracks
                .iter()
                .filter(|track| track.album == item.album && track.id != item.id)
                .cloned(),
        )
        .collect()
}

/// Focused search first, then free text. A blank query with no focused hits
/// returns the whole catalog shuffled. Free text is matched as given, surrounding
/// whitespace included.
pub fn search<R: Rng + ?Sized>(
    tracks: &[Track],
    query: &str,
    focus: Option<&SearchFocus>,
    rng: &mut R,
) -> Vec<Track> {
    let focused: Vec<Track> = match focus {
        Some(focus) => tracks.iter().filter(|track| focus.matches(track)).cloned().collect(),
        None => Vec::new(),
    };
    if !focused.is_empty() {
        return focused;
    }

    if query.trim().is_empty() {
        let mut shuffled = tracks.to_vec();
        shuffled.shuffle(rng);
        return shuffled;
    }

    let needle = query.to_lowercase();
    tracks
        .iter()
        .filter(|track| {
            track.title.to_lowercase().contains(&needle) || track.genre.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::indexer::group_albums;
    use crate::library::fixtures::{sample_tracks, track};
    use crate::library::CatalogState;

    fn catalog(tracks: Vec<Track>) -> Catalog {
        let albums = group_albums(&tracks);
        Catalog {
            version: 1,
            state: CatalogState::Initialized,
            tracks: Arc::new(tracks),
            albums: Arc::new(albums),
        }
    }

    fn by_id(media_id: &str) -> PlaybackRequest {
        PlaybackRequest {
            target: PlaybackTarget::ById {
                media_id: media_id.to_string(),
            },
            play_when_ready: true,
            position_ms: 0,
        }
    }

    fn by_search(query: &str, focus: Option<SearchFocus>) -> PlaybackRequest {
        PlaybackRequest {
            target: PlaybackTarget::Search {
                query: query.to_string(),
                focus,
            },
            play_when_ready: false,
            position_ms: 0,
        }
    }

    fn ids(tracks: &[Track]) -> Vec<&str> {
        tracks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn by_id_puts_match_first_then_album_in_order() {
        let mut rng = StdRng::seed_from_u64(1);
        let resolution = resolve(&catalog(sample_tracks()), &by_id("wake_up_02"), &mut rng);

        assert_eq!(ids(&resolution.playlist), vec!["wake_up_02", "wake_up_01", "wake_up_03"]);
        assert_eq!(resolution.selected.as_ref().map(|t| t.id.as_str()), Some("wake_up_02"));
        assert_eq!(resolution.start_index(), 0);
    }

    #[test]
    fn by_id_absent_is_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        let resolution = resolve(&catalog(sample_tracks()), &by_id("missing"), &mut rng);
        assert!(resolution.playlist.is_empty());
        assert!(resolution.selected.is_none());

        let resolution = resolve(&Catalog::empty(), &by_id("wake_up_01"), &mut rng);
        assert!(resolution.playlist.is_empty());
        assert!(resolution.selected.is_none());
    }

    #[test]
    fn request_options_are_carried_through() {
        let mut rng = StdRng::seed_from_u64(1);
        let request = PlaybackRequest {
            position_ms: 42_000,
            play_when_ready: false,
            ..by_id("rock_01")
        };
        let resolution = resolve(&catalog(sample_tracks()), &request, &mut rng);
        assert_eq!(resolution.position_ms, 42_000);
        assert!(!resolution.play_when_ready);
    }

    #[test]
    fn genre_focus_is_exact_and_ordered() {
        let mut tracks = sample_tracks();
        tracks.push(track("rock_02", "Thunder", "Storm", "Bolt", "Rock"));
        tracks.push(track("rock_03", "Pebble", "Storm", "Bolt", "rock"));
        let focus = SearchFocus::Genre {
            genre: "Rock".to_string(),
        };
        let mut rng = StdRng::seed_from_u64(1);

        let resolution = resolve(&catalog(tracks), &by_search("", Some(focus)), &mut rng);

        assert_eq!(ids(&resolution.playlist), vec!["rock_01", "rock_02"]);
        assert_eq!(resolution.selected.as_ref().map(|t| t.id.as_str()), Some("rock_01"));
    }

    #[test]
    fn artist_focus_matches_album_artist() {
        let mut compilation = track("comp_01", "Guest Spot", "Mixtape", "Guest", "Pop");
        compilation.album_artist = "The Amps".to_string();
        let mut tracks = sample_tracks();
        tracks.push(compilation);
        let focus = SearchFocus::Artist {
            artist: "The Amps".to_string(),
        };

        let found = search(&tracks, "", Some(&focus), &mut StdRng::seed_from_u64(1));
        assert_eq!(ids(&found), vec!["rock_01", "comp_01"]);
    }

    #[test]
    fn album_and_song_focus_require_every_field() {
        let tracks = sample_tracks();
        let mut rng = StdRng::seed_from_u64(1);

        let album = SearchFocus::Album {
            artist: "The Kyoto Connection".to_string(),
            album: "Wake Up".to_string(),
        };
        assert_eq!(
            ids(&search(&tracks, "x", Some(&album), &mut rng)),
            vec!["wake_up_01", "wake_up_02", "wake_up_03"]
        );

        let song = SearchFocus::Song {
            artist: "The Kyoto Connection".to_string(),
            album: "Wake Up".to_string(),
            title: "Geisha".to_string(),
        };
        assert_eq!(ids(&search(&tracks, "x", Some(&song), &mut rng)), vec!["wake_up_02"]);

        let wrong_artist = SearchFocus::Album {
            artist: "The Amps".to_string(),
            album: "Wake Up".to_string(),
        };
        assert!(search(&tracks, "nothing matches", Some(&wrong_artist), &mut rng).is_empty());
    }

    #[test]
    fn empty_focus_falls_back_to_free_text() {
        let focus = SearchFocus::Genre {
            genre: "Polka".to_string(),
        };
        let found = search(&sample_tracks(), "joy", Some(&focus), &mut StdRng::seed_from_u64(1));
        assert_eq!(ids(&found), vec!["ode_01"]);
    }

    #[test]
    fn free_text_matches_title_or_genre_case_insensitively() {
        let mut rng = StdRng::seed_from_u64(1);
        let tracks = sample_tracks();

        assert_eq!(ids(&search(&tracks, "joy", None, &mut rng)), vec!["ode_01"]);
        assert_eq!(ids(&search(&tracks, "JOY", None, &mut rng)), vec!["ode_01"]);
        assert_eq!(
            ids(&search(&tracks, "electro", None, &mut rng)),
            vec!["wake_up_01", "wake_up_02", "wake_up_03"]
        );
        // album and artist are not searched
        assert!(search(&tracks, "Kyoto", None, &mut rng).is_empty());
    }

    #[test]
    fn free_text_keeps_surrounding_whitespace() {
        let mut rng = StdRng::seed_from_u64(1);
        let tracks = sample_tracks();

        assert!(search(&tracks, "joy ", None, &mut rng).is_empty());
        assert_eq!(ids(&search(&tracks, "ode ", None, &mut rng)), vec!["ode_01"]);
        assert_eq!(ids(&search(&tracks, " to ", None, &mut rng)), vec!["ode_01"]);
    }

    #[test]
    fn blank_query_returns_permutation_of_catalog() {
        let tracks = sample_tracks();
        let expected: HashSet<&str> = ids(&tracks).into_iter().collect();

        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            let resolution = resolve(&catalog(tracks.clone()), &by_search("   ", None), &mut rng);

            assert_eq!(resolution.playlist.len(), 5);
            let got: HashSet<&str> = ids(&resolution.playlist).into_iter().collect();
            assert_eq!(got, expected);
            assert_eq!(resolution.selected.as_ref(), resolution.playlist.first());
        }
    }

    #[test]
    fn blank_query_on_empty_catalog_selects_nothing() {
        let resolution = resolve(&Catalog::empty(), &by_search("", None), &mut StdRng::seed_from_u64(1));
        assert!(resolution.playlist.is_empty());
        assert!(resolution.selected.is_none());
    }

    #[test]
    fn deterministic_requests_are_idempotent() {
        let catalog = catalog(sample_tracks());
        let focus = SearchFocus::Genre {
            genre: "Electronic".to_string(),
        };

        for request in [by_id("wake_up_03"), by_search("", Some(focus))] {
            let first = resolve(&catalog, &request, &mut StdRng::seed_from_u64(1));
            let second = resolve(&catalog, &request, &mut StdRng::seed_from_u64(99));
            assert_eq!(first, second);
        }
    }

    #[test]
    fn start_index_falls_back_to_zero() {
        let resolution = PlaybackResolution {
            playlist: sample_tracks(),
            selected: Some(track("elsewhere", "x", "y", "z", "w")),
            position_ms: 0,
            play_when_ready: true,
        };
        assert_eq!(resolution.start_index(), 0);

        let resolution = PlaybackResolution {
            selected: Some(sample_tracks()[3].clone()),
            ..resolution
        };
        assert_eq!(resolution.start_index(), 3);
    }

    #[test]
    fn focus_from_fields_needs_required_values() {
        assert_eq!(
            SearchFocus::from_fields(Some("genre"), Some("Rock".to_string()), None, None, None),
            Some(SearchFocus::Genre {
                genre: "Rock".to_string()
            })
        );
        assert_eq!(
            SearchFocus::from_fields(Some("album"), None, Some("The Amps".to_string()), None, None),
            None
        );
        assert_eq!(SearchFocus::from_fields(None, Some("Rock".to_string()), None, None, None), None);
        assert_eq!(SearchFocus::from_fields(Some("playlist"), None, None, None, None), None);
    }

    #[test]
    fn request_deserializes_both_shapes() {
        let by_id: PlaybackRequest = serde_json::from_str(r#"{"media_id": "rock_01", "position_ms": 500}"#).unwrap();
        assert_eq!(
            by_id.target,
            PlaybackTarget::ById {
                media_id: "rock_01".to_string()
            }
        );
        assert!(by_id.play_when_ready);
        assert_eq!(by_id.position_ms, 500);

        let focused: PlaybackRequest =
            serde_json::from_str(r#"{"query": "rock", "focus": "genre", "genre": "Rock", "play_when_ready": false}"#)
                .unwrap();
        assert_eq!(
            focused.target,
            PlaybackTarget::Search {
                query: "rock".to_string(),
                focus: Some(SearchFocus::Genre {
                    genre: "Rock".to_string()
                }),
            }
        );
        assert!(!focused.play_when_ready);
    }
}
