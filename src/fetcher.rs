use std::time::Duration;

use log::{debug, error, warn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::library::Track;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog location is not a file path: {0}")]
    BadFilePath(Url),
    #[error("failed to parse catalog document: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    music: Vec<CatalogEntry>,
}

/// One `music` element. Missing and `null` fields both fall back to defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CatalogEntry {
    id: Option<String>,
    title: Option<String>,
    album: Option<String>,
    artist: Option<String>,
    genre: Option<String>,
    source: Option<String>,
    image: Option<String>,
    track_number: Option<u32>,
    total_track_count: Option<u32>,
    /// Seconds, possibly fractional
    duration: Option<f64>,
    site: Option<String>,
}

impl CatalogEntry {
    fn into_track(self, location: &Url, base: &str) -> Track {
        let artist = self.artist.unwrap_or_default();

        Track {
            source: resolve_locator(location, base, self.source.unwrap_or_default()),
            image: resolve_locator(location, base, self.image.unwrap_or_default()),
            album_artist: artist.clone(),
            id: self.id.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            album: self.album.unwrap_or_default(),
            artist,
            genre: self.genre.unwrap_or_default(),
            track_number: self.track_number.unwrap_or_default(),
            total_track_count: self.total_track_count.unwrap_or_default(),
            duration_ms: self.duration.map_or(0, seconds_to_ms),
            site: self.site.unwrap_or_default(),
        }
    }
}

fn seconds_to_ms(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        // `as` saturates at u64::MAX
        (seconds * 1000.0).round() as u64
    } else {
        0
    }
}

/// Downloads catalog documents. Each call re-fetches; nothing is cached.
#[derive(Clone)]
pub struct CatalogFetcher {
    client: Client,
}

impl CatalogFetcher {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        Self { client }
    }

    /// Fetches and parses the catalog at `location`.
    ///
    /// Transport, status and parse failures are logged and collapse to `None`.
    pub async fn fetch(&self, location: &Url) -> Option<Vec<Track>> {
        match self.try_fetch(location).await {
            Ok(tracks) => {
                debug!("Fetched {} tracks from {}", tracks.len(), location);
                Some(tracks)
            }
            Err(e) => {
                error!("Unable to load catalog from {}: {}", location, e);
                None
            }
        }
    }

    async fn try_fetch(&self, location: &Url) -> Result<Vec<Track>, FetchError> {
        let body = if location.scheme() == "file" {
            let path = location
                .to_file_path()
                .map_err(|_| FetchError::BadFilePath(location.clone()))?;
            tokio::fs::read(path).await?
        } else {
            let response = self.client.get(location.clone()).send().await?;
            if response.status() != StatusCode::OK {
                return Err(FetchError::Status(response.status()));
            }
            response.bytes().await?.to_vec()
        };

        parse_catalog(&body, location)
    }
}

pub fn parse_catalog(body: &[u8], location: &Url) -> Result<Vec<Track>, FetchError> {
    let document: CatalogDocument = serde_json::from_slice(body)?;
    let base = base_location(location);

    Ok(document
        .music
        .into_iter()
        .map(|entry| entry.into_track(location, &base))
        .collect())
}

/// The document location with its final path segment stripped.
pub fn base_location(location: &Url) -> String {
    let mut stripped = location.clone();
    stripped.set_query(None);
    stripped.set_fragment(None);

    let full = stripped.as_str();
    let last_segment = location
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");

    full.strip_suffix(last_segment).unwrap_or(full).to_string()
}

/// Prefixes `locator` with `base` unless it already starts with the document's scheme.
pub fn resolve_locator(location: &Url, base: &str, locator: String) -> String {
    if locator.is_empty() || locator.starts_with(location.scheme()) {
        locator
    } else {
        format!("{}{}", base, locator)
    }
}
