use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::library::Track;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The most recently played item, kept so playback can resume after a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastPlayed {
    pub media_id: String,
    pub title: String,
    pub subtitle: String,
    pub icon_uri: String,
    pub position_ms: u64,
    pub saved_at: DateTime<Utc>,
}

impl LastPlayed {
    pub fn from_track(track: &Track, position_ms: u64) -> Self {
        Self {
            media_id: track.id.clone(),
            title: track.title.clone(),
            subtitle: track.artist.clone(),
            icon_uri: track.image.clone(),
            position_ms,
            saved_at: Utc::now(),
        }
    }
}

/// JSON file holding a single [`LastPlayed`] record.
#[derive(Debug, Clone)]
pub struct LastPlayedStore {
    path: PathBuf,
}

impl LastPlayedStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn save(&self, last: &LastPlayed) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(last)?;
        tokio::fs::write(&self.path, json).await?;
        debug!("Saved last played {} at {}ms", last.media_id, last.position_ms);
        Ok(())
    }

    /// `None` when nothing was saved yet or the file cannot be read back.
    pub async fn load(&self) -> Option<LastPlayed> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Unable to read {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(last) => Some(last),
            Err(e) => {
                warn!("Ignoring corrupt last played file {}: {}", self.path.display(), e);
                None
            }
        }
    }
}
