//! Playback coordination over interchangeable players.
//!
//! The coordinator owns the current playlist and hands it to whichever player is
//! active. Rendering, buffering and device handshakes live behind [`Player`].

use log::{debug, info, warn};
use serde::Serialize;

use crate::library::Track;
use crate::search::PlaybackResolution;
use crate::storage::{LastPlayed, LastPlayedStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    Idle,
    Ready,
    Ended,
}

pub trait Player: Send {
    fn name(&self) -> &str;
    fn set_playlist(&mut self, tracks: Vec<Track>, start_index: usize, position_ms: u64);
    fn set_play_when_ready(&mut self, play_when_ready: bool);
    fn play_when_ready(&self) -> bool;
    fn state(&self) -> PlayerState;
    fn current_index(&self) -> usize;
    fn position_ms(&self) -> u64;
    fn seek(&mut self, index: usize, position_ms: u64);
    fn stop(&mut self);
}

/// In-memory player that records what it was asked to play.
#[derive(Debug)]
pub struct QueuePlayer {
    name: String,
    tracks: Vec<Track>,
    index: usize,
    position_ms: u64,
    play_when_ready: bool,
    state: PlayerState,
}

impl QueuePlayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tracks: Vec::new(),
            index: 0,
            position_ms: 0,
            play_when_ready: false,
            state: PlayerState::Idle,
        }
    }
}

impl Player for QueuePlayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_playlist(&mut self, tracks: Vec<Track>, start_index: usize, position_ms: u64) {
        self.index = start_index.min(tracks.len().saturating_sub(1));
        self.tracks = tracks;
        self.position_ms = position_ms;
        self.state = if self.tracks.is_empty() {
            PlayerState::Idle
        } else {
            PlayerState::Ready
        };
    }

    fn set_play_when_ready(&mut self, play_when_ready: bool) {
        self.play_when_ready = play_when_ready;
    }

    fn play_when_ready(&self) -> bool {
        self.play_when_ready
    }

    fn state(&self) -> PlayerState {
        self.state
    }

    fn current_index(&self) -> usize {
        self.index
    }

    fn position_ms(&self) -> u64 {
        self.position_ms
    }

    /// Past the end of the playlist the player is Ended.
    fn seek(&mut self, index: usize, position_ms: u64) {
        if self.state == PlayerState::Idle {
            return;
        }
        if index >= self.tracks.len() {
            self.state = PlayerState::Ended;
            return;
        }
        self.index = index;
        self.position_ms = position_ms;
    }

    fn stop(&mut self) {
        self.tracks.clear();
        self.index = 0;
        self.position_ms = 0;
        self.state = PlayerState::Idle;
    }
}

#[derive(Debug, Serialize)]
pub struct PlayerStatus {
    pub player: String,
    pub state: PlayerState,
    pub playlist: Vec<String>,
    pub current_index: usize,
    pub position_ms: u64,
    pub play_when_ready: bool,
}

pub struct PlaybackCoordinator {
    player: Box<dyn Player>,
    playlist: Vec<Track>,
    store: Option<LastPlayedStore>,
}

impl PlaybackCoordinator {
    pub fn new(player: Box<dyn Player>, store: Option<LastPlayedStore>) -> Self {
        Self {
            player,
            playlist: Vec::new(),
            store,
        }
    }

    pub fn player_name(&self) -> &str {
        self.player.name()
    }

    pub fn status(&self) -> PlayerStatus {
        PlayerStatus {
            player: self.player.name().to_string(),
            state: self.player.state(),
            playlist: self.playlist.iter().map(|track| track.id.clone()).collect(),
            current_index: self.player.current_index(),
            position_ms: self.player.position_ms(),
            play_when_ready: self.player.play_when_ready(),
        }
    }

    /// Hands a resolved playlist to the active player. Empty playlists are ignored.
    pub async fn prepare(&mut self, resolution: PlaybackResolution) {
        if resolution.playlist.is_empty() {
            warn!("Nothing to play: resolution produced an empty playlist");
            return;
        }

        let start_index = resolution.start_index();
        self.load(
            resolution.playlist,
            start_index,
            resolution.position_ms,
            resolution.play_when_ready,
        );
        self.save_recent().await;
    }

    /// Makes `next` the active player, re-priming it with the current playlist
    /// and the previous player's position. Returns the player that was replaced.
    pub async fn switch_to(&mut self, next: Box<dyn Player>) -> Box<dyn Player> {
        let mut previous = std::mem::replace(&mut self.player, next);
        info!("Switching playback from {} to {}", previous.name(), self.player.name());

        let previous_state = previous.state();
        if self.playlist.is_empty() {
            self.player.stop();
        } else if previous_state != PlayerState::Idle && previous_state != PlayerState::Ended {
            let playlist = self.playlist.clone();
            let index = previous.current_index().min(playlist.len() - 1);
            self.load(playlist, index, previous.position_ms(), previous.play_when_ready());
        }

        self.save_recent().await;
        previous.stop();
        previous
    }

    /// Moves the active player within the current playlist and remembers the new spot.
    pub async fn seek(&mut self, index: usize, position_ms: u64) {
        self.player.seek(index, position_ms);
        self.save_recent().await;
    }

    pub async fn stop(&mut self) {
        self.save_recent().await;
        self.player.stop();
    }

    fn load(&mut self, playlist: Vec<Track>, start_index: usize, position_ms: u64, play_when_ready: bool) {
        debug!(
            "Preparing {} tracks on {} from index {} at {}ms",
            playlist.len(),
            self.player.name(),
            start_index,
            position_ms
        );
        self.playlist = playlist.clone();
        self.player.set_play_when_ready(play_when_ready);
        self.player.stop();
        self.player.set_playlist(playlist, start_index, position_ms);
    }

    async fn save_recent(&mut self) {
        let Some(last) = self.recent_item() else {
            return;
        };
        if let Some(store) = &self.store {
            if let Err(e) = store.save(&last).await {
                warn!("Unable to save last played item: {}", e);
            }
        }
    }

    fn recent_item(&self) -> Option<LastPlayed> {
        self.store.as_ref()?;
        if self.player.state() == PlayerState::Idle {
            return None;
        }
        let track = self.playlist.get(self.player.current_index())?;
        Some(LastPlayed::from_track(track, self.player.position_ms()))
    }
}
