use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use crate::browse::{self, MediaItem, ROOT_ID};
use crate::config::Config;
use crate::library::{CatalogState, Track};
use crate::playback::{PlaybackCoordinator, PlayerStatus, QueuePlayer};
use crate::search::{self, PlaybackRequest, PlaybackResolution, SearchFocus};
use crate::service::CatalogService;
use crate::storage::{LastPlayed, LastPlayedStore};

pub const CLIENT_ID_HEADER: &str = "x-client-id";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: CatalogService,
    pub playback: Arc<Mutex<PlaybackCoordinator>>,
    pub last_played: LastPlayedStore,
}

#[derive(Deserialize)]
pub struct BrowseQuery {
    pub parent: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub focus: Option<String>,
    pub genre: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub title: Option<String>,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub state: CatalogState,
    pub version: u64,
    pub catalog_url: String,
    pub total_tracks: usize,
    pub total_albums: usize,
}

#[derive(Deserialize)]
pub struct SwitchRequest {
    pub target: String,
}

#[derive(Deserialize)]
pub struct SeekRequest {
    pub index: usize,
    #[serde(default)]
    pub position_ms: u64,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub message: String,
    pub status: String,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/browse", get(browse))
        .route("/search", get(search_tracks))
        .route("/play", post(play))
        .route("/player", get(get_player))
        .route("/player/switch", post(switch_player))
        .route("/player/seek", post(seek_player))
        .route("/player/stop", post(stop_player))
        .route("/recent", get(get_recent))
        .route("/refresh", post(refresh_catalog))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn client_allowed(state: &AppState, headers: &HeaderMap) -> bool {
    let client_id = headers.get(CLIENT_ID_HEADER).and_then(|value| value.to_str().ok());
    let allowed = state.config.is_client_allowed(client_id);
    if !allowed {
        info!("Denying catalog access to client {:?}", client_id);
    }
    allowed
}

// GET /status - Catalog readiness and counts
async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let catalog = state.catalog.snapshot();

    Json(StatusResponse {
        state: catalog.state,
        version: catalog.version,
        catalog_url: state.catalog.location().to_string(),
        total_tracks: catalog.tracks.len(),
        total_albums: catalog.albums.len(),
    })
}

// GET /browse?parent=<id> - Children of a browse node, once the catalog is ready
async fn browse(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<BrowseQuery>,
) -> Json<Vec<MediaItem>> {
    if !client_allowed(&state, &headers) {
        return Json(Vec::new());
    }

    let parent = params.parent.unwrap_or_else(|| ROOT_ID.to_string());
    if !state.catalog.when_ready().await {
        debug!("Browse {} on an unavailable catalog", parent);
        return Json(Vec::new());
    }

    let recent = state.last_played.load().await;
    let catalog = state.catalog.snapshot();
    Json(browse::children(&catalog, &parent, recent.as_ref()))
}

// GET /search - Focused search with free text fallback
async fn search_tracks(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SearchQuery>,
) -> Json<Vec<Track>> {
    if !client_allowed(&state, &headers) || !state.catalog.when_ready().await {
        return Json(Vec::new());
    }

    let focus = SearchFocus::from_fields(
        params.focus.as_deref(),
        params.genre,
        params.artist,
        params.album,
        params.title,
    );
    let query = params.q.unwrap_or_default();
    let catalog = state.catalog.snapshot();

    let tracks = {
        let mut rng = rand::thread_rng();
        search::search(&catalog.tracks, &query, focus.as_ref(), &mut rng)
    };
    Json(tracks)
}

// POST /play - Resolve a request and hand the playlist to the active player
async fn play(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<PlaybackRequest>,
) -> Result<Json<PlaybackResolution>, StatusCode> {
    if !client_allowed(&state, &headers) {
        return Err(StatusCode::FORBIDDEN);
    }

    state.catalog.when_ready().await;
    let catalog = state.catalog.snapshot();
    let resolution = {
        let mut rng = rand::thread_rng();
        search::resolve(&catalog, &request, &mut rng)
    };

    info!(
        "Resolved playback request to {} tracks starting at {:?}",
        resolution.playlist.len(),
        resolution.selected.as_ref().map(|track| track.id.as_str())
    );

    state.playback.lock().await.prepare(resolution.clone()).await;
    Ok(Json(resolution))
}

// GET /player - Active player state
async fn get_player(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PlayerStatus>, StatusCode> {
    if !client_allowed(&state, &headers) {
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(Json(state.playback.lock().await.status()))
}

// POST /player/switch - Hand playback over to another player
async fn switch_player(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SwitchRequest>,
) -> Result<Json<PlayerStatus>, StatusCode> {
    if !client_allowed(&state, &headers) {
        return Err(StatusCode::FORBIDDEN);
    }
    if request.target != "local" && request.target != "cast" {
        return Err(StatusCode::BAD_REQUEST);
    }

    let mut playback = state.playback.lock().await;
    if playback.player_name() != request.target {
        playback.switch_to(Box::new(QueuePlayer::new(request.target))).await;
    }
    Ok(Json(playback.status()))
}

// POST /player/seek - Move within the current playlist
async fn seek_player(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SeekRequest>,
) -> Result<Json<PlayerStatus>, StatusCode> {
    if !client_allowed(&state, &headers) {
        return Err(StatusCode::FORBIDDEN);
    }

    let mut playback = state.playback.lock().await;
    playback.seek(request.index, request.position_ms).await;
    Ok(Json(playback.status()))
}

// POST /player/stop - Stop playback, remembering the current item
async fn stop_player(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PlayerStatus>, StatusCode> {
    if !client_allowed(&state, &headers) {
        return Err(StatusCode::FORBIDDEN);
    }

    let mut playback = state.playback.lock().await;
    playback.stop().await;
    Ok(Json(playback.status()))
}

// GET /recent - Last played item for resumption
async fn get_recent(State(state): State<AppState>) -> Result<Json<LastPlayed>, StatusCode> {
    match state.last_played.load().await {
        Some(last) => Ok(Json(last)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

// POST /refresh - Reload the catalog in the background
async fn refresh_catalog(State(state): State<AppState>) -> Json<RefreshResponse> {
    state.catalog.start();

    Json(RefreshResponse {
        message: "Catalog reload initiated".to_string(),
        status: "success".to_string(),
    })
}
