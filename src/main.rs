use std::sync::Arc;

use log::{info, warn};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::api::AppState;
use crate::config::Config;
use crate::fetcher::CatalogFetcher;
use crate::playback::{PlaybackCoordinator, QueuePlayer};
use crate::service::CatalogService;
use crate::storage::LastPlayedStore;

mod api;
mod browse;
mod config;
mod fetcher;
mod indexer;
mod library;
mod logger;
mod playback;
mod search;
mod service;
mod storage;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let config = Config::from_env();
    logger::init(config.log_level)?;

    let catalog = CatalogService::new(config.catalog_url.clone(), CatalogFetcher::new(config.fetch_timeout));
    catalog.start();

    let last_played = LastPlayedStore::new(config.last_played_path.clone());
    match last_played.load().await {
        Some(last) => info!("Last played: {} at {}ms", last.media_id, last.position_ms),
        None => info!("Nothing played yet, recent items go to {}", last_played.path().display()),
    }
    let playback = PlaybackCoordinator::new(Box::new(QueuePlayer::new("local")), Some(last_played.clone()));

    let bind_address = config.bind_address();
    let state = AppState {
        config: Arc::new(config),
        catalog: catalog.clone(),
        playback: Arc::new(Mutex::new(playback)),
        last_played,
    };
    let app = api::create_router(state);

    let listener = TcpListener::bind(&bind_address).await?;
    info!("Listening on {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Unable to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    catalog.shutdown();
    info!("Shut down");
    Ok(())
}
