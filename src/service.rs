//! Owner of the live catalog snapshot.
//!
//! Fetches run on spawned worker tasks. Their results come back to the single
//! writer, which indexes them and publishes a new snapshot through a watch
//! channel. Readers clone the current `Arc<Catalog>` without locking, and
//! readiness waiters are woken by the same publication.

use std::sync::{Arc, Mutex};

use log::{error, info, warn};
use tokio::sync::watch;
use tokio::task::AbortHandle;
use url::Url;

use crate::fetcher::CatalogFetcher;
use crate::indexer::{group_albums, readiness};
use crate::library::{Catalog, CatalogState};

#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<Inner>,
}

struct Inner {
    location: Url,
    fetcher: CatalogFetcher,
    snapshot: watch::Sender<Arc<Catalog>>,
    writer: tokio::sync::Mutex<()>,
    workers: Mutex<Vec<AbortHandle>>,
}

impl CatalogService {
    pub fn new(location: Url, fetcher: CatalogFetcher) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Catalog::empty()));

        Self {
            inner: Arc::new(Inner {
                location,
                fetcher,
                snapshot,
                writer: tokio::sync::Mutex::new(()),
                workers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn location(&self) -> &Url {
        &self.inner.location
    }

    pub fn snapshot(&self) -> Arc<Catalog> {
        self.inner.snapshot.borrow().clone()
    }

    /// Loads the catalog in the background and returns immediately.
    pub fn start(&self) {
        let service = self.clone();
        let handle = tokio::spawn(async move {
            service.refresh().await;
        });
        self.track_worker(handle.abort_handle());
    }

    /// Re-fetches the catalog and publishes the result. Refreshes are serialized.
    pub async fn refresh(&self) -> CatalogState {
        let _writer = self.inner.writer.lock().await;

        self.publish(|current| Catalog {
            version: current.version + 1,
            state: CatalogState::Initializing,
            tracks: current.tracks.clone(),
            albums: current.albums.clone(),
        });
        info!("Loading catalog from {}", self.inner.location);

        let fetcher = self.inner.fetcher.clone();
        let location = self.inner.location.clone();
        let worker = tokio::spawn(async move { fetcher.fetch(&location).await });
        self.track_worker(worker.abort_handle());

        let tracks = match worker.await {
            Ok(tracks) => tracks.unwrap_or_default(),
            Err(e) => {
                warn!("Catalog fetch did not complete: {}", e);
                Vec::new()
            }
        };

        let albums = group_albums(&tracks);
        let state = readiness(&albums);
        match state {
            CatalogState::Initialized => {
                info!("Catalog ready: {} tracks in {} albums", tracks.len(), albums.len())
            }
            _ => error!("Catalog unavailable: no albums found at {}", self.inner.location),
        }

        self.publish(|current| Catalog {
            version: current.version + 1,
            state,
            tracks: Arc::new(tracks),
            albums: Arc::new(albums),
        });

        state
    }

    /// Resolves once the catalog leaves `Initializing`: `true` when it is usable.
    /// Resolves immediately when a load already finished.
    pub async fn when_ready(&self) -> bool {
        let mut receiver = self.inner.snapshot.subscribe();
        let ready = match receiver.wait_for(|catalog| catalog.state.is_terminal()).await {
            Ok(catalog) => catalog.state == CatalogState::Initialized,
            Err(_) => false,
        };
        ready
    }

    /// Aborts every in-flight load together.
    pub fn shutdown(&self) {
        let workers = match self.inner.workers.lock() {
            Ok(mut workers) => std::mem::take(&mut *workers),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        info!("Stopping {} catalog workers", workers.len());
        for worker in workers {
            worker.abort();
        }
    }

    fn publish(&self, next: impl FnOnce(&Catalog) -> Catalog) {
        self.inner.snapshot.send_modify(|current| {
            *current = Arc::new(next(&**current));
        });
    }

    fn track_worker(&self, handle: AbortHandle) {
        if let Ok(mut workers) = self.inner.workers.lock() {
            workers.retain(|worker| !worker.is_finished());
            workers.push(handle);
        }
    }
}
