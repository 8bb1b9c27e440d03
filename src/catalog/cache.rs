//! Owned in-memory snapshot of the catalog.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use super::{CatalogError, CatalogSource, SongRecord};

/// Immutable view of the catalog shared across requests.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    songs: Arc<[SongRecord]>,
    loaded_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    #[must_use]
    pub fn songs(&self) -> &[SongRecord] {
        &self.songs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    #[must_use]
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

/// Catalog cache with an explicit load/invalidate lifecycle. Nothing refreshes
/// it on a timer.
pub struct CatalogCache {
    source: Arc<dyn CatalogSource>,
    row_limit: Option<u32>,
    state: RwLock<Option<CatalogSnapshot>>,
    // Serializes fetches so concurrent first reads hit the source once.
    load_mutex: Mutex<()>,
}

impl std::fmt::Debug for CatalogCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogCache")
            .field("row_limit", &self.row_limit)
            .finish_non_exhaustive()
    }
}

impl CatalogCache {
    #[must_use]
    pub fn new(source: Arc<dyn CatalogSource>, row_limit: Option<u32>) -> Self {
        Self {
            source,
            row_limit,
            state: RwLock::new(None),
            load_mutex: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn source(&self) -> &Arc<dyn CatalogSource> {
        &self.source
    }

    /// Fetches from the source and replaces the cached snapshot.
    ///
    /// # Errors
    /// Propagates the source error; the previous snapshot, if any, is kept.
    pub async fn load(&self) -> Result<CatalogSnapshot, CatalogError> {
        let _guard = self.load_mutex.lock().await;
        self.fetch_and_store().await
    }

    /// The cached snapshot, loading it first if the cache is empty.
    ///
    /// # Errors
    /// Propagates the source error when a load was needed and failed.
    pub async fn snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        if let Some(snapshot) = self.state.read().await.as_ref() {
            return Ok(snapshot.clone());
        }

        let _guard = self.load_mutex.lock().await;
        // Another task may have loaded while we waited.
        if let Some(snapshot) = self.state.read().await.as_ref() {
            return Ok(snapshot.clone());
        }
        self.fetch_and_store().await
    }

    /// Drops the snapshot; the next `snapshot()` reloads.
    pub async fn invalidate(&self) {
        let mut guard = self.state.write().await;
        if guard.take().is_some() {
            info!("catalog snapshot invalidated");
        }
    }

    pub async fn is_loaded(&self) -> bool {
        self.state.read().await.is_some()
    }

    pub async fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.state
            .read()
            .await
            .as_ref()
            .map(CatalogSnapshot::loaded_at)
    }

    async fn fetch_and_store(&self) -> Result<CatalogSnapshot, CatalogError> {
        let songs = self.source.fetch_songs(self.row_limit).await?;
        let snapshot = CatalogSnapshot {
            songs: songs.into(),
            loaded_at: Utc::now(),
        };
        info!(
            songs = snapshot.len(),
            row_limit = ?self.row_limit,
            "catalog snapshot loaded"
        );
        *self.state.write().await = Some(snapshot.clone());
        Ok(snapshot)
    }
}
