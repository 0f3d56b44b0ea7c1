//! Song metadata cache
//!
//! Memoizes catalog song lookups by track id with at most one in-flight
//! fetch per id: concurrent callers share the same pending future. Failed
//! lookups are evicted so the next caller retries.

use crate::catalog::{Catalog, CatalogError, Song};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

type SongFuture = Shared<BoxFuture<'static, Result<Arc<Song>, CatalogError>>>;

pub struct SongCache {
    catalog: Arc<dyn Catalog>,
    entries: Mutex<HashMap<String, SongFuture>>,
}

impl SongCache {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a song, sharing any lookup already in flight for the same id
    pub async fn get(&self, video_id: &str) -> Result<Arc<Song>, CatalogError> {
        let future = self.lookup(video_id);
        let result = future.clone().await;

        if let Err(e) = &result {
            warn!("Song lookup for {} failed: {}", video_id, e);
            self.evict_if_same(video_id, &future);
        }
        result
    }

    /// Number of cached (or pending) entries
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop a cached entry
    pub fn invalidate(&self, video_id: &str) {
        self.lock().remove(video_id);
    }

    fn lookup(&self, video_id: &str) -> SongFuture {
        let mut entries = self.lock();
        if let Some(existing) = entries.get(video_id) {
            debug!("Song cache hit for {}", video_id);
            return existing.clone();
        }

        debug!("Song cache miss for {}, fetching", video_id);
        let catalog = Arc::clone(&self.catalog);
        let id = video_id.to_string();
        let future = async move { catalog.fetch_song(&id).await.map(Arc::new) }
            .boxed()
            .shared();
        entries.insert(video_id.to_string(), future.clone());
        future
    }

    // Another caller may already have replaced the failed entry with a fresh
    // lookup; only remove the exact future that failed.
    fn evict_if_same(&self, video_id: &str, failed: &SongFuture) {
        let mut entries = self.lock();
        if entries.get(video_id).is_some_and(|f| f.ptr_eq(failed)) {
            entries.remove(video_id);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, SongFuture>> {
        // A poisoned map is still structurally valid
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
