//! Read-through cache for live TV categories and per-category channel lists.
//!
//! Entries are fresh for [`CACHE_TTL_MS`] after a successful fetch. Failed
//! fetches never touch the cache and stale data is never served on failure.
//! Misses are single-flight per key: concurrent callers for the same key wait
//! for one upstream request and then read the entry it stored.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, RwLock};

use crate::models::{Category, ChannelDetail};
use crate::services::metrics;
use crate::services::xtream::{CatalogApi, XtreamCredentials, XtreamError};

/// Freshness window for every entry (5 minutes)
pub const CACHE_TTL_MS: i64 = 5 * 60 * 1000;

/// Source of "now" in epoch milliseconds
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall clock
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A fetched value and when it was stored
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub stored_at_ms: i64,
}

impl<T> CacheEntry<T> {
    fn new(value: T, stored_at_ms: i64) -> Self {
        Self { value, stored_at_ms }
    }

    pub fn is_fresh(&self, now_ms: i64) -> bool {
        now_ms - self.stored_at_ms < CACHE_TTL_MS
    }
}

#[derive(Default)]
struct CacheState {
    categories: Option<CacheEntry<Vec<Category>>>,
    channels: HashMap<String, CacheEntry<Vec<ChannelDetail>>>,
    /// Bumped by every clear; a fetch only stores under the generation it started in
    generation: u64,
}

/// Snapshot of what the cache currently holds (for /health)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogCacheStats {
    pub categories_cached: bool,
    pub channel_entries: usize,
}

pub struct CatalogCache {
    api: Arc<dyn CatalogApi>,
    clock: Arc<dyn Clock>,
    state: RwLock<CacheState>,
    categories_fetch: Mutex<()>,
    /// One lock per category with a fetch in progress
    channel_fetches: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CatalogCache {
    pub fn new(api: Arc<dyn CatalogApi>, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            clock,
            state: RwLock::new(CacheState::default()),
            categories_fetch: Mutex::new(()),
            channel_fetches: StdMutex::new(HashMap::new()),
        }
    }

    /// Fresh categories, plus the generation they were read under
    async fn fresh_categories(&self) -> (Option<Vec<Category>>, u64) {
        let now = self.clock.now_millis();
        let state = self.state.read().await;
        let categories = state
            .categories
            .as_ref()
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.value.clone());
        (categories, state.generation)
    }

    async fn fresh_channels(&self, category_id: &str) -> (Option<Vec<ChannelDetail>>, u64) {
        let now = self.clock.now_millis();
        let state = self.state.read().await;
        let channels = state
            .channels
            .get(category_id)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.value.clone());
        (channels, state.generation)
    }

    fn fetch_locks(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<Mutex<()>>>> {
        self.channel_fetches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn acquire_fetch_lock(&self, category_id: &str) -> Arc<Mutex<()>> {
        Arc::clone(self.fetch_locks().entry(category_id.to_string()).or_default())
    }

    /// Drop the per-category lock once no other caller holds it
    fn release_fetch_lock(&self, category_id: &str, lock: &Arc<Mutex<()>>) {
        let mut locks = self.fetch_locks();
        let unused = locks
            .get(category_id)
            .is_some_and(|current| Arc::ptr_eq(current, lock) && Arc::strong_count(lock) == 2);
        if unused {
            locks.remove(category_id);
        }
    }

    /// Live categories, from memory when fresh
    pub async fn get_categories(
        &self,
        creds: &XtreamCredentials,
    ) -> Result<Vec<Category>, XtreamError> {
        if let (Some(categories), _) = self.fresh_categories().await {
            metrics::CATALOG_CACHE_HITS.with_label_values(&["categories"]).inc();
            tracing::debug!("Categories from cache ({})", categories.len());
            return Ok(categories);
        }

        let _flight = self.categories_fetch.lock().await;

        // Another caller may have filled the entry while we waited
        let (cached, generation) = self.fresh_categories().await;
        if let Some(categories) = cached {
            metrics::CATALOG_CACHE_HITS.with_label_values(&["categories"]).inc();
            return Ok(categories);
        }

        metrics::CATALOG_CACHE_MISSES.with_label_values(&["categories"]).inc();
        tracing::debug!("Fetching categories from server");

        match self.api.live_categories(creds).await {
            Ok(categories) => {
                let mut state = self.state.write().await;
                if state.generation == generation {
                    let entry = CacheEntry::new(categories.clone(), self.clock.now_millis());
                    state.categories = Some(entry);
                } else {
                    tracing::debug!("Cache cleared during fetch, categories not stored");
                }
                tracing::info!("Categories fetched: {}", categories.len());
                Ok(categories)
            }
            Err(e) => {
                tracing::error!("Failed to fetch categories: {}", e);
                Err(e)
            }
        }
    }

    /// Channels of one category, from memory when fresh
    pub async fn get_channels(
        &self,
        creds: &XtreamCredentials,
        category_id: &str,
    ) -> Result<Vec<ChannelDetail>, XtreamError> {
        if let (Some(channels), _) = self.fresh_channels(category_id).await {
            metrics::CATALOG_CACHE_HITS.with_label_values(&["channels"]).inc();
            tracing::debug!(
                "Channels from cache for category {} ({})",
                category_id,
                channels.len()
            );
            return Ok(channels);
        }

        let lock = self.acquire_fetch_lock(category_id);
        let result = {
            let _flight = lock.lock().await;
            self.fetch_channels(creds, category_id).await
        };
        self.release_fetch_lock(category_id, &lock);
        result
    }

    /// Miss path of `get_channels`; caller holds the category's fetch lock
    async fn fetch_channels(
        &self,
        creds: &XtreamCredentials,
        category_id: &str,
    ) -> Result<Vec<ChannelDetail>, XtreamError> {
        let (cached, generation) = self.fresh_channels(category_id).await;
        if let Some(channels) = cached {
            metrics::CATALOG_CACHE_HITS.with_label_values(&["channels"]).inc();
            return Ok(channels);
        }

        metrics::CATALOG_CACHE_MISSES.with_label_values(&["channels"]).inc();
        tracing::debug!("Fetching channels for category {}", category_id);

        match self.api.live_streams_by_category(creds, category_id).await {
            Ok(channels) => {
                let now = self.clock.now_millis();
                let mut state = self.state.write().await;
                if state.generation == generation {
                    state.channels.retain(|_, entry| entry.is_fresh(now));
                    state
                        .channels
                        .insert(category_id.to_string(), CacheEntry::new(channels.clone(), now));
                } else {
                    tracing::debug!(
                        "Cache cleared during fetch, channels for {} not stored",
                        category_id
                    );
                }
                tracing::info!(
                    "Channels fetched for category {}: {}",
                    category_id,
                    channels.len()
                );
                Ok(channels)
            }
            Err(e) => {
                tracing::error!("Failed to fetch channels for category {}: {}", category_id, e);
                Err(e)
            }
        }
    }

    /// Drop every entry (categories and all channel lists) in one step.
    /// Fetches already in flight finish but do not store their result.
    pub async fn clear_cache(&self) {
        let mut state = self.state.write().await;
        state.categories = None;
        state.channels.clear();
        state.generation += 1;
        self.fetch_locks().clear();
        tracing::info!("Catalog cache cleared");
    }

    pub async fn stats(&self) -> CatalogCacheStats {
        let state = self.state.read().await;
        CatalogCacheStats {
            categories_cached: state.categories.is_some(),
            channel_entries: state.channels.len(),
        }
    }

    #[cfg(test)]
    fn fetch_lock_count(&self) -> usize {
        self.fetch_locks().len()
    }
}
