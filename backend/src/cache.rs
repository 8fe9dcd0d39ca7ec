//! In-process TTL cache for reference data
//!
//! Activity categories, activity types and the food catalog change only
//! through admin endpoints and the seeder, which invalidate them here.

use fittrack_shared::types::{
    ActivityCategoryResponse, ActivityTypeResponse, ConsumableItemSummary,
};
use mini_moka::sync::Cache;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Named cache with a fixed time-to-live
///
/// Every invalidation bumps a generation counter. A loader that started
/// before an invalidation still returns its value, but it is not stored.
#[derive(Clone)]
pub struct TtlCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    name: &'static str,
    inner: Cache<K, V>,
    generation: Arc<Mutex<u64>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str, max_capacity: u64, ttl: Duration) -> Self {
        Self {
            name,
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
            generation: Arc::new(Mutex::new(0)),
        }
    }

    fn current_generation(&self) -> u64 {
        *self.generation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key)
    }

    pub fn insert(&self, key: K, value: V) {
        self.inner.insert(key, value);
    }

    /// Cached value, or the loader's result which is then cached
    ///
    /// Loader errors are returned as-is and nothing is stored.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, loader: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.inner.get(&key) {
            metrics::counter!("fittrack_cache_hits_total", "cache" => self.name).increment(1);
            return Ok(value);
        }

        metrics::counter!("fittrack_cache_misses_total", "cache" => self.name).increment(1);
        debug!(cache = self.name, "cache miss");

        let started = self.current_generation();
        let value = loader().await?;

        let generation = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
        if *generation == started {
            self.inner.insert(key, value.clone());
        } else {
            debug!(cache = self.name, "discarding value loaded before invalidation");
        }
        Ok(value)
    }

    pub fn invalidate(&self, key: &K) {
        let mut generation = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
        *generation += 1;
        self.inner.invalidate(key);
    }

    /// Remove every entry now
    ///
    /// Keys are removed one by one: mini-moka's own `invalidate_all` is
    /// lazy and can also hide an entry inserted right after it.
    pub fn invalidate_all(&self) {
        let mut generation = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
        *generation += 1;
        let keys: Vec<K> = self.inner.iter().map(|entry| entry.key().clone()).collect();
        for key in &keys {
            self.inner.invalidate(key);
        }
    }
}

pub type CategoryList = Arc<Vec<ActivityCategoryResponse>>;
pub type ActivityTypeList = Arc<Vec<ActivityTypeResponse>>;
pub type ItemCatalog = Arc<Vec<ConsumableItemSummary>>;

/// Caches for the lists every client asks for
#[derive(Clone)]
pub struct CatalogCache {
    pub categories: TtlCache<(), CategoryList>,
    /// Keyed by the optional category filter
    pub activity_types: TtlCache<Option<Uuid>, ActivityTypeList>,
    pub items: TtlCache<(), ItemCatalog>,
}

impl CatalogCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            categories: TtlCache::new("activity_categories", 1, ttl),
            activity_types: TtlCache::new("activity_types", max_capacity, ttl),
            items: TtlCache::new("consumable_items", 1, ttl),
        }
    }

    /// Drop categories and every activity type list
    pub fn invalidate_activities(&self) {
        self.categories.invalidate_all();
        self.activity_types.invalidate_all();
    }

    pub fn invalidate_items(&self) {
        self.items.invalidate_all();
    }

    pub fn invalidate_all(&self) {
        self.invalidate_activities();
        self.invalidate_items();
    }
}
