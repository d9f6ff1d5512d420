//! Caching of resolved configurations
//!
//! Entries are keyed by the identity of the layer set they were computed from
//! plus the normalized file path. Only successful resolutions are stored, and
//! entries are never updated in place: when the cache overflows or the layer
//! set changes, it is cleared as a whole.

use crate::effective::EffectiveConfig;
use dashmap::DashMap;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Default number of resolved files kept before the cache is cleared
pub const DEFAULT_CAPACITY: usize = 4096;

/// Trait for cache implementations
pub trait Cache<K, V> {
    /// Get a value from the cache
    fn get(&self, key: &K) -> Option<V>;

    /// Insert a value into the cache
    fn insert(&self, key: K, value: V);

    /// Clear all entries from the cache
    fn clear(&self);

    /// Get the current size of the cache
    fn len(&self) -> usize;

    /// Check if the cache is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Concurrent map that evicts everything once it grows past its capacity
pub struct BoundedCache<K, V> {
    entries: DashMap<K, V>,
    capacity: usize,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<K, V> Cache<K, V> for BoundedCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn insert(&self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            tracing::debug!("Cache reached {} entries, evicting", self.capacity);
            self.entries.clear();
        }
        // A concurrent insert for the same key holds an identical value
        self.entries.insert(key, value);
    }

    fn clear(&self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Identity of the layer set a resolution was computed from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigIdentity {
    root: String,
    generation: u64,
}

impl ConfigIdentity {
    pub fn new(root: impl Into<String>, generation: u64) -> Self {
        Self {
            root: root.into(),
            generation,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    identity: ConfigIdentity,
    path: PathBuf,
}

/// Read-through cache of effective configurations
pub struct ResolutionCache {
    cache: BoundedCache<CacheKey, Arc<EffectiveConfig>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A capacity of zero disables caching
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache: BoundedCache::new(capacity),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, identity: &ConfigIdentity, path: &Path) -> Option<Arc<EffectiveConfig>> {
        let key = CacheKey {
            identity: identity.clone(),
            path: path.to_path_buf(),
        };
        let found = self.cache.get(&key);
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    pub fn insert(&self, identity: ConfigIdentity, path: PathBuf, config: Arc<EffectiveConfig>) {
        self.cache.insert(CacheKey { identity, path }, config);
    }

    /// Drop every entry; statistics are kept
    pub fn invalidate_all(&self) {
        self.cache.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.cache.len(),
            capacity: self.cache.capacity(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Get the cache utilization as a percentage
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            (self.size as f64 / self.capacity as f64) * 100.0
        }
    }

    /// Share of lookups answered from the cache, as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}
