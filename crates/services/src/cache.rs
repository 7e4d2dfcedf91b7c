//! Key/value cache for collaborator data.
//!
//! Values are JSON so any serializable payload fits. A miss, an expired entry
//! and a disabled cache all look the same to callers.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tipster_ml::RatingSystem;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub default_ttl_hours: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true, default_ttl_hours: 24 }
    }
}

pub trait Cache: Send + Sync {
    /// Entry younger than the cache's default TTL.
    fn get(&self, key: &str) -> Option<Value>;
    /// Entry younger than `max_age`, overriding the default TTL.
    fn get_within(&self, key: &str, max_age: Duration) -> Option<Value>;
    fn set(&self, key: &str, value: Value) -> bool;
    fn delete(&self, key: &str) -> bool;
    /// Removes everything and returns how many entries were dropped.
    fn clear(&self) -> usize;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    stored_at: DateTime<Utc>,
    value: Value,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub expired: usize,
}

/// In-memory cache with a per-read expiry check.
#[derive(Debug)]
pub struct ExpiringCache {
    entries: DashMap<String, CacheEntry>,
    default_ttl: Duration,
}

impl ExpiringCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self { entries: DashMap::new(), default_ttl }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(Duration::hours(config.default_ttl_hours))
    }

    /// Stores a value with an explicit timestamp.
    pub fn insert_at(&self, key: &str, value: Value, stored_at: DateTime<Utc>) {
        self.entries.insert(key.to_string(), CacheEntry { stored_at, value });
    }

    fn lookup(&self, key: &str, max_age: Duration, now: DateTime<Utc>) -> Option<Value> {
        let entry = self.entries.get(key)?;
        if now - entry.stored_at > max_age {
            drop(entry);
            self.entries.remove(key);
            debug!("Cache expired: {}", key);
            return None;
        }
        debug!("Cache hit: {}", key);
        Some(entry.value.clone())
    }

    pub fn stats(&self) -> CacheStats {
        let now = Utc::now();
        let expired = self
            .entries
            .iter()
            .filter(|entry| now - entry.stored_at > self.default_ttl)
            .count();
        CacheStats { entries: self.entries.len(), expired }
    }
}

impl Default for ExpiringCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

impl Cache for ExpiringCache {
    fn get(&self, key: &str) -> Option<Value> {
        self.lookup(key, self.default_ttl, Utc::now())
    }

    fn get_within(&self, key: &str, max_age: Duration) -> Option<Value> {
        self.lookup(key, max_age, Utc::now())
    }

    fn set(&self, key: &str, value: Value) -> bool {
        self.insert_at(key, value, Utc::now());
        true
    }

    fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    fn clear(&self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }
}

/// Always misses; stands in when caching is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl Cache for NoCache {
    fn get(&self, _key: &str) -> Option<Value> {
        None
    }

    fn get_within(&self, _key: &str, _max_age: Duration) -> Option<Value> {
        None
    }

    fn set(&self, _key: &str, _value: Value) -> bool {
        false
    }

    fn delete(&self, _key: &str) -> bool {
        false
    }

    fn clear(&self) -> usize {
        0
    }
}

pub fn build_cache(config: &CacheConfig) -> Arc<dyn Cache> {
    if config.enabled {
        Arc::new(ExpiringCache::from_config(config))
    } else {
        Arc::new(NoCache)
    }
}

/// Typed read; an entry that no longer deserializes counts as a miss.
pub fn get_typed<T: DeserializeOwned>(cache: &dyn Cache, key: &str) -> Option<T> {
    let value = cache.get(key)?;
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("Discarding unreadable cache entry {}: {}", key, e);
            None
        }
    }
}

pub fn set_typed<T: Serialize>(cache: &dyn Cache, key: &str, value: &T) -> bool {
    match serde_json::to_value(value) {
        Ok(json) => cache.set(key, json),
        Err(e) => {
            warn!("Could not serialize cache entry {}: {}", key, e);
            false
        }
    }
}

pub fn save_ratings(cache: &dyn Cache, key: &str, ratings: &RatingSystem) -> bool {
    set_typed(cache, key, ratings.ratings())
}

/// Replaces the current ratings with the cached ones. Returns `false` and leaves
/// the system untouched on a miss.
pub fn load_ratings(cache: &dyn Cache, key: &str, ratings: &mut RatingSystem) -> bool {
    match get_typed(cache, key) {
        Some(stored) => {
            ratings.reset(stored);
            true
        }
        None => false,
    }
}
