//! LRU Cache Module
//!
//! Main cache engine: JSON values over a `Store`, with an eviction pass after
//! every set and a recency touch on every get.
//!
//! The upsert and the eviction pass that follows it are separate statements.
//! With several handles writing to one file, a pass from one handle can evict
//! a row another handle has just touched, and a pass can compute its boundary
//! from rows another writer is replacing at the same moment.

use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::eviction::evict;
use crate::cache::{CacheEntry, CacheStats, Clock, SqliteStore, Store, SystemClock, WriteOp};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == LRU Cache ==
/// Capacity-bounded cache over a shared store.
pub struct LruCache<S = SqliteStore> {
    store: S,
    capacity: usize,
    clock: Arc<dyn Clock>,
    stats: CacheStats,
}

impl LruCache<SqliteStore> {
    /// Opens (or creates) the cache file at `path`.
    pub fn open(path: impl AsRef<Path>, capacity: usize) -> Result<Self> {
        Ok(Self::with_store(SqliteStore::open(path)?, capacity))
    }

    /// Opens the cache described by `config`.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        let store = SqliteStore::open_with_timeout(&config.path, config.busy_timeout)?;
        Ok(Self::with_store(store, config.capacity))
    }
}

impl<S: Store> LruCache<S> {
    // == Constructor ==
    /// Creates a cache over `store` that keeps `capacity` entries.
    pub fn with_store(store: S, capacity: usize) -> Self {
        Self {
            store,
            capacity,
            clock: Arc::new(SystemClock),
            stats: CacheStats::new(),
        }
    }

    // == With Clock ==
    /// Replaces the time source used for `last_access`.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    // == Get ==
    /// Retrieves and decodes the value for `key`, marking it most recently used.
    ///
    /// The touch is written before the payload is decoded, so a read refreshes
    /// the entry even when decoding fails.
    pub fn get<V: DeserializeOwned>(&mut self, key: &str) -> Result<V> {
        let Some(entry) = self.store.read_row(key)? else {
            self.stats.record_miss();
            return Err(CacheError::NotFound(key.to_string()));
        };

        self.store.execute_write(&WriteOp::Touch {
            key: entry.key,
            last_access: self.clock.now(),
        })?;

        let value = serde_json::from_str(&entry.value).map_err(|source| CacheError::Decode {
            key: key.to_string(),
            source,
        })?;
        self.stats.record_hit();
        Ok(value)
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any previous value, then evicts
    /// entries ranked beyond the capacity.
    pub fn set<V: Serialize + ?Sized>(&mut self, key: &str, value: &V) -> Result<()> {
        let payload = serde_json::to_string(value).map_err(CacheError::Encode)?;
        let entry = CacheEntry::new(key, payload, self.clock.now());
        self.store.execute_write(&WriteOp::Upsert(entry))?;

        let evicted = evict(&mut self.store, self.capacity)?;
        self.stats.record_evictions(evicted);
        Ok(())
    }

    // == Remove ==
    /// Deletes `key`. Returns whether it was present.
    pub fn remove(&mut self, key: &str) -> Result<bool> {
        let removed = self.store.execute_write(&WriteOp::Delete(key.to_string()))?;
        Ok(removed > 0)
    }

    // == Contains ==
    /// Checks for `key` without touching it.
    pub fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.store.read_row(key)?.is_some())
    }

    // == Length ==
    /// Returns the number of entries currently in the table.
    pub fn len(&self) -> Result<usize> {
        self.store.len()
    }

    // == Is Empty ==
    /// Returns true if the table holds no entries.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.store.len()? == 0)
    }

    // == Capacity ==
    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Stats ==
    /// Returns this handle's counters with the current resident count.
    pub fn stats(&self) -> Result<CacheStats> {
        let mut stats = self.stats.clone();
        stats.set_resident_entries(self.store.len()?);
        Ok(stats)
    }

    // == Store Access ==
    /// Borrows the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutably borrows the underlying store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for LruCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruCache")
            .field("store", &self.store)
            .field("capacity", &self.capacity)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryStore, StepClock};
    use serde::Deserialize;

    fn memory_cache(capacity: usize) -> LruCache<MemoryStore> {
        LruCache::with_store(MemoryStore::new(), capacity).with_clock(StepClock::starting_now(1_000))
    }

    #[test]
    fn test_set_and_get() {
        let mut cache = memory_cache(10);

        cache.set("key1", "value1").unwrap();
        let value: String = cache.get("key1").unwrap();

        assert_eq!(value, "value1");
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn test_structured_values() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Point {
            x: i32,
            y: i32,
        }

        let mut cache = memory_cache(10);
        cache.set("p", &Point { x: 1, y: -2 }).unwrap();
        cache.set("list", &vec!["object"]).unwrap();

        assert_eq!(cache.get::<Point>("p").unwrap(), Point { x: 1, y: -2 });
        assert_eq!(cache.get::<Vec<String>>("list").unwrap(), vec!["object"]);
    }

    #[test]
    fn test_get_nonexistent() {
        let mut cache = memory_cache(10);

        let result = cache.get::<String>("nonexistent");
        assert!(matches!(result, Err(CacheError::NotFound(key)) if key == "nonexistent"));
    }

    #[test]
    fn test_overwrite() {
        let mut cache = memory_cache(10);

        cache.set("key1", "value1").unwrap();
        cache.set("key1", "value2").unwrap();

        assert_eq!(cache.get::<String>("key1").unwrap(), "value2");
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn test_overwrite_refreshes_recency() {
        let mut cache = memory_cache(2);

        cache.set("a", &1).unwrap();
        cache.set("b", &2).unwrap();
        cache.set("a", &3).unwrap();
        cache.set("c", &4).unwrap();

        assert!(cache.contains("a").unwrap());
        assert!(!cache.contains("b").unwrap());
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = memory_cache(3);

        cache.set("key1", "value1").unwrap();
        cache.set("key2", "value2").unwrap();
        cache.set("key3", "value3").unwrap();
        cache.set("key4", "value4").unwrap();

        assert_eq!(cache.len().unwrap(), 3);
        assert!(matches!(
            cache.get::<String>("key1"),
            Err(CacheError::NotFound(_))
        ));
        assert!(cache.get::<String>("key2").is_ok());
        assert!(cache.get::<String>("key4").is_ok());
    }

    #[test]
    fn test_touch_on_get() {
        let mut cache = memory_cache(3);

        cache.set("key1", "value1").unwrap();
        cache.set("key2", "value2").unwrap();
        cache.set("key3", "value3").unwrap();

        // key1 becomes most recently used
        cache.get::<String>("key1").unwrap();

        cache.set("key4", "value4").unwrap();

        assert!(cache.contains("key1").unwrap());
        assert!(!cache.contains("key2").unwrap());
    }

    #[test]
    fn test_contains_does_not_touch() {
        let mut cache = memory_cache(2);

        cache.set("a", &1).unwrap();
        cache.set("b", &2).unwrap();
        assert!(cache.contains("a").unwrap());
        cache.set("c", &3).unwrap();

        assert!(!cache.contains("a").unwrap());
    }

    #[test]
    fn test_ties_at_boundary_survive() {
        let mut cache =
            LruCache::with_store(MemoryStore::new(), 2).with_clock(StepClock::starting_now(0));

        for i in 0..5 {
            cache.set(&i.to_string(), &i).unwrap();
        }

        assert_eq!(cache.len().unwrap(), 5);
        assert_eq!(cache.stats().unwrap().evictions, 0);
    }

    #[test]
    fn test_remove() {
        let mut cache = memory_cache(10);

        cache.set("key1", "value1").unwrap();
        assert!(cache.remove("key1").unwrap());
        assert!(!cache.remove("key1").unwrap());
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn test_decode_failure_is_surfaced() {
        let mut cache = memory_cache(10);
        cache.set("key1", "not a number").unwrap();

        let result = cache.get::<u64>("key1");
        assert!(matches!(result, Err(CacheError::Decode { key, .. }) if key == "key1"));
        assert_eq!(cache.stats().unwrap().hits, 0);
    }

    #[test]
    fn test_decode_failure_still_touches() {
        let mut cache = memory_cache(10);
        cache.set("key1", "text").unwrap();
        let before = cache.store().read_row("key1").unwrap().unwrap().last_access;

        assert!(cache.get::<u64>("key1").is_err());

        let after = cache.store().read_row("key1").unwrap().unwrap().last_access;
        assert!(after > before);
    }

    #[test]
    fn test_failed_decode_keeps_entry_recent() {
        let mut cache = memory_cache(2);
        cache.set("a", "text").unwrap();
        cache.set("b", &1).unwrap();

        assert!(matches!(
            cache.get::<u64>("a"),
            Err(CacheError::Decode { .. })
        ));
        cache.set("c", &2).unwrap();

        assert!(cache.contains("a").unwrap());
        assert!(!cache.contains("b").unwrap());
    }

    #[test]
    fn test_contended_write_retried_transparently() {
        let mut cache = memory_cache(10);
        cache.store_mut().contend_next_writes(1);

        cache.set("key1", "value1").unwrap();

        assert_eq!(cache.store().reconnects(), 1);
        assert_eq!(cache.get::<String>("key1").unwrap(), "value1");
    }

    #[test]
    fn test_contended_touch_surfaces_fatal() {
        let mut cache = memory_cache(10);
        cache.set("key1", "value1").unwrap();
        cache.store_mut().contend_next_writes(2);

        let result = cache.get::<String>("key1");
        assert!(matches!(result, Err(CacheError::Contention { attempts: 2, .. })));
    }

    #[test]
    fn test_stats() {
        let mut cache = memory_cache(2);

        cache.set("a", &1).unwrap();
        cache.set("b", &2).unwrap();
        cache.set("c", &3).unwrap();
        cache.get::<i32>("c").unwrap();
        let _ = cache.get::<i32>("a");

        let stats = cache.stats().unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.resident_entries, 2);
        assert_eq!(cache.capacity(), 2);
    }
}
