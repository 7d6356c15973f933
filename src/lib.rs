//! sqlru - An SQLite-backed LRU cache
//!
//! Values are stored as JSON under string keys in a single SQLite file. Every
//! `set` is followed by an eviction pass that keeps the most recently used
//! entries up to the configured capacity; every `get` refreshes the entry's
//! recency. Several threads or processes may share one file, each through its
//! own handle.
//!
//! ```no_run
//! # fn main() -> sqlru::Result<()> {
//! let mut cache = sqlru::open("/tmp/lrucache.sqlite", 100)?;
//! cache.set("foo", &vec!["object"])?;
//! let value: Vec<String> = cache.get("foo")?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;

use std::path::Path;

pub use cache::{CacheStats, LruCache, MemoryStore, SqliteStore, Store};
pub use config::CacheConfig;
pub use error::{CacheError, Result};

/// Opens (or creates) the cache file at `path` with the given capacity.
pub fn open(path: impl AsRef<Path>, capacity: usize) -> Result<LruCache> {
    LruCache::open(path, capacity)
}
