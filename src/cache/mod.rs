//! Cache Module
//!
//! Provides an LRU cache persisted in SQLite, with eviction by access timestamp.

mod entry;
pub mod eviction;
mod lru;
mod memory;
mod sqlite;
mod stats;
mod store;


// Re-export public types
pub use entry::{AccessStamp, CacheEntry, Clock, StepClock, SystemClock};
pub use lru::LruCache;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use stats::CacheStats;
pub use store::{Store, WriteFailure, WriteOp, MAX_WRITE_ATTEMPTS};
