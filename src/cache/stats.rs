//! Cache Statistics Module
//!
//! Per-handle counters for lookups and evictions.

use serde::Serialize;

// == Cache Stats ==
/// Counters collected by one cache handle since it was opened.
///
/// Other handles on the same file keep their own counters; only
/// `resident_entries` reflects the shared table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Successful gets
    pub hits: u64,
    /// Gets on absent keys
    pub misses: u64,
    /// Rows removed by eviction passes run from this handle
    pub evictions: u64,
    /// Rows in the table when the stats were taken
    pub resident_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no gets have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Evictions ==
    /// Adds the rows removed by one eviction pass.
    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    // == Update Entry Count ==
    /// Updates the resident entry count.
    pub fn set_resident_entries(&mut self, count: usize) {
        self.resident_entries = count;
    }
}
