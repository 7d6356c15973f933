//! In-memory Store
//!
//! A `Store` over a `HashMap`, with injectable write contention. Lets the
//! engine be exercised without a database file.

use std::collections::HashMap;

use crate::cache::eviction::boundary_of;
use crate::cache::{AccessStamp, CacheEntry, Store, WriteFailure, WriteOp};
use crate::error::Result;

/// Message reported for simulated contention.
const SIMULATED_CONTENTION: &str = "database is locked (simulated)";

// == Memory Store ==
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: HashMap<String, CacheEntry>,
    /// Write attempts still to be rejected as contended
    pending_contention: usize,
    reconnects: usize,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Contention Injection ==
    /// Makes the next `count` write attempts fail as contended.
    pub fn contend_next_writes(&mut self, count: usize) {
        self.pending_contention = count;
    }

    // == Inspection ==
    /// Number of times the handle was reconnected.
    pub fn reconnects(&self) -> usize {
        self.reconnects
    }

    /// Resident keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }
}

impl Store for MemoryStore {
    fn read_row(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self.rows.get(key).cloned())
    }

    fn boundary(&self, rank: usize) -> Result<Option<AccessStamp>> {
        Ok(boundary_of(
            self.rows.values().map(|entry| &entry.last_access),
            rank,
        ))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.rows.len())
    }

    fn try_write(&mut self, op: &WriteOp) -> std::result::Result<usize, WriteFailure> {
        if self.pending_contention > 0 {
            self.pending_contention -= 1;
            return Err(WriteFailure::Contended(SIMULATED_CONTENTION.to_string()));
        }

        let affected = match op {
            WriteOp::Upsert(entry) => {
                self.rows.insert(entry.key.clone(), entry.clone());
                1
            }
            WriteOp::Touch { key, last_access } => match self.rows.get_mut(key) {
                Some(entry) => {
                    entry.last_access = last_access.clone();
                    1
                }
                None => 0,
            },
            WriteOp::Delete(key) => usize::from(self.rows.remove(key).is_some()),
            WriteOp::DeleteOlderThan(boundary) => {
                let before = self.rows.len();
                self.rows.retain(|_, entry| entry.last_access >= *boundary);
                before - self.rows.len()
            }
        };
        Ok(affected)
    }

    fn reconnect(&mut self) -> Result<()> {
        self.reconnects += 1;
        Ok(())
    }
}
