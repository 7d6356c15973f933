//! Store Module
//!
//! The narrow row-storage contract the cache engine runs on, and the
//! single-retry discipline applied to every write.

use rusqlite::ffi::ErrorCode;
use tracing::warn;

use crate::cache::{AccessStamp, CacheEntry};
use crate::error::{CacheError, Result};

/// Attempts made for one write: the original plus one retry on a fresh connection.
pub const MAX_WRITE_ATTEMPTS: u32 = 2;

// == Write Operations ==
/// A single auto-committed write against the cache table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Insert or fully replace a row
    Upsert(CacheEntry),
    /// Refresh `last_access` without touching the value
    Touch { key: String, last_access: AccessStamp },
    /// Delete one row by key
    Delete(String),
    /// Delete every row with `last_access` strictly older than the stamp
    DeleteOlderThan(AccessStamp),
}

/// Outcome of a failed write attempt.
#[derive(Debug)]
pub enum WriteFailure {
    /// The write lock could not be acquired; the attempt may be retried
    Contended(String),
    /// Anything else; surfaced as-is
    Failed(CacheError),
}

impl From<rusqlite::Error> for WriteFailure {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
                WriteFailure::Contended(err.to_string())
            }
            _ => WriteFailure::Failed(CacheError::Storage(err)),
        }
    }
}

// == Store Trait ==
/// Row storage for a single cache table.
///
/// Reads are never retried. Writes go through [`Store::execute_write`], which
/// retries a contended write exactly once after [`Store::reconnect`].
pub trait Store {
    /// Reads the row for `key`.
    fn read_row(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// Returns the `last_access` at offset `rank` when rows are ordered most
    /// recent first, or `None` if there are not more than `rank` rows.
    fn boundary(&self, rank: usize) -> Result<Option<AccessStamp>>;

    /// Number of resident rows.
    fn len(&self) -> Result<usize>;

    /// Applies one write, once. Returns the number of rows affected.
    fn try_write(&mut self, op: &WriteOp) -> std::result::Result<usize, WriteFailure>;

    /// Replaces the underlying handle with a fresh one to the same storage.
    fn reconnect(&mut self) -> Result<()>;

    /// Applies one write with the bounded contention retry.
    fn execute_write(&mut self, op: &WriteOp) -> Result<usize> {
        let mut attempt = 1;
        loop {
            match self.try_write(op) {
                Ok(affected) => return Ok(affected),
                Err(WriteFailure::Failed(err)) => return Err(err),
                Err(WriteFailure::Contended(reason)) if attempt < MAX_WRITE_ATTEMPTS => {
                    warn!(attempt, %reason, "Write contended, reconnecting and retrying");
                    self.reconnect()?;
                    attempt += 1;
                }
                Err(WriteFailure::Contended(reason)) => {
                    return Err(CacheError::Contention {
                        attempts: attempt,
                        reason,
                    });
                }
            }
        }
    }
}
