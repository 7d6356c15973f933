//! SQLite Store
//!
//! Persists the cache table in a single SQLite file. Every write is its own
//! auto-committed statement; locking across processes is left to SQLite.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::cache::{AccessStamp, CacheEntry, Store, WriteFailure, WriteOp};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS lru (
        key         TEXT PRIMARY KEY,
        value       TEXT NOT NULL,
        last_access TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS lru_last_access ON lru (last_access);
";

// == SQLite Store ==
#[derive(Debug)]
pub struct SqliteStore {
    path: PathBuf,
    busy_timeout: Duration,
    conn: Connection,
}

impl SqliteStore {
    /// Opens the file at `path` with the default busy timeout.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_timeout(path, CacheConfig::default().busy_timeout)
    }

    /// Opens the file at `path`, creating it with the cache schema if it does
    /// not exist yet. An existing file is used as-is.
    pub fn open_with_timeout(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let existed = path.exists();

        let conn = connect(&path, busy_timeout)?;
        if !existed {
            conn.execute_batch(SCHEMA)
                .map_err(|source| CacheError::StorageUnavailable {
                    path: path.clone(),
                    source,
                })?;
            info!("Created cache store at {:?}", path);
        } else {
            info!("Opened cache store at {:?}", path);
        }

        Ok(Self {
            path,
            busy_timeout,
            conn,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn connect(path: &Path, busy_timeout: Duration) -> Result<Connection> {
    let unavailable = |source| CacheError::StorageUnavailable {
        path: path.to_path_buf(),
        source,
    };
    let conn = Connection::open(path).map_err(unavailable)?;
    conn.busy_timeout(busy_timeout).map_err(unavailable)?;
    Ok(conn)
}

impl Store for SqliteStore {
    fn read_row(&self, key: &str) -> Result<Option<CacheEntry>> {
        let row = self
            .conn
            .query_row(
                "SELECT key, value, last_access FROM lru WHERE key = ?1",
                params![key],
                |row| {
                    Ok(CacheEntry {
                        key: row.get(0)?,
                        value: row.get(1)?,
                        last_access: AccessStamp::from_raw(row.get(2)?),
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    fn boundary(&self, rank: usize) -> Result<Option<AccessStamp>> {
        let offset = i64::try_from(rank).unwrap_or(i64::MAX);
        let stamp = self
            .conn
            .query_row(
                "SELECT last_access FROM lru ORDER BY last_access DESC LIMIT 1 OFFSET ?1",
                params![offset],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(stamp.map(AccessStamp::from_raw))
    }

    fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM lru", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn try_write(&mut self, op: &WriteOp) -> std::result::Result<usize, WriteFailure> {
        let affected = match op {
            WriteOp::Upsert(entry) => self.conn.execute(
                "INSERT OR REPLACE INTO lru (key, value, last_access) VALUES (?1, ?2, ?3)",
                params![entry.key, entry.value, entry.last_access.as_str()],
            )?,
            WriteOp::Touch { key, last_access } => self.conn.execute(
                "UPDATE lru SET last_access = ?2 WHERE key = ?1",
                params![key, last_access.as_str()],
            )?,
            WriteOp::Delete(key) => self
                .conn
                .execute("DELETE FROM lru WHERE key = ?1", params![key])?,
            WriteOp::DeleteOlderThan(boundary) => self.conn.execute(
                "DELETE FROM lru WHERE last_access < ?1",
                params![boundary.as_str()],
            )?,
        };
        Ok(affected)
    }

    fn reconnect(&mut self) -> Result<()> {
        self.conn = connect(&self.path, self.busy_timeout)?;
        Ok(())
    }
}
