//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Path of the SQLite file backing the cache
    pub path: PathBuf,
    /// Number of entries kept after each eviction pass
    pub capacity: usize,
    /// How long a connection waits for the write lock before reporting contention
    pub busy_timeout: Duration,
}

impl CacheConfig {
    /// Creates a config for `path` and `capacity` with the default busy timeout.
    pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            path: path.into(),
            capacity,
            ..Self::default()
        }
    }

    /// Overrides the busy timeout.
    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SQLRU_PATH` - Backing file (default: `lrucache.sqlite` in the temp dir)
    /// - `SQLRU_CAPACITY` - Capacity in entries (default: 100)
    /// - `SQLRU_BUSY_TIMEOUT_MS` - Lock wait in milliseconds (default: 5000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            path: env::var_os("SQLRU_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.path),
            capacity: env::var("SQLRU_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.capacity),
            busy_timeout: env::var("SQLRU_BUSY_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.busy_timeout),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: env::temp_dir().join("lrucache.sqlite"),
            capacity: 100,
            busy_timeout: Duration::from_secs(5),
        }
    }
}
