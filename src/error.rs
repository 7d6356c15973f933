//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not present in the store
    #[error("Key not found: {0}")]
    NotFound(String),

    /// The write lock was still contended after the retry
    #[error("Write lock contended after {attempts} attempts: {reason}")]
    Contention { attempts: u32, reason: String },

    /// Stored payload could not be decoded
    #[error("Failed to decode value for key {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Value could not be encoded
    #[error("Failed to encode value: {0}")]
    Encode(#[source] serde_json::Error),

    /// Backing file could not be opened or created
    #[error("Storage unavailable at {path:?}: {source}")]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Any other storage failure
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
