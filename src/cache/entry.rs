//! Cache Entry Module
//!
//! Defines the stored row and the sortable access timestamps that drive eviction.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, Utc};

/// strftime pattern for stamps: fixed width, zero padded, microsecond precision.
const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

// == Access Stamp ==
/// Recency marker stored in the `last_access` column.
///
/// Encoded as `YYYY-MM-DD HH:MM:SS.ffffff` in UTC. Every stamp has the same
/// width, so comparing the strings compares the instants.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccessStamp(String);

impl AccessStamp {
    /// Encodes an instant.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.format(STAMP_FORMAT).to_string())
    }

    /// Wraps a stamp read back from storage.
    pub fn from_raw(raw: String) -> Self {
        Self(raw)
    }

    /// Returns the encoded form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccessStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// == Clock ==
/// Source of the stamps written on set and touch.
pub trait Clock: Send + Sync {
    fn now(&self) -> AccessStamp;
}

/// Wall clock in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> AccessStamp {
        AccessStamp::from_datetime(Utc::now())
    }
}

/// Deterministic clock advancing by a fixed step on every reading.
///
/// A step of zero yields the same stamp forever, which is how ties at the
/// eviction boundary are reproduced.
#[derive(Debug)]
pub struct StepClock {
    origin: DateTime<Utc>,
    step_micros: i64,
    ticks: AtomicI64,
}

impl StepClock {
    pub fn new(origin: DateTime<Utc>, step_micros: i64) -> Self {
        Self {
            origin,
            step_micros,
            ticks: AtomicI64::new(0),
        }
    }

    /// Starts at the current wall-clock time.
    pub fn starting_now(step_micros: i64) -> Self {
        Self::new(Utc::now(), step_micros)
    }
}

impl Clock for StepClock {
    fn now(&self) -> AccessStamp {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        AccessStamp::from_datetime(self.origin + Duration::microseconds(self.step_micros * tick))
    }
}

// == Cache Entry ==
/// A single row of the cache table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Primary key
    pub key: String,
    /// Serialized payload
    pub value: String,
    /// Last set or get of this key
    pub last_access: AccessStamp,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>, last_access: AccessStamp) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            last_access,
        }
    }
}
