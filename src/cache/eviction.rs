//! Eviction Module
//!
//! Capacity enforcement by rank boundary over `last_access`.
//!
//! The `capacity`-th most recent entry defines the boundary stamp `T`; every
//! row strictly older than `T` is deleted. Rows that tie with `T` are kept, so
//! the resident count can exceed the capacity when several writes share a
//! stamp.

use tracing::debug;

use crate::cache::{AccessStamp, Store, WriteOp};
use crate::error::Result;

// == Boundary ==
/// Offset of the boundary row in most-recent-first order.
///
/// A capacity of zero behaves like one: the row just written always survives
/// its own eviction pass.
pub fn boundary_rank(capacity: usize) -> usize {
    capacity.saturating_sub(1)
}

/// Returns the stamp at offset `rank` in most-recent-first order, or `None`
/// when there are no more than `rank` stamps.
pub fn boundary_of<'a, I>(stamps: I, rank: usize) -> Option<AccessStamp>
where
    I: IntoIterator<Item = &'a AccessStamp>,
{
    let mut sorted: Vec<&AccessStamp> = stamps.into_iter().collect();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.get(rank).map(|stamp| (*stamp).clone())
}

// == Eviction Pass ==
/// Runs one eviction pass and returns the number of rows removed.
pub fn evict<S: Store + ?Sized>(store: &mut S, capacity: usize) -> Result<usize> {
    let Some(boundary) = store.boundary(boundary_rank(capacity))? else {
        return Ok(0);
    };

    let removed = store.execute_write(&WriteOp::DeleteOlderThan(boundary.clone()))?;
    if removed > 0 {
        debug!(removed, capacity, %boundary, "Eviction pass removed entries");
    }
    Ok(removed)
}
