//! Per-index attribute arrays and their run-length encoder.
//!
//! The stores in this module are the write side of the table: a document is
//! built by setting attributes per logical index, then each store collapses
//! its arrays into the minimal run sequence. Arrays grow on first write and
//! never beyond the capacity; an index at or past the array length holds the
//! default record.

mod cell;
mod column;
mod row;

pub use cell::{CellAttributeStore, CellRecord};
pub use column::{ColumnAttributeStore, ColumnRecord};
pub use row::{RowAttributeStore, RowRecord};

/// A planned output run: `count` positions starting at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedRun {
    pub start: u32,
    pub count: u32,
}

/// Per-index view used by [`plan_runs`].
pub(crate) trait RunSource {
    /// Structural attribute tuple of one index.
    type Key<'a>: PartialEq
    where
        Self: 'a;

    fn capacity(&self) -> u32;

    /// Length of the materialized arrays.
    fn len(&self) -> u32;

    fn key(&self, index: u32) -> Self::Key<'_>;

    /// Tuple of every index at or past `len()`.
    fn default_key(&self) -> Self::Key<'_>;
}

/// Collapse a store into runs of structurally equal tuples.
///
/// The unmaterialized tail is folded into the last run when that run holds
/// the default tuple; otherwise the tail is left out, exactly as a decoder
/// reads a sparse tail.
pub(crate) fn plan_runs<S: RunSource>(source: &S) -> Vec<PlannedRun> {
    let len = source.len();
    let mut runs: Vec<PlannedRun> = Vec::new();
    let mut start = 0;
    while start < len {
        let key = source.key(start);
        let mut end = start + 1;
        while end < len && source.key(end) == key {
            end += 1;
        }
        runs.push(PlannedRun {
            start,
            count: end - start,
        });
        start = end;
    }

    let tail = source.capacity().saturating_sub(len);
    if tail > 0
        && let Some(last) = runs.last_mut()
        && source.key(last.start) == source.default_key()
    {
        last.count += tail;
    }
    runs
}
