//! Run and reference primitives shared by every axis.
//!
//! A [`RunTable`] is an arena of [`Run`] records addressed by [`RunId`], an
//! ordered list of those ids by logical position, and a sparse map of
//! [`Reference`]s from logical index to `(run, offset)`.
//!
//! References are created lazily and in order: within one run, the entries
//! for offsets `0..run.referenced` exist and no others do. This keeps the cost
//! of a lookup proportional to how far it advances inside a run rather than to
//! the run's repeat count.

use crate::odf::dom::NodeId;
use std::collections::BTreeMap;

/// Stable index of a run inside its [`RunTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(u32);

impl RunId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A block of consecutive logical positions sharing one backing element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    /// Element carrying the attributes of every position in the run.
    pub node: NodeId,
    /// Logical index of the first position.
    pub start: u32,
    /// Number of positions, always at least one.
    pub repeat: u32,
    /// Number of leading offsets that have a reference entry.
    pub(crate) referenced: u32,
}

impl Run {
    /// One past the last logical index of the run.
    #[inline]
    pub fn end(&self) -> u32 {
        self.start + self.repeat
    }

    #[inline]
    pub fn contains(&self, index: u32) -> bool {
        index >= self.start && index < self.end()
    }

    /// A run of one position is never split.
    #[inline]
    pub fn is_individual(&self) -> bool {
        self.repeat == 1
    }
}

/// Lazily created binding from a logical index to its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub index: u32,
    pub offset: u32,
    pub run: RunId,
}

/// Runs of one axis scope, in positional order.
#[derive(Debug, Clone, Default)]
pub struct RunTable {
    runs: Vec<Run>,
    order: Vec<RunId>,
    references: BTreeMap<u32, Reference>,
    covered: u32,
    last_reference: Option<Reference>,
}

impl RunTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live runs.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Sum of the repeat counts of all runs.
    pub fn covered(&self) -> u32 {
        self.covered
    }

    pub fn run(&self, id: RunId) -> &Run {
        &self.runs[id.index()]
    }

    pub(crate) fn run_mut(&mut self, id: RunId) -> &mut Run {
        &mut self.runs[id.index()]
    }

    /// Runs in positional order.
    pub fn iter(&self) -> impl Iterator<Item = &Run> {
        self.order.iter().map(|id| self.run(*id))
    }

    /// Run ids in positional order.
    pub fn ids(&self) -> &[RunId] {
        &self.order
    }

    pub fn last(&self) -> Option<RunId> {
        self.order.last().copied()
    }

    /// The reference most recently created by [`RunTable::extend_references`].
    pub fn last_reference(&self) -> Option<Reference> {
        self.last_reference
    }

    /// Append a run after every existing run.
    pub fn push(&mut self, node: NodeId, repeat: u32) -> RunId {
        debug_assert!(repeat >= 1);
        let id = RunId(self.runs.len() as u32);
        self.runs.push(Run {
            node,
            start: self.covered,
            repeat,
            referenced: 0,
        });
        self.order.push(id);
        self.covered += repeat;
        id
    }

    /// Add `extra` positions to the last run.
    pub(crate) fn extend_last(&mut self, extra: u32) {
        if let Some(id) = self.last() {
            self.run_mut(id).repeat += extra;
            self.covered += extra;
        }
    }

    /// Insert a run directly after `after` in positional order.
    ///
    /// The caller is responsible for shrinking `after` by the same number of
    /// positions, so the covered total is unchanged.
    pub(crate) fn insert_after(&mut self, after: RunId, node: NodeId, start: u32, repeat: u32) -> RunId {
        let id = RunId(self.runs.len() as u32);
        self.runs.push(Run {
            node,
            start,
            repeat,
            referenced: 0,
        });
        let pos = self.order_position(after);
        self.order.insert(pos + 1, id);
        id
    }

    fn order_position(&self, id: RunId) -> usize {
        let start = self.run(id).start;
        match self.order.binary_search_by_key(&start, |other| self.run(*other).start) {
            Ok(pos) if self.order[pos] == id => pos,
            _ => panic!("run {:?} is not in positional order; run table is corrupted", id),
        }
    }

    /// Find the run owning `index` and the offset of `index` inside it.
    pub fn locate(&self, index: u32) -> Option<(RunId, u32)> {
        if index >= self.covered {
            return None;
        }
        let pos = self.order.partition_point(|id| self.run(*id).start <= index);
        let id = *self.order.get(pos.checked_sub(1)?)?;
        let run = self.run(id);
        run.contains(index).then(|| (id, index - run.start))
    }

    /// Create reference entries inside the owning run up to `index`.
    ///
    /// Walks forward from the last referenced offset of that run only, so the
    /// work done is the distance advanced. Returns `None` when no run covers
    /// `index`.
    pub fn extend_references(&mut self, index: u32) -> Option<Reference> {
        let (id, offset) = self.locate(index)?;
        let run = self.run(id);
        let (start, from) = (run.start, run.referenced);
        let limit = offset.min(run.repeat - 1);
        for k in from..=limit {
            let reference = Reference {
                index: start + k,
                offset: k,
                run: id,
            };
            self.references.insert(start + k, reference);
            self.last_reference = Some(reference);
        }
        if limit + 1 > from {
            self.run_mut(id).referenced = limit + 1;
        }
        self.references.get(&index).copied()
    }

    /// Existing reference entry for `index`, if one has been created.
    pub fn reference(&self, index: u32) -> Option<Reference> {
        self.references.get(&index).copied()
    }

    /// Number of reference entries.
    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    /// Point the reference of `index` at a different run.
    pub(crate) fn rebind(&mut self, index: u32, run: RunId, offset: u32) {
        let reference = Reference { index, offset, run };
        self.references.insert(index, reference);
        if self.last_reference.is_some_and(|last| last.index == index) {
            self.last_reference = Some(reference);
        }
    }

    /// Resolve an existing reference to its live run.
    ///
    /// # Panics
    ///
    /// Panics when the reference is missing or does not agree with its run:
    /// that can only happen if extend and split left the table inconsistent.
    pub fn resolve(&self, index: u32) -> &Run {
        let Some(reference) = self.references.get(&index) else {
            panic!("no reference for index {}; reference table is corrupted", index);
        };
        let run = self.runs.get(reference.run.index()).unwrap_or_else(|| {
            panic!("reference for index {} points at a missing run", index)
        });
        if run.start + reference.offset != index || reference.offset >= run.repeat {
            panic!(
                "reference for index {} is stale (run start {}, repeat {}, offset {}); reference table is corrupted",
                index, run.start, run.repeat, reference.offset
            );
        }
        run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odf::dom::Dom;

    fn table(repeats: &[u32]) -> (Dom, RunTable) {
        let mut dom = Dom::new();
        let mut runs = RunTable::new();
        for &repeat in repeats {
            let node = dom.create_element("table:table-cell");
            runs.push(node, repeat);
        }
        (dom, runs)
    }

    #[test]
    fn test_push_assigns_starts() {
        let (_, runs) = table(&[2, 1, 5]);
        let starts: Vec<_> = runs.iter().map(|r| (r.start, r.repeat)).collect();
        assert_eq!(starts, vec![(0, 2), (2, 1), (3, 5)]);
        assert_eq!(runs.covered(), 8);
        assert_eq!(runs.len(), 3);
    }

    #[test]
    fn test_locate() {
        let (_, runs) = table(&[2, 1, 5]);
        let ids = runs.ids().to_vec();
        assert_eq!(runs.locate(0), Some((ids[0], 0)));
        assert_eq!(runs.locate(1), Some((ids[0], 1)));
        assert_eq!(runs.locate(2), Some((ids[1], 0)));
        assert_eq!(runs.locate(7), Some((ids[2], 4)));
        assert_eq!(runs.locate(8), None);
    }

    #[test]
    fn test_extend_references_is_prefix() {
        let (_, mut runs) = table(&[3, 1_000_000]);
        let reference = runs.extend_references(5).unwrap();
        assert_eq!(reference.offset, 2);
        // offsets 0..=2 of the second run, nothing from the first run
        assert_eq!(runs.reference_count(), 3);
        assert!(runs.reference(0).is_none());
        assert!(runs.reference(3).is_some());
        assert!(runs.reference(4).is_some());

        runs.extend_references(4).unwrap();
        assert_eq!(runs.reference_count(), 3);
        assert_eq!(runs.last_reference().map(|r| r.index), Some(5));
        assert_eq!(runs.resolve(5).repeat, 1_000_000);
    }

    #[test]
    fn test_extend_references_outside() {
        let (_, mut runs) = table(&[2]);
        assert!(runs.extend_references(2).is_none());
    }

    #[test]
    #[should_panic(expected = "corrupted")]
    fn test_resolve_missing_reference_panics() {
        let (_, runs) = table(&[2]);
        runs.resolve(1);
    }
}
