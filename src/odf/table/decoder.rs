//! Lazy decoding of an existing run sequence into a logical index space.
//!
//! A [`PositionalRunDecoder`] reads the runs of one scope in a single pass and
//! afterwards answers lookups by logical index. Positions are bound to their
//! run on first access, and a mutable lookup splits the owning run so the
//! returned element belongs to that position alone.
//!
//! The declared capacity may exceed the sum of the decoded runs. Positions in
//! that sparse tail read as empty and are only backed by an element once
//! something is written to them.

use super::axis::{Axis, CellAxis, ColumnAxis, RowAxis, read_repeat, write_repeat};
use super::run::{Reference, Run, RunTable};
use super::splitter::{Split, split};
use crate::common::{Error, Result};
use crate::odf::dom::{Dom, NodeId};
use std::marker::PhantomData;

/// Result of a successful lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// The position carries no significant attributes.
    Empty,
    /// The element backing the position.
    Node(NodeId),
}

impl Position {
    pub fn is_empty(&self) -> bool {
        matches!(self, Position::Empty)
    }

    pub fn node(&self) -> Option<NodeId> {
        match self {
            Position::Empty => None,
            Position::Node(node) => Some(*node),
        }
    }
}

/// Run decoder for the columns of a table.
pub type ColumnDecoder = PositionalRunDecoder<ColumnAxis>;
/// Run decoder for the rows of a table.
pub type RowDecoder = PositionalRunDecoder<RowAxis>;
/// Run decoder for the cells of a row.
pub type CellDecoder = PositionalRunDecoder<CellAxis>;

/// Decoded runs of one axis within one scope element.
#[derive(Debug, Clone)]
pub struct PositionalRunDecoder<A: Axis> {
    scope: NodeId,
    capacity: u32,
    limit: u32,
    runs: RunTable,
    _axis: PhantomData<A>,
}

impl<A: Axis> PositionalRunDecoder<A> {
    /// Decode the runs under `scope`, flattening grouping containers.
    ///
    /// The capacity is the larger of `declared` and the sum of the repeat
    /// counts. A malformed repeat count aborts decoding.
    pub fn decode(dom: &Dom, scope: NodeId, declared: Option<u32>) -> Result<Self> {
        let mut runs = RunTable::new();
        let mut stack = vec![dom.first_child(scope)];
        while let Some(cursor) = stack.last_mut() {
            let Some(node) = *cursor else {
                stack.pop();
                continue;
            };
            *cursor = dom.next_sibling(node);

            let tag = dom.tag(node);
            if A::is_run_element(tag) {
                let repeat = read_repeat::<A>(dom, node)?;
                if runs.covered().checked_add(repeat).is_none() {
                    return Err(Error::InvalidFormat(format!(
                        "Total {} count overflows after {} runs",
                        A::NAME,
                        runs.len()
                    )));
                }
                runs.push(node, repeat);
            } else if A::is_group(tag) {
                stack.push(dom.first_child(node));
            }
        }

        let capacity = declared.map_or(runs.covered(), |d| d.max(runs.covered()));
        tracing::debug!(
            axis = A::NAME,
            capacity,
            runs = runs.len(),
            covered = runs.covered(),
            "decoded axis"
        );
        Ok(Self {
            scope,
            capacity,
            limit: u32::MAX,
            runs,
            _axis: PhantomData,
        })
    }

    /// Cap growth of this axis at `limit` positions.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(self.capacity);
        self
    }

    /// Element holding the runs.
    pub fn scope(&self) -> NodeId {
        self.scope
    }

    /// Number of logical positions.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Positions backed by a run; the rest of the capacity is sparse tail.
    pub fn covered(&self) -> u32 {
        self.runs.covered()
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Runs in positional order.
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.runs.iter()
    }

    pub fn last_run(&self) -> Option<&Run> {
        self.runs.last().map(|id| self.runs.run(id))
    }

    /// The reference created most recently.
    pub fn last_reference(&self) -> Option<Reference> {
        self.runs.last_reference()
    }

    /// Existing reference for `index`, without creating one.
    pub fn reference(&self, index: u32) -> Option<Reference> {
        self.runs.reference(index)
    }

    /// Bind every position of the owning run up to `index`.
    pub fn extend_references(&mut self, index: u32) -> Option<Reference> {
        self.runs.extend_references(index)
    }

    /// Look up a position without modifying the document.
    ///
    /// Returns `None` outside `[0, capacity)`, [`Position::Empty`] for blank
    /// positions (including the sparse tail), and the backing element
    /// otherwise. The element may be shared with neighbouring positions.
    pub fn lookup_read_only(&mut self, dom: &Dom, index: i64) -> Option<Position> {
        if index < 0 || index >= i64::from(self.capacity) {
            return None;
        }
        let index = index as u32;
        if index >= self.runs.covered() {
            return Some(Position::Empty);
        }
        self.runs.extend_references(index)?;
        let node = self.runs.resolve(index).node;
        if A::is_empty(dom, node) {
            Some(Position::Empty)
        } else {
            Some(Position::Node(node))
        }
    }

    /// Look up a position for writing.
    ///
    /// Positions beyond the capacity grow the axis, positions in the sparse
    /// tail are materialized, and a shared run is split so the returned
    /// element can be changed without affecting any other position.
    pub fn lookup_mutable(&mut self, dom: &mut Dom, index: i64) -> Result<NodeId> {
        let index = self.check_writable(index)?;
        if index >= self.capacity {
            self.grow_capacity(dom, index - self.capacity + 1)?;
        }
        if index >= self.runs.covered() {
            self.materialize_tail(dom, index)?;
        }
        self.split_at(dom, index)
    }

    /// Check that a write at `index` can succeed without growing the axis
    /// past its limit.
    pub fn check_writable(&self, index: i64) -> Result<u32> {
        let out_of_range = || {
            Error::InvalidArgument(format!(
                "{} index {} is out of range (capacity {}, limit {})",
                A::NAME,
                index,
                self.capacity,
                self.limit
            ))
        };
        let index = u32::try_from(index).map_err(|_| out_of_range())?;
        if index >= self.capacity && index >= self.limit {
            return Err(out_of_range());
        }
        Ok(index)
    }

    /// Give `index` a run of its own and return its element.
    pub fn split_at(&mut self, dom: &mut Dom, index: u32) -> Result<NodeId> {
        let Some(reference) = self.runs.extend_references(index) else {
            return Err(Error::InvalidArgument(format!(
                "{} index {} is not backed by a run",
                A::NAME,
                index
            )));
        };
        let runs = std::mem::take(&mut self.runs);
        let Split { runs, target } = split::<A>(runs, dom, reference.run, reference.offset)?;
        self.runs = runs;
        Ok(self.runs.run(target).node)
    }

    /// Back the sparse tail up to and including `index` with empty positions.
    ///
    /// An empty last run absorbs them; otherwise one new empty run is added.
    fn materialize_tail(&mut self, dom: &mut Dom, index: u32) -> Result<()> {
        let count = index
            .checked_sub(self.runs.covered())
            .and_then(|gap| gap.checked_add(1))
            .ok_or_else(|| {
                Error::InvalidArgument(format!("{} index {} cannot be materialized", A::NAME, index))
            })?;
        if let Some(last) = self.last_run()
            && A::is_empty(dom, last.node)
        {
            let (node, repeat) = (last.node, last.repeat + count);
            write_repeat::<A>(dom, node, repeat)?;
            self.runs.extend_last(count);
            return Ok(());
        }
        let node = dom.create_element(A::RUN_TAG);
        write_repeat::<A>(dom, node, count)?;
        self.attach(dom, node)?;
        self.runs.push(node, count);
        Ok(())
    }

    fn attach(&self, dom: &mut Dom, node: NodeId) -> Result<()> {
        match self.last_run() {
            Some(last) => dom.insert_after(node, last.node),
            None => {
                A::attach_first(dom, self.scope, node);
                Ok(())
            },
        }
    }

    /// Add `extra` positions at the end of the axis.
    ///
    /// An empty last run absorbs the growth; otherwise one new run of `extra`
    /// positions is appended. With a sparse tail only the capacity moves.
    pub fn grow_capacity(&mut self, dom: &mut Dom, extra: u32) -> Result<()> {
        if extra == 0 {
            return Ok(());
        }
        let capacity = self
            .capacity
            .checked_add(extra)
            .filter(|c| *c <= self.limit)
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "Cannot grow {} axis from {} by {}: limit is {}",
                    A::NAME,
                    self.capacity,
                    extra,
                    self.limit
                ))
            })?;

        if self.runs.covered() == self.capacity {
            match self.last_run() {
                Some(last) if A::is_empty(dom, last.node) => {
                    let node = last.node;
                    let repeat = last.repeat + extra;
                    write_repeat::<A>(dom, node, repeat)?;
                    self.runs.extend_last(extra);
                },
                _ => {
                    let node = dom.create_element(A::RUN_TAG);
                    write_repeat::<A>(dom, node, extra)?;
                    self.attach(dom, node)?;
                    self.runs.push(node, extra);
                },
            }
        }
        tracing::trace!(axis = A::NAME, from = self.capacity, to = capacity, "grew axis");
        self.capacity = capacity;
        Ok(())
    }
}
