//! Attribute arrays for the rows of a table.
//!
//! Each row record carries an optional [`CellAttributeStore`], so two rows
//! only share a run when their cells are structurally equal as well.

use super::{CellAttributeStore, RunSource, plan_runs};
use crate::common::Result;
use crate::config::StoreOptions;
use crate::odf::dom::{Dom, NodeId};
use crate::odf::table::axis::{
    CellAxis, RowAxis, STYLE_NAME, TABLE_CELL, TABLE_ROW, VISIBILITY, write_repeat,
};
use fixedbitset::FixedBitSet;

/// Attributes of one row position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowRecord {
    pub hidden: bool,
    pub cells: Option<CellAttributeStore>,
}

/// Growable per-row attribute arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowAttributeStore {
    capacity: u32,
    cell_capacity: u32,
    hidden: FixedBitSet,
    cells: Vec<Option<CellAttributeStore>>,
}

type RowKey<'a> = (bool, Option<&'a CellAttributeStore>);

impl RowAttributeStore {
    /// Create a store of `capacity` rows, each `cell_capacity` columns wide.
    pub fn new(capacity: u32, cell_capacity: u32) -> Self {
        Self {
            capacity,
            cell_capacity,
            ..Self::default()
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Column count given to the cell stores of new rows.
    pub fn cell_capacity(&self) -> u32 {
        self.cell_capacity
    }

    pub fn len(&self) -> u32 {
        self.cells.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn grow_capacity(&mut self, extra: u32) {
        self.capacity = self.capacity.saturating_add(extra);
    }

    /// Widen every row by `extra` columns, materialized or not.
    pub fn grow_cell_capacity(&mut self, extra: u32) {
        self.cell_capacity = self.cell_capacity.saturating_add(extra);
        for cells in self.cells.iter_mut().flatten() {
            cells.grow_capacity(extra);
        }
    }

    fn ensure(&mut self, index: u32) -> usize {
        let i = index as usize;
        if i >= self.cells.len() {
            self.cells.resize(i + 1, None);
            self.hidden.grow(i + 1);
        }
        self.capacity = self.capacity.max(index + 1);
        i
    }

    // Blank cell stores compare like absent ones
    fn key_at(&self, index: u32) -> RowKey<'_> {
        let i = index as usize;
        match self.cells.get(i) {
            Some(cells) => (
                self.hidden.contains(i),
                cells.as_ref().filter(|c| !c.is_blank()),
            ),
            None => (false, None),
        }
    }

    pub fn get(&self, index: u32) -> RowRecord {
        let i = index as usize;
        RowRecord {
            hidden: self.hidden.contains(i),
            cells: self.cells.get(i).cloned().flatten(),
        }
    }

    pub fn set(&mut self, index: u32, record: RowRecord) {
        let i = self.ensure(index);
        self.hidden.set(i, record.hidden);
        if let Some(cells) = &record.cells {
            self.cell_capacity = self.cell_capacity.max(cells.capacity());
        }
        self.cells[i] = record.cells;
    }

    pub fn hidden(&self, index: u32) -> bool {
        self.key_at(index).0
    }

    pub fn set_hidden(&mut self, index: u32, hidden: bool) {
        let i = self.ensure(index);
        self.hidden.set(i, hidden);
    }

    /// Cell store of a row, if one has been written.
    pub fn cells(&self, index: u32) -> Option<&CellAttributeStore> {
        self.cells.get(index as usize).and_then(Option::as_ref)
    }

    /// Cell store of a row, created on first access.
    pub fn cells_mut(&mut self, index: u32) -> &mut CellAttributeStore {
        let i = self.ensure(index);
        let width = self.cell_capacity;
        self.cells[i].get_or_insert_with(|| CellAttributeStore::new(width))
    }

    /// Append the row runs of this store, each with its cells, to `table`.
    pub fn encode(&self, dom: &mut Dom, table: NodeId, options: &StoreOptions) -> Result<usize> {
        let runs = plan_runs(self);
        for run in &runs {
            let (hidden, cells) = self.key_at(run.start);
            let row = dom.create_element(TABLE_ROW);
            write_repeat::<RowAxis>(dom, row, run.count)?;
            if hidden {
                if let Some(style) = options.hidden_row_style.as_deref() {
                    dom.set_attribute(row, STYLE_NAME, style);
                }
                dom.set_attribute(row, VISIBILITY, "collapse");
            }

            let written = match cells {
                Some(cells) => cells.encode(dom, row, options)?,
                None => 0,
            };
            // A row always holds at least one cell
            if written == 0 && self.cell_capacity > 0 {
                let filler = dom.create_element(TABLE_CELL);
                write_repeat::<CellAxis>(dom, filler, self.cell_capacity)?;
                dom.append_child(row, filler);
            }
            dom.append_child(table, row);
        }
        tracing::trace!(runs = runs.len(), capacity = self.capacity, "encoded rows");
        Ok(runs.len())
    }
}

impl RunSource for RowAttributeStore {
    type Key<'a> = RowKey<'a>;

    fn capacity(&self) -> u32 {
        self.capacity
    }

    fn len(&self) -> u32 {
        self.cells.len() as u32
    }

    fn key(&self, index: u32) -> RowKey<'_> {
        self.key_at(index)
    }

    fn default_key(&self) -> RowKey<'_> {
        (false, None)
    }
}
