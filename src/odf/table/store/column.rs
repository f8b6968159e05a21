//! Attribute arrays for the columns of a table.

use super::{RunSource, plan_runs};
use crate::common::Result;
use crate::config::StoreOptions;
use crate::odf::dom::{Dom, NodeId};
use crate::odf::table::axis::{ColumnAxis, STYLE_NAME, TABLE_COLUMN, VISIBILITY, write_repeat};
use fixedbitset::FixedBitSet;

/// Attributes of one column position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnRecord {
    pub hidden: bool,
    /// Column style name, e.g. a width class.
    pub style: Option<String>,
}

/// Growable per-column attribute arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnAttributeStore {
    capacity: u32,
    hidden: FixedBitSet,
    styles: Vec<Option<String>>,
}

type ColumnKey<'a> = (bool, Option<&'a str>);

impl ColumnAttributeStore {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn len(&self) -> u32 {
        self.styles.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    pub fn grow_capacity(&mut self, extra: u32) {
        self.capacity = self.capacity.saturating_add(extra);
    }

    fn ensure(&mut self, index: u32) -> usize {
        let i = index as usize;
        if i >= self.styles.len() {
            self.styles.resize(i + 1, None);
            self.hidden.grow(i + 1);
        }
        self.capacity = self.capacity.max(index + 1);
        i
    }

    fn key_at(&self, index: u32) -> ColumnKey<'_> {
        let i = index as usize;
        match self.styles.get(i) {
            Some(style) => (self.hidden.contains(i), style.as_deref()),
            None => (false, None),
        }
    }

    pub fn get(&self, index: u32) -> ColumnRecord {
        let (hidden, style) = self.key_at(index);
        ColumnRecord {
            hidden,
            style: style.map(str::to_string),
        }
    }

    pub fn set(&mut self, index: u32, record: ColumnRecord) {
        let i = self.ensure(index);
        self.hidden.set(i, record.hidden);
        self.styles[i] = record.style;
    }

    pub fn hidden(&self, index: u32) -> bool {
        self.key_at(index).0
    }

    pub fn set_hidden(&mut self, index: u32, hidden: bool) {
        let i = self.ensure(index);
        self.hidden.set(i, hidden);
    }

    pub fn style(&self, index: u32) -> Option<&str> {
        self.key_at(index).1
    }

    pub fn set_style(&mut self, index: u32, style: Option<&str>) {
        let i = self.ensure(index);
        self.styles[i] = style.map(str::to_string);
    }

    /// Append the column runs of this store to `table`.
    ///
    /// Runs are planned on the attributes as written, so a hidden unstyled
    /// column shares a run with hidden columns of the hidden-column style.
    pub fn encode(&self, dom: &mut Dom, table: NodeId, options: &StoreOptions) -> Result<usize> {
        let emitted = EmittedColumns {
            store: self,
            hidden_style: options.hidden_column_style.as_deref(),
        };
        let runs = plan_runs(&emitted);
        for run in &runs {
            let (hidden, style) = emitted.key(run.start);
            let column = dom.create_element(TABLE_COLUMN);
            write_repeat::<ColumnAxis>(dom, column, run.count)?;
            if let Some(style) = style {
                dom.set_attribute(column, STYLE_NAME, style);
            }
            if hidden {
                dom.set_attribute(column, VISIBILITY, "collapse");
            }
            dom.append_child(table, column);
        }
        tracing::trace!(runs = runs.len(), capacity = self.capacity, "encoded columns");
        Ok(runs.len())
    }
}

/// Column attributes as they are written to the document.
struct EmittedColumns<'s> {
    store: &'s ColumnAttributeStore,
    hidden_style: Option<&'s str>,
}

impl RunSource for EmittedColumns<'_> {
    type Key<'a> = ColumnKey<'a>
    where
        Self: 'a;

    fn capacity(&self) -> u32 {
        self.store.capacity
    }

    fn len(&self) -> u32 {
        self.store.len()
    }

    fn key(&self, index: u32) -> ColumnKey<'_> {
        match self.store.key_at(index) {
            (true, None) => (true, self.hidden_style),
            key => key,
        }
    }

    fn default_key(&self) -> ColumnKey<'_> {
        (false, None)
    }
}
