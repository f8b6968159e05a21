//! Attribute arrays for the cells of one row.

use super::{RunSource, plan_runs};
use crate::common::Result;
use crate::config::StoreOptions;
use crate::odf::dom::{Dom, NodeId};
use crate::odf::table::axis::{
    CONTENT_VALIDATION_NAME, CellAxis, STYLE_NAME, TABLE_CELL, VALUE_TYPE, write_repeat,
};
use fixedbitset::FixedBitSet;

/// Attributes of one cell position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellRecord {
    /// String value shown in the cell.
    pub value: Option<String>,
    /// Use the alternate cell style instead of the default one.
    pub alternate_style: bool,
    /// Name of the content validation applied to the cell.
    pub validation: Option<String>,
}

impl CellRecord {
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }
}

/// Growable per-column arrays of cell attributes.
#[derive(Debug, Clone, Default)]
pub struct CellAttributeStore {
    capacity: u32,
    values: Vec<Option<String>>,
    alternate_style: FixedBitSet,
    validations: Vec<Option<String>>,
}

type CellKey<'a> = (Option<&'a str>, bool, Option<&'a str>);

impl CellAttributeStore {
    /// Create a store for a row of `capacity` columns.
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Length of the materialized arrays.
    pub fn len(&self) -> u32 {
        self.values.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Add `extra` columns of default cells.
    pub fn grow_capacity(&mut self, extra: u32) {
        self.capacity = self.capacity.saturating_add(extra);
    }

    fn ensure(&mut self, index: u32) -> usize {
        let i = index as usize;
        if i >= self.values.len() {
            self.values.resize(i + 1, None);
            self.validations.resize(i + 1, None);
            self.alternate_style.grow(i + 1);
        }
        self.capacity = self.capacity.max(index + 1);
        i
    }

    fn key_at(&self, index: u32) -> CellKey<'_> {
        let i = index as usize;
        if i >= self.values.len() {
            return (None, false, None);
        }
        (
            self.values[i].as_deref(),
            self.alternate_style.contains(i),
            self.validations[i].as_deref(),
        )
    }

    /// Record at `index`; past the arrays this is the default record.
    pub fn get(&self, index: u32) -> CellRecord {
        let (value, alternate_style, validation) = self.key_at(index);
        CellRecord {
            value: value.map(str::to_string),
            alternate_style,
            validation: validation.map(str::to_string),
        }
    }

    /// Replace every attribute of `index`.
    pub fn set(&mut self, index: u32, record: CellRecord) {
        let i = self.ensure(index);
        self.values[i] = record.value;
        self.alternate_style.set(i, record.alternate_style);
        self.validations[i] = record.validation;
    }

    pub fn value(&self, index: u32) -> Option<&str> {
        self.key_at(index).0
    }

    pub fn set_value(&mut self, index: u32, value: Option<&str>) {
        let i = self.ensure(index);
        self.values[i] = value.map(str::to_string);
    }

    pub fn alternate_style(&self, index: u32) -> bool {
        self.key_at(index).1
    }

    pub fn set_alternate_style(&mut self, index: u32, alternate: bool) {
        let i = self.ensure(index);
        self.alternate_style.set(i, alternate);
    }

    pub fn validation(&self, index: u32) -> Option<&str> {
        self.key_at(index).2
    }

    pub fn set_validation(&mut self, index: u32, name: Option<&str>) {
        let i = self.ensure(index);
        self.validations[i] = name.map(str::to_string);
    }

    /// Whether every position holds the default record.
    pub fn is_blank(&self) -> bool {
        (0..self.len()).all(|i| self.key_at(i) == (None, false, None))
    }

    /// Append the cell runs of this store to `row`.
    ///
    /// Returns the number of runs written.
    pub fn encode(&self, dom: &mut Dom, row: NodeId, options: &StoreOptions) -> Result<usize> {
        let runs = plan_runs(self);
        for run in &runs {
            let (value, alternate, validation) = self.key_at(run.start);
            let cell = dom.create_element(TABLE_CELL);
            write_repeat::<CellAxis>(dom, cell, run.count)?;

            if value.is_some() {
                dom.set_attribute(cell, VALUE_TYPE, "string");
            }
            let style = if alternate {
                Some(options.alternate_cell_style.as_str())
            } else {
                value.and(options.default_cell_style.as_deref())
            };
            if let Some(style) = style {
                dom.set_attribute(cell, STYLE_NAME, style);
            }
            if let Some(validation) = validation {
                dom.set_attribute(cell, CONTENT_VALIDATION_NAME, validation);
            }
            if let Some(value) = value {
                let paragraph = dom.create_element("text:p");
                dom.set_text(paragraph, value);
                dom.append_child(cell, paragraph);
            }
            dom.append_child(row, cell);
        }
        tracing::trace!(runs = runs.len(), capacity = self.capacity, "encoded cells");
        Ok(runs.len())
    }
}

impl RunSource for CellAttributeStore {
    type Key<'a> = CellKey<'a>;

    fn capacity(&self) -> u32 {
        self.capacity
    }

    fn len(&self) -> u32 {
        self.values.len() as u32
    }

    fn key(&self, index: u32) -> CellKey<'_> {
        self.key_at(index)
    }

    fn default_key(&self) -> CellKey<'_> {
        (None, false, None)
    }
}

// Equal when every logical position holds the same record, regardless of how
// far each side's arrays were materialized.
impl PartialEq for CellAttributeStore {
    fn eq(&self, other: &Self) -> bool {
        self.capacity == other.capacity
            && (0..self.len().max(other.len())).all(|i| self.key_at(i) == other.key_at(i))
    }
}

impl Eq for CellAttributeStore {}
