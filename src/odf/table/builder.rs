//! Builder for encoding a table from per-index attributes.
//!
//! The builder is the write-side counterpart of [`TableStore`](super::TableStore):
//! attributes are set per coordinate, the column width is shared by every row,
//! and [`SheetBuilder::encode`] emits the minimal column, row and cell runs.

use super::axis::{ColumnAxis, TABLE_COLUMN, write_repeat};
use super::store::{CellAttributeStore, CellRecord, ColumnAttributeStore, RowAttributeStore, RowRecord};
use crate::common::{Error, Result};
use crate::config::StoreOptions;
use crate::odf::dom::{Dom, NodeId};

/// Builder for one `table:table` element.
///
/// # Examples
///
/// ```
/// use sheet_runs::config::StoreOptions;
/// use sheet_runs::odf::table::SheetBuilder;
///
/// # fn main() -> sheet_runs::Result<()> {
/// let mut builder = SheetBuilder::new("Sheet1", StoreOptions::default().with_column_capacity(5));
/// builder.set_cell_value(0, 2, "X")?;
/// let xml = builder.to_xml_string()?;
/// assert!(xml.contains(r#"table:number-columns-repeated="2""#));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SheetBuilder {
    name: String,
    options: StoreOptions,
    columns: ColumnAttributeStore,
    rows: RowAttributeStore,
}

impl SheetBuilder {
    /// Create a builder sized by the declared capacities in `options`.
    pub fn new(name: &str, options: StoreOptions) -> Self {
        let columns = options.column_capacity.unwrap_or(0);
        let rows = options.row_capacity.unwrap_or(0);
        Self {
            name: name.to_string(),
            columns: ColumnAttributeStore::new(columns),
            rows: RowAttributeStore::new(rows, columns),
            options,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_count(&self) -> u32 {
        self.columns.capacity()
    }

    pub fn row_count(&self) -> u32 {
        self.rows.capacity()
    }

    pub fn columns(&self) -> &ColumnAttributeStore {
        &self.columns
    }

    pub fn rows(&self) -> &RowAttributeStore {
        &self.rows
    }

    /// Options that let a decoder reproduce this sheet's capacities.
    pub fn declared_options(&self) -> StoreOptions {
        StoreOptions {
            column_capacity: Some(self.column_count()),
            row_capacity: Some(self.row_count()),
            ..self.options.clone()
        }
    }

    /// Add `extra` columns to the sheet and to every row.
    pub fn grow_columns(&mut self, extra: u32) -> Result<&mut Self> {
        let target = self.columns.capacity().checked_add(extra);
        if target.is_none_or(|t| t > self.options.max_columns) {
            return Err(Error::InvalidArgument(format!(
                "Cannot grow {} columns by {}: limit is {}",
                self.columns.capacity(),
                extra,
                self.options.max_columns
            )));
        }
        self.columns.grow_capacity(extra);
        self.rows.grow_cell_capacity(extra);
        Ok(self)
    }

    pub fn grow_rows(&mut self, extra: u32) -> Result<&mut Self> {
        let target = self.rows.capacity().checked_add(extra);
        if target.is_none_or(|t| t > self.options.max_rows) {
            return Err(Error::InvalidArgument(format!(
                "Cannot grow {} rows by {}: limit is {}",
                self.rows.capacity(),
                extra,
                self.options.max_rows
            )));
        }
        self.rows.grow_capacity(extra);
        Ok(self)
    }

    fn ensure_cell(&mut self, row: u32, col: u32) -> Result<()> {
        if col >= self.columns.capacity() {
            self.grow_columns(col - self.columns.capacity() + 1)?;
        }
        if row >= self.rows.capacity() {
            self.grow_rows(row - self.rows.capacity() + 1)?;
        }
        Ok(())
    }

    fn ensure_column(&mut self, col: u32) -> Result<()> {
        if col >= self.columns.capacity() {
            self.grow_columns(col - self.columns.capacity() + 1)?;
        }
        Ok(())
    }

    /// Attributes of a cell; unset cells hold the default record.
    pub fn cell(&self, row: u32, col: u32) -> CellRecord {
        self.rows
            .cells(row)
            .map(|cells| cells.get(col))
            .unwrap_or_default()
    }

    pub fn set_cell(&mut self, row: u32, col: u32, record: CellRecord) -> Result<&mut Self> {
        self.ensure_cell(row, col)?;
        self.rows.cells_mut(row).set(col, record);
        Ok(self)
    }

    pub fn set_cell_value(&mut self, row: u32, col: u32, value: &str) -> Result<&mut Self> {
        self.ensure_cell(row, col)?;
        self.rows.cells_mut(row).set_value(col, Some(value));
        Ok(self)
    }

    pub fn set_cell_alternate_style(&mut self, row: u32, col: u32, alternate: bool) -> Result<&mut Self> {
        self.ensure_cell(row, col)?;
        self.rows.cells_mut(row).set_alternate_style(col, alternate);
        Ok(self)
    }

    pub fn set_cell_validation(&mut self, row: u32, col: u32, name: Option<&str>) -> Result<&mut Self> {
        self.ensure_cell(row, col)?;
        self.rows.cells_mut(row).set_validation(col, name);
        Ok(self)
    }

    /// Replace the cells of a whole row.
    pub fn set_row_cells(&mut self, row: u32, cells: CellAttributeStore) -> Result<&mut Self> {
        if cells.capacity() > self.columns.capacity() {
            self.grow_columns(cells.capacity() - self.columns.capacity())?;
        }
        self.ensure_cell(row, 0)?;
        let mut cells = cells;
        cells.grow_capacity(self.columns.capacity() - cells.capacity());
        let hidden = self.rows.hidden(row);
        self.rows.set(
            row,
            RowRecord {
                hidden,
                cells: Some(cells),
            },
        );
        Ok(self)
    }

    pub fn set_column_hidden(&mut self, col: u32, hidden: bool) -> Result<&mut Self> {
        self.ensure_column(col)?;
        self.columns.set_hidden(col, hidden);
        Ok(self)
    }

    pub fn set_column_style(&mut self, col: u32, style: Option<&str>) -> Result<&mut Self> {
        self.ensure_column(col)?;
        self.columns.set_style(col, style);
        Ok(self)
    }

    pub fn set_row_hidden(&mut self, row: u32, hidden: bool) -> Result<&mut Self> {
        if row >= self.rows.capacity() {
            self.grow_rows(row - self.rows.capacity() + 1)?;
        }
        self.rows.set_hidden(row, hidden);
        Ok(self)
    }

    /// Encode the sheet into a new, detached `table:table` element.
    pub fn encode(&self, dom: &mut Dom) -> Result<NodeId> {
        let table = dom.create_element("table:table");
        dom.set_attribute(table, "table:name", &self.name);

        let written = self.columns.encode(dom, table, &self.options)?;
        if written == 0 && self.columns.capacity() > 0 {
            let column = dom.create_element(TABLE_COLUMN);
            write_repeat::<ColumnAxis>(dom, column, self.columns.capacity())?;
            dom.append_child(table, column);
        }
        let rows = self.rows.encode(dom, table, &self.options)?;

        tracing::debug!(
            sheet = %self.name,
            columns = self.columns.capacity(),
            rows = self.rows.capacity(),
            row_runs = rows,
            "encoded sheet"
        );
        Ok(table)
    }

    /// Encode the sheet as a standalone XML fragment.
    pub fn to_xml_string(&self) -> Result<String> {
        let mut dom = Dom::new();
        let table = self.encode(&mut dom)?;
        dom.set_root(table);
        Ok(dom.to_xml_string(table))
    }
}
