//! Decoded view of one `table:table` with coupled column, row and cell axes.
//!
//! The column and row decoders are built eagerly; the cell decoder of a row is
//! built the first time a cell of that row element is looked up. Every cell
//! decoder is sized by the sheet's column count, and growing the columns
//! cascades the same growth into every cell decoder built so far. Rows whose
//! cells were never decoded pick up the new width when they are.

use super::axis::{Axis, CellAxis, VALUE_TYPE, read_repeat};
use super::decoder::{CellDecoder, ColumnDecoder, Position, RowDecoder};
use crate::common::{Error, Result};
use crate::config::StoreOptions;
use crate::odf::dom::{Dom, NodeId};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Run-length store over the columns, rows and cells of a table element.
#[derive(Debug, Clone)]
pub struct TableStore {
    table: NodeId,
    options: StoreOptions,
    columns: ColumnDecoder,
    rows: RowDecoder,
    cells: HashMap<NodeId, CellDecoder>,
}

impl TableStore {
    /// Decode the table element `table`.
    ///
    /// The column capacity covers the declared column count, the column runs
    /// and the widest row, so every cell decoder satisfies its capacity bound.
    pub fn decode(dom: &Dom, table: NodeId, options: StoreOptions) -> Result<Self> {
        options.validate()?;
        let rows = RowDecoder::decode(dom, table, options.row_capacity)?;

        let mut widest = 0u32;
        for run in rows.runs() {
            let mut width = 0u32;
            for cell in dom.children(run.node) {
                if CellAxis::is_run_element(dom.tag(cell)) {
                    width = width.saturating_add(read_repeat::<CellAxis>(dom, cell)?);
                }
            }
            widest = widest.max(width);
        }

        let declared = options.column_capacity.unwrap_or(0).max(widest);
        let columns = ColumnDecoder::decode(dom, table, Some(declared))?;
        if widest > columns.covered() && columns.covered() > 0 {
            tracing::warn!(
                columns = columns.covered(),
                widest,
                "row is wider than the declared columns; widening the sheet"
            );
        }

        let max_columns = options.max_columns;
        let max_rows = options.max_rows;
        Ok(Self {
            table,
            columns: columns.with_limit(max_columns),
            rows: rows.with_limit(max_rows),
            cells: HashMap::new(),
            options,
        })
    }

    /// Decode the first `table:table` under the document root.
    pub fn decode_first(dom: &Dom, options: StoreOptions) -> Result<Self> {
        let table = dom
            .root()
            .and_then(|root| dom.find_first(root, "table:table"))
            .ok_or_else(|| Error::InvalidFormat("Document contains no table:table".to_string()))?;
        Self::decode(dom, table, options)
    }

    pub fn table(&self) -> NodeId {
        self.table
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn column_count(&self) -> u32 {
        self.columns.capacity()
    }

    pub fn row_count(&self) -> u32 {
        self.rows.capacity()
    }

    pub fn columns(&self) -> &ColumnDecoder {
        &self.columns
    }

    pub fn rows(&self) -> &RowDecoder {
        &self.rows
    }

    /// Cell decoder of a row element, if it has been built.
    pub fn row_cells(&self, row: NodeId) -> Option<&CellDecoder> {
        self.cells.get(&row)
    }

    fn cell_decoder(&mut self, dom: &Dom, row: NodeId) -> Result<&mut CellDecoder> {
        match self.cells.entry(row) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let decoder = CellDecoder::decode(dom, row, Some(self.columns.capacity()))?
                    .with_limit(self.options.max_columns);
                Ok(entry.insert(decoder))
            },
        }
    }

    /// Column lookup without modifying the document.
    pub fn column(&mut self, dom: &Dom, index: i64) -> Option<Position> {
        self.columns.lookup_read_only(dom, index)
    }

    /// Column element for writing, split from its run and grown into place.
    pub fn column_mut(&mut self, dom: &mut Dom, index: i64) -> Result<NodeId> {
        let col = self.columns.check_writable(index)?;
        self.ensure_columns(dom, col)?;
        self.columns.lookup_mutable(dom, index)
    }

    /// Row lookup without modifying the document.
    pub fn row(&mut self, dom: &Dom, index: i64) -> Option<Position> {
        self.rows.lookup_read_only(dom, index)
    }

    /// Row element for writing, split from its run and grown into place.
    pub fn row_mut(&mut self, dom: &mut Dom, index: i64) -> Result<NodeId> {
        self.rows.check_writable(index)?;
        self.rows.lookup_mutable(dom, index)
    }

    /// Cell lookup across both axes without modifying the document.
    ///
    /// `Ok(None)` means the coordinate lies outside the sheet. Decoding the
    /// row's cells on first access may fail on a malformed repeat count.
    pub fn cell(&mut self, dom: &Dom, row: i64, col: i64) -> Result<Option<Position>> {
        if col < 0 || col >= i64::from(self.columns.capacity()) {
            return Ok(None);
        }
        match self.rows.lookup_read_only(dom, row) {
            None => Ok(None),
            Some(Position::Empty) => Ok(Some(Position::Empty)),
            Some(Position::Node(row_node)) => {
                Ok(self.cell_decoder(dom, row_node)?.lookup_read_only(dom, col))
            },
        }
    }

    /// Cell element for writing.
    ///
    /// Splits the row run and then the cell run so the element belongs to
    /// this coordinate alone. Coordinates past the sheet grow it. Both
    /// coordinates are checked before anything grows, so a rejected write
    /// leaves the sheet as it was.
    pub fn cell_mut(&mut self, dom: &mut Dom, row: i64, col: i64) -> Result<NodeId> {
        if row < 0 || col < 0 {
            return Err(Error::InvalidArgument(format!(
                "Cell ({}, {}) has a negative coordinate",
                row, col
            )));
        }
        self.rows.check_writable(row)?;
        let col_index = self.columns.check_writable(col)?;
        self.ensure_columns(dom, col_index)?;
        let row_node = self.rows.lookup_mutable(dom, row)?;
        self.cell_decoder(dom, row_node)?.lookup_mutable(dom, col)
    }

    fn ensure_columns(&mut self, dom: &mut Dom, col: u32) -> Result<()> {
        let capacity = self.columns.capacity();
        if col >= capacity {
            self.grow_columns(dom, col - capacity + 1)?;
        }
        Ok(())
    }

    /// Add `extra` columns and propagate them to every decoded row.
    pub fn grow_columns(&mut self, dom: &mut Dom, extra: u32) -> Result<()> {
        self.columns.grow_capacity(dom, extra)?;
        for decoder in self.cells.values_mut() {
            decoder.grow_capacity(dom, extra)?;
        }
        Ok(())
    }

    pub fn grow_rows(&mut self, dom: &mut Dom, extra: u32) -> Result<()> {
        self.rows.grow_capacity(dom, extra)
    }

    /// Whether the coordinate is outside the sheet or holds nothing.
    pub fn is_blank(&mut self, dom: &Dom, row: i64, col: i64) -> Result<bool> {
        Ok(matches!(self.cell(dom, row, col)?, None | Some(Position::Empty)))
    }

    /// Store a string value in a cell, replacing its previous content.
    pub fn set_cell_text(&mut self, dom: &mut Dom, row: i64, col: i64, text: &str) -> Result<()> {
        let cell = self.cell_mut(dom, row, col)?;
        dom.clear_children(cell);
        dom.set_attribute(cell, VALUE_TYPE, "string");
        let paragraph = dom.create_element("text:p");
        dom.set_text(paragraph, text);
        dom.append_child(cell, paragraph);
        Ok(())
    }

    /// Displayed text of a cell, if it has any content.
    pub fn cell_text(&mut self, dom: &Dom, row: i64, col: i64) -> Result<Option<String>> {
        Ok(self
            .cell(dom, row, col)?
            .and_then(|position| position.node())
            .filter(|node| dom.has_child_nodes(*node))
            .map(|node| dom.text_content(node)))
    }

    /// Repeat count written on the cell element at a coordinate.
    pub fn cell_span(&mut self, dom: &Dom, row: i64, col: i64) -> Result<Option<u32>> {
        match self.cell(dom, row, col)? {
            Some(Position::Node(node)) => Ok(Some(read_repeat::<CellAxis>(dom, node)?)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = r#"<table:table table:name="Sheet1">
  <table:table-column table:style-name="co1"/>
  <table:table-column table:number-columns-repeated="3"/>
  <table:table-row>
    <table:table-cell office:value-type="string"><text:p>h1</text:p></table:table-cell>
    <table:table-cell table:number-columns-repeated="3"/>
  </table:table-row>
  <table:table-row table:number-rows-repeated="4">
    <table:table-cell table:number-columns-repeated="4"/>
  </table:table-row>
</table:table>"#;

    fn load() -> (Dom, TableStore) {
        let dom = Dom::parse(SHEET.as_bytes()).unwrap();
        let store = TableStore::decode_first(&dom, StoreOptions::default()).unwrap();
        (dom, store)
    }

    #[test]
    fn test_decode_counts() {
        let (_, store) = load();
        assert_eq!(store.column_count(), 4);
        assert_eq!(store.row_count(), 5);
    }

    #[test]
    fn test_read_cells() {
        let (dom, mut store) = load();
        assert_eq!(store.cell_text(&dom, 0, 0).unwrap().as_deref(), Some("h1"));
        assert!(store.is_blank(&dom, 0, 1).unwrap());
        assert!(store.is_blank(&dom, 3, 2).unwrap());
        assert_eq!(store.cell(&dom, 0, 4).unwrap(), None);
        assert_eq!(store.cell(&dom, 5, 0).unwrap(), None);
        assert_eq!(store.cell(&dom, -1, 0).unwrap(), None);
    }

    #[test]
    fn test_write_splits_row_and_cell() {
        let (mut dom, mut store) = load();
        store.set_cell_text(&mut dom, 2, 1, "x").unwrap();
        assert_eq!(store.cell_text(&dom, 2, 1).unwrap().as_deref(), Some("x"));
        for (row, col) in [(1, 1), (3, 1), (2, 0), (2, 2)] {
            assert!(store.is_blank(&dom, row, col).unwrap(), "({row}, {col})");
        }
        let repeats: Vec<_> = store.rows().runs().map(|r| r.repeat).collect();
        assert_eq!(repeats, vec![1, 1, 1, 2]);
        assert_eq!(store.row_count(), 5);
    }

    #[test]
    fn test_write_beyond_sheet_grows_both_axes() {
        let (mut dom, mut store) = load();
        // decode row 0's cells before the growth so the cascade reaches it
        assert!(store.cell(&dom, 0, 3).unwrap().is_some());
        store.set_cell_text(&mut dom, 7, 6, "far").unwrap();
        assert_eq!(store.column_count(), 7);
        assert_eq!(store.row_count(), 8);
        assert_eq!(store.cell_text(&dom, 7, 6).unwrap().as_deref(), Some("far"));

        let first_row = store.rows().runs().next().unwrap().node;
        assert_eq!(store.row_cells(first_row).unwrap().capacity(), 7);
        assert_eq!(store.cell(&dom, 0, 6).unwrap(), Some(Position::Empty));
        // the empty trailing column run absorbed the growth
        let columns: Vec<_> = store.columns().runs().map(|r| r.repeat).collect();
        assert_eq!(columns, vec![1, 6]);
    }

    #[test]
    fn test_cell_span() {
        let (dom, mut store) = load();
        assert_eq!(store.cell_span(&dom, 0, 0).unwrap(), Some(1));
        assert_eq!(store.cell_span(&dom, 0, 2).unwrap(), None);
    }

    #[test]
    fn test_negative_write_rejected() {
        let (mut dom, mut store) = load();
        assert!(matches!(store.cell_mut(&mut dom, 0, -1), Err(Error::InvalidArgument(_))));
        assert!(matches!(store.cell_mut(&mut dom, -1, 0), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_growth_limit() {
        let mut dom = Dom::parse(SHEET.as_bytes()).unwrap();
        let options = StoreOptions {
            max_columns: 5,
            ..StoreOptions::default()
        };
        let mut store = TableStore::decode_first(&dom, options).unwrap();
        store.cell_mut(&mut dom, 0, 4).unwrap();
        assert!(store.cell_mut(&mut dom, 0, 5).is_err());
    }

    #[test]
    fn test_write_at_top_of_range_is_rejected() {
        let (mut dom, mut store) = load();
        let nodes = dom.len();
        let top = i64::from(u32::MAX);
        for (row, col) in [(top, 0), (0, top), (top, top)] {
            assert!(
                matches!(store.cell_mut(&mut dom, row, col), Err(Error::InvalidArgument(_))),
                "({row}, {col})"
            );
        }
        assert!(matches!(store.row_mut(&mut dom, top), Err(Error::InvalidArgument(_))));
        assert!(matches!(store.column_mut(&mut dom, top), Err(Error::InvalidArgument(_))));
        assert_eq!(store.column_count(), 4);
        assert_eq!(store.row_count(), 5);
        assert_eq!(dom.len(), nodes);
        let xml = dom.to_xml_string(store.table());
        assert!(!xml.contains(r#"repeated="0""#));
    }

    #[test]
    fn test_rejected_row_leaves_columns_unchanged() {
        let mut dom = Dom::parse(SHEET.as_bytes()).unwrap();
        let options = StoreOptions {
            max_rows: 5,
            ..StoreOptions::default()
        };
        let mut store = TableStore::decode_first(&dom, options).unwrap();
        let nodes = dom.len();
        assert!(matches!(store.cell_mut(&mut dom, 5, 9), Err(Error::InvalidArgument(_))));
        assert_eq!(store.column_count(), 4);
        assert_eq!(store.row_count(), 5);
        assert_eq!(dom.len(), nodes);
        let columns: Vec<_> = store.columns().runs().map(|r| r.repeat).collect();
        assert_eq!(columns, vec![1, 3]);

        store.cell_mut(&mut dom, 4, 9).unwrap();
        assert_eq!(store.column_count(), 10);
    }

    #[test]
    fn test_growth_appends_run_after_non_empty_last_cell() {
        let xml = r#"<table:table><table:table-column table:number-columns-repeated="2"/><table:table-row><table:table-cell/><table:table-cell office:value-type="string"><text:p>b</text:p></table:table-cell></table:table-row></table:table>"#;
        let mut dom = Dom::parse(xml.as_bytes()).unwrap();
        let mut store = TableStore::decode_first(&dom, StoreOptions::default()).unwrap();
        assert_eq!(store.cell_text(&dom, 0, 1).unwrap().as_deref(), Some("b"));

        store.grow_columns(&mut dom, 3).unwrap();
        let row = store.rows().runs().next().unwrap().node;
        let cells = store.row_cells(row).unwrap();
        assert_eq!(cells.capacity(), 5);
        let repeats: Vec<_> = cells.runs().map(|r| r.repeat).collect();
        assert_eq!(repeats, vec![1, 1, 3]);
        let appended = cells.last_run().unwrap().node;
        assert_eq!(dom.last_child(row), Some(appended));
        assert_eq!(dom.attribute(appended, "table:number-columns-repeated"), Some("3"));

        assert_eq!(store.cell(&dom, 0, 4).unwrap(), Some(Position::Empty));
        assert_eq!(store.cell_text(&dom, 0, 1).unwrap().as_deref(), Some("b"));
        store.set_cell_text(&mut dom, 0, 4, "e").unwrap();
        assert_eq!(store.cell_text(&dom, 0, 4).unwrap().as_deref(), Some("e"));
        assert!(store.is_blank(&dom, 0, 3).unwrap());
    }

    #[test]
    fn test_wide_row_widens_columns() {
        let xml = r#"<table:table><table:table-column/><table:table-row><table:table-cell table:number-columns-repeated="6"/></table:table-row></table:table>"#;
        let dom = Dom::parse(xml.as_bytes()).unwrap();
        let store = TableStore::decode_first(&dom, StoreOptions::default()).unwrap();
        assert_eq!(store.column_count(), 6);
        assert_eq!(store.columns().covered(), 1);
    }

    #[test]
    fn test_column_write() {
        let (mut dom, mut store) = load();
        let node = store.column_mut(&mut dom, 2).unwrap();
        dom.set_attribute(node, "table:style-name", "co3");
        let columns: Vec<_> = store.columns().runs().map(|r| r.repeat).collect();
        assert_eq!(columns, vec![1, 1, 1, 1]);
        assert_eq!(store.column(&dom, 2), Some(Position::Node(node)));
        assert_eq!(store.column(&dom, 3), Some(Position::Empty));
    }

    #[test]
    fn test_malformed_row_cells() {
        let xml = r#"<table:table><table:table-row><table:table-cell table:number-columns-repeated="two"/></table:table-row></table:table>"#;
        let dom = Dom::parse(xml.as_bytes()).unwrap();
        assert!(matches!(
            TableStore::decode_first(&dom, StoreOptions::default()),
            Err(Error::InvalidFormat(_))
        ));
    }
}
