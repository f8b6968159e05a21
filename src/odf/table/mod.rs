//! Run-length addressing of `table:table` content.
//!
//! ODF collapses identical neighbouring columns, rows and cells into one
//! element with a repeat attribute. The types here present such a table as a
//! dense grid:
//!
//! - [`PositionalRunDecoder`] maps a logical index on one axis to the element
//!   that carries it, splitting shared elements before they are written.
//! - [`TableStore`] couples the column, row and cell axes of a decoded table.
//! - The attribute stores and [`SheetBuilder`] go the other way, from
//!   per-index attributes to the minimal run sequence.

pub mod axis;
pub mod builder;
pub mod decoder;
pub mod run;
pub mod sheet;
pub mod splitter;
pub mod store;

pub use axis::{Axis, CellAxis, ColumnAxis, RowAxis, read_repeat, write_repeat};
pub use builder::SheetBuilder;
pub use decoder::{CellDecoder, ColumnDecoder, Position, PositionalRunDecoder, RowDecoder};
pub use run::{Reference, Run, RunId, RunTable};
pub use sheet::TableStore;
pub use splitter::{Split, split};
pub use store::{
    CellAttributeStore, CellRecord, ColumnAttributeStore, ColumnRecord, PlannedRun, RowAttributeStore, RowRecord,
};
