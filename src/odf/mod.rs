//! OpenDocument table support.

/// Arena DOM with quick-xml parsing and serialization
pub mod dom;
/// Column, row and cell runs of `table:table`
pub mod table;

pub use dom::{Dom, NodeId};
pub use table::{PositionalRunDecoder, SheetBuilder, TableStore};
