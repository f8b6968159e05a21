//! Sheet Runs - run-length addressing for OpenDocument spreadsheet tables
//!
//! ODF tables store identical neighbouring columns, rows and cells once,
//! with a repeat count (`table:number-columns-repeated`,
//! `table:number-rows-repeated`). This crate lets callers treat such a table
//! as a dense grid without expanding it:
//!
//! - **Decoding**: map any logical column, row or cell index to the element
//!   that holds it, in time proportional to what has been touched.
//! - **Copy-on-write**: writing to one position of a shared run splits the
//!   run so that only that position changes.
//! - **Growth**: tables grow along either axis by extending trailing empty
//!   runs instead of materializing new elements.
//! - **Encoding**: per-index attributes collapse into the minimal run
//!   sequence.
//!
//! # Example - Writing into a repeated row
//!
//! ```
//! use sheet_runs::config::StoreOptions;
//! use sheet_runs::odf::{Dom, TableStore};
//!
//! # fn main() -> sheet_runs::Result<()> {
//! let xml = br#"<table:table table:name="S">
//!   <table:table-column table:number-columns-repeated="3"/>
//!   <table:table-row table:number-rows-repeated="4">
//!     <table:table-cell table:number-columns-repeated="3"/>
//!   </table:table-row>
//! </table:table>"#;
//!
//! let mut dom = Dom::parse(xml)?;
//! let mut sheet = TableStore::decode_first(&dom, StoreOptions::default())?;
//! sheet.set_cell_text(&mut dom, 2, 1, "hello")?;
//!
//! assert_eq!(sheet.cell_text(&dom, 2, 1)?.as_deref(), Some("hello"));
//! assert_eq!(sheet.cell_text(&dom, 1, 1)?, None);
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Building a sheet
//!
//! ```
//! use sheet_runs::config::StoreOptions;
//! use sheet_runs::odf::SheetBuilder;
//!
//! # fn main() -> sheet_runs::Result<()> {
//! let mut builder = SheetBuilder::new("Data", StoreOptions::default().with_column_capacity(1024));
//! builder.set_cell_value(0, 0, "id")?;
//! let xml = builder.to_xml_string()?;
//! assert!(xml.contains(r#"table:number-columns-repeated="1024""#));
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod config;

/// OpenDocument tables (requires the `odf` feature)
#[cfg(feature = "odf")]
pub mod odf;

pub use common::{Error, Result};
