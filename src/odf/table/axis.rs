//! Axis descriptors for the three compressed table dimensions.
//!
//! Columns and rows are compressed inside a `table:table`, cells inside a
//! `table:table-row`. Each axis names its run element, its repeat attribute,
//! the grouping containers that are flattened while decoding, and the
//! predicate deciding whether a run element carries anything significant.

use crate::common::{Error, Result};
use crate::odf::dom::{Dom, NodeId};
use phf::{Set, phf_set};

pub const TABLE_COLUMN: &str = "table:table-column";
pub const TABLE_ROW: &str = "table:table-row";
pub const TABLE_CELL: &str = "table:table-cell";
pub const COVERED_TABLE_CELL: &str = "table:covered-table-cell";

pub const COLUMNS_REPEATED: &str = "table:number-columns-repeated";
pub const ROWS_REPEATED: &str = "table:number-rows-repeated";

pub const STYLE_NAME: &str = "table:style-name";
pub const DEFAULT_CELL_STYLE_NAME: &str = "table:default-cell-style-name";
pub const VISIBILITY: &str = "table:visibility";
pub const VALUE_TYPE: &str = "office:value-type";
pub const CONTENT_VALIDATION_NAME: &str = "table:content-validation-name";

static COLUMN_GROUPS: Set<&'static str> = phf_set! {
    "table:table-column-group",
    "table:table-header-columns",
    "table:table-columns",
};

static ROW_GROUPS: Set<&'static str> = phf_set! {
    "table:table-row-group",
    "table:table-header-rows",
    "table:table-rows",
};

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::ColumnAxis {}
    impl Sealed for super::RowAxis {}
    impl Sealed for super::CellAxis {}
}

/// One positional dimension of a table.
pub trait Axis: sealed::Sealed + 'static {
    /// Short name used in diagnostics.
    const NAME: &'static str;
    /// Tag of freshly created run elements.
    const RUN_TAG: &'static str;
    /// Attribute holding the repeat count.
    const REPEAT_ATTR: &'static str;

    /// Whether `tag` is a run element of this axis.
    fn is_run_element(tag: &str) -> bool;

    /// Whether `tag` is a container whose children belong to this axis.
    fn is_group(tag: &str) -> bool;

    /// Whether the run element carries no significant attributes.
    fn is_empty(dom: &Dom, node: NodeId) -> bool;

    /// Attach the first run element of a scope that has none.
    fn attach_first(dom: &mut Dom, scope: NodeId, node: NodeId) {
        dom.append_child(scope, node);
    }
}

/// `table:table-column` runs inside a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnAxis;

/// `table:table-row` runs inside a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowAxis;

/// `table:table-cell` runs inside a row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellAxis;

fn is_visible(dom: &Dom, node: NodeId) -> bool {
    matches!(dom.attribute(node, VISIBILITY), None | Some("visible"))
}

impl Axis for ColumnAxis {
    const NAME: &'static str = "column";
    const RUN_TAG: &'static str = TABLE_COLUMN;
    const REPEAT_ATTR: &'static str = COLUMNS_REPEATED;

    fn is_run_element(tag: &str) -> bool {
        tag == TABLE_COLUMN
    }

    fn is_group(tag: &str) -> bool {
        COLUMN_GROUPS.contains(tag)
    }

    fn is_empty(dom: &Dom, node: NodeId) -> bool {
        !dom.has_attribute(node, STYLE_NAME)
            && !dom.has_attribute(node, DEFAULT_CELL_STYLE_NAME)
            && is_visible(dom, node)
    }

    // Column declarations precede the rows of a table
    fn attach_first(dom: &mut Dom, scope: NodeId, node: NodeId) {
        dom.prepend_child(scope, node);
    }
}

impl Axis for RowAxis {
    const NAME: &'static str = "row";
    const RUN_TAG: &'static str = TABLE_ROW;
    const REPEAT_ATTR: &'static str = ROWS_REPEATED;

    fn is_run_element(tag: &str) -> bool {
        tag == TABLE_ROW
    }

    fn is_group(tag: &str) -> bool {
        ROW_GROUPS.contains(tag)
    }

    // The row's own style name does not count; only its cells and the
    // default cell style do.
    fn is_empty(dom: &Dom, node: NodeId) -> bool {
        let mut children = dom.children(node);
        let single_child_empty = match (children.next(), children.next()) {
            (None, _) => true,
            (Some(child), None) => {
                CellAxis::is_run_element(dom.tag(child)) && CellAxis::is_empty(dom, child)
            },
            (Some(_), Some(_)) => false,
        };
        single_child_empty && !dom.has_attribute(node, DEFAULT_CELL_STYLE_NAME) && is_visible(dom, node)
    }
}

impl Axis for CellAxis {
    const NAME: &'static str = "cell";
    const RUN_TAG: &'static str = TABLE_CELL;
    const REPEAT_ATTR: &'static str = COLUMNS_REPEATED;

    fn is_run_element(tag: &str) -> bool {
        tag == TABLE_CELL || tag == COVERED_TABLE_CELL
    }

    fn is_group(_tag: &str) -> bool {
        false
    }

    fn is_empty(dom: &Dom, node: NodeId) -> bool {
        !dom.has_attribute(node, VALUE_TYPE)
            && !dom.has_attribute(node, CONTENT_VALIDATION_NAME)
            && !dom.has_child_nodes(node)
            && !dom.has_attribute(node, STYLE_NAME)
    }
}

/// Read the repeat count of a run element.
///
/// A missing attribute means a single instance. Anything that is not a
/// positive integer is a format error.
pub fn read_repeat<A: Axis>(dom: &Dom, node: NodeId) -> Result<u32> {
    let Some(raw) = dom.attribute(node, A::REPEAT_ATTR) else {
        return Ok(1);
    };
    match atoi_simd::parse::<u32, false, false>(raw.as_bytes()) {
        Ok(count) if count >= 1 => Ok(count),
        _ => Err(Error::InvalidFormat(format!(
            "Malformed {}=\"{}\" on <{}>",
            A::REPEAT_ATTR,
            raw,
            dom.tag(node)
        ))),
    }
}

/// Write the repeat count of a run element; a count of one is implicit.
///
/// A zero count is rejected and leaves the element unchanged.
pub fn write_repeat<A: Axis>(dom: &mut Dom, node: NodeId, count: u32) -> Result<()> {
    match count {
        0 => {
            return Err(Error::InvalidArgument(format!(
                "{} must be positive on <{}>",
                A::REPEAT_ATTR,
                dom.tag(node)
            )));
        },
        1 => {
            dom.remove_attribute(node, A::REPEAT_ATTR);
        },
        _ => {
            let mut buffer = itoa::Buffer::new();
            dom.set_attribute(node, A::REPEAT_ATTR, buffer.format(count));
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(dom: &mut Dom, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let node = dom.create_element(tag);
        for (key, value) in attrs {
            dom.set_attribute(node, key, value);
        }
        node
    }

    #[test]
    fn test_column_emptiness() {
        let mut dom = Dom::new();
        let plain = element(&mut dom, TABLE_COLUMN, &[]);
        let visible = element(&mut dom, TABLE_COLUMN, &[(VISIBILITY, "visible")]);
        let styled = element(&mut dom, TABLE_COLUMN, &[(STYLE_NAME, "co1")]);
        let hidden = element(&mut dom, TABLE_COLUMN, &[(VISIBILITY, "collapse")]);
        let defaulted = element(&mut dom, TABLE_COLUMN, &[(DEFAULT_CELL_STYLE_NAME, "ce1")]);
        assert!(ColumnAxis::is_empty(&dom, plain));
        assert!(ColumnAxis::is_empty(&dom, visible));
        assert!(!ColumnAxis::is_empty(&dom, styled));
        assert!(!ColumnAxis::is_empty(&dom, hidden));
        assert!(!ColumnAxis::is_empty(&dom, defaulted));
    }

    #[test]
    fn test_row_emptiness_inspects_single_cell() {
        let mut dom = Dom::new();
        let row = element(&mut dom, TABLE_ROW, &[(STYLE_NAME, "ro1")]);
        assert!(RowAxis::is_empty(&dom, row), "row style alone is not significant");

        let cell = element(&mut dom, TABLE_CELL, &[(COLUMNS_REPEATED, "1024")]);
        dom.append_child(row, cell);
        assert!(RowAxis::is_empty(&dom, row));

        dom.set_attribute(cell, VALUE_TYPE, "float");
        assert!(!RowAxis::is_empty(&dom, row));
        dom.remove_attribute(cell, VALUE_TYPE);

        let second = element(&mut dom, TABLE_CELL, &[]);
        dom.append_child(row, second);
        assert!(!RowAxis::is_empty(&dom, row));
    }

    #[test]
    fn test_row_emptiness_rejects_non_cell_child() {
        let mut dom = Dom::new();
        let row = element(&mut dom, TABLE_ROW, &[]);
        let other = element(&mut dom, "text:soft-page-break", &[]);
        dom.append_child(row, other);
        assert!(!RowAxis::is_empty(&dom, row));
    }

    #[test]
    fn test_cell_emptiness() {
        let mut dom = Dom::new();
        let cell = element(&mut dom, TABLE_CELL, &[(COLUMNS_REPEATED, "3")]);
        assert!(CellAxis::is_empty(&dom, cell));
        let validated = element(&mut dom, TABLE_CELL, &[(CONTENT_VALIDATION_NAME, "val1")]);
        assert!(!CellAxis::is_empty(&dom, validated));
        let styled = element(&mut dom, TABLE_CELL, &[(STYLE_NAME, "ce1")]);
        assert!(!CellAxis::is_empty(&dom, styled));
        let with_text = element(&mut dom, TABLE_CELL, &[]);
        let p = dom.create_element("text:p");
        dom.append_child(with_text, p);
        assert!(!CellAxis::is_empty(&dom, with_text));
    }

    #[test]
    fn test_repeat_codec() {
        let mut dom = Dom::new();
        let cell = element(&mut dom, TABLE_CELL, &[]);
        assert_eq!(read_repeat::<CellAxis>(&dom, cell).unwrap(), 1);

        write_repeat::<CellAxis>(&mut dom, cell, 1024).unwrap();
        assert_eq!(dom.attribute(cell, COLUMNS_REPEATED), Some("1024"));
        assert_eq!(read_repeat::<CellAxis>(&dom, cell).unwrap(), 1024);

        write_repeat::<CellAxis>(&mut dom, cell, 1).unwrap();
        assert!(!dom.has_attribute(cell, COLUMNS_REPEATED));
    }

    #[test]
    fn test_zero_repeat_is_rejected() {
        let mut dom = Dom::new();
        let row = element(&mut dom, TABLE_ROW, &[(ROWS_REPEATED, "7")]);
        assert!(matches!(
            write_repeat::<RowAxis>(&mut dom, row, 0),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(dom.attribute(row, ROWS_REPEATED), Some("7"));
    }

    #[test]
    fn test_malformed_repeat_is_format_error() {
        let mut dom = Dom::new();
        for bad in ["abc", "0", "-2", "", "99999999999"] {
            let row = element(&mut dom, TABLE_ROW, &[(ROWS_REPEATED, bad)]);
            assert!(
                matches!(read_repeat::<RowAxis>(&dom, row), Err(Error::InvalidFormat(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_groups() {
        assert!(ColumnAxis::is_group("table:table-header-columns"));
        assert!(!ColumnAxis::is_group("table:table-row-group"));
        assert!(RowAxis::is_group("table:table-row-group"));
        assert!(!CellAxis::is_group("table:table-row-group"));
        assert!(CellAxis::is_run_element(COVERED_TABLE_CELL));
    }
}
