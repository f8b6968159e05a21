//! [`Dom`] to XML serialization.

use super::{Dom, NodeId};
use crate::common::xml::push_escaped;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

pub(super) fn to_xml_string(dom: &Dom, id: NodeId) -> String {
    let mut out = String::with_capacity(256);
    write_element(dom, id, &mut out);
    out
}

pub(super) fn to_document_string(dom: &Dom) -> String {
    let mut out = String::from(XML_DECLARATION);
    if let Some(root) = dom.root() {
        write_element(dom, root, &mut out);
    }
    out
}

fn write_element(dom: &Dom, id: NodeId, out: &mut String) {
    if dom.is_text(id) {
        push_escaped(out, dom.segment(id));
        return;
    }
    out.push('<');
    out.push_str(dom.tag(id));
    for (key, value) in dom.attributes(id) {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        push_escaped(out, value);
        out.push('"');
    }

    let mut children = dom.child_nodes(id).peekable();
    if children.peek().is_none() {
        out.push_str("/>");
        return;
    }

    out.push('>');
    for child in children {
        write_element(dom, child, out);
    }
    out.push_str("</");
    out.push_str(dom.tag(id));
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_text() {
        let xml = r#"<table:table-row><table:table-cell office:value-type="string"><text:p>1 &lt; 2</text:p></table:table-cell><table:table-cell table:number-columns-repeated="4"/></table:table-row>"#;
        let dom = Dom::parse(xml.as_bytes()).unwrap();
        let root = dom.root().unwrap();
        assert_eq!(dom.to_xml_string(root), xml);
    }

    #[test]
    fn test_document_declaration() {
        let dom = Dom::with_root("office:spreadsheet");
        assert_eq!(
            dom.to_document_string(),
            r#"<?xml version="1.0" encoding="UTF-8"?><office:spreadsheet/>"#
        );
    }

    #[test]
    fn test_mixed_content_keeps_order() {
        let xml = r#"<table:table-cell office:value-type="string"><text:p>a<text:span>b</text:span>c</text:p></table:table-cell>"#;
        let dom = Dom::parse(xml.as_bytes()).unwrap();
        let root = dom.root().unwrap();
        assert_eq!(dom.text_content(root), "abc");
        assert_eq!(dom.to_xml_string(root), xml);
    }
}
