//! XML to [`Dom`] conversion built on `quick-xml`.

use super::{Dom, NodeId};
use crate::common::xml::{resolve_entity, unescape_xml};
use crate::common::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

pub(super) fn parse(bytes: &[u8]) -> Result<Dom> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut dom = Dom::new();
    let mut stack: Vec<NodeId> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let id = open_element(&mut dom, &stack, e)?;
                stack.push(id);
            },
            Ok(Event::Empty(ref e)) => {
                open_element(&mut dom, &stack, e)?;
            },
            Ok(Event::Text(ref t)) => {
                if let Some(&current) = stack.last() {
                    let raw = utf8(t.to_vec(), "text content")?;
                    // Indentation between elements is not content
                    if !(raw.contains('\n') && raw.trim().is_empty()) {
                        dom.push_text(current, &unescape_xml(&raw));
                    }
                }
            },
            Ok(Event::CData(ref t)) => {
                if let Some(&current) = stack.last() {
                    dom.push_text(current, &utf8(t.to_vec(), "CDATA section")?);
                }
            },
            Ok(Event::GeneralRef(ref r)) => {
                if let Some(&current) = stack.last() {
                    let name = utf8(r.to_vec(), "entity reference")?;
                    match resolve_entity(&name) {
                        Some(ch) => {
                            let mut tmp = [0u8; 4];
                            dom.push_text(current, ch.encode_utf8(&mut tmp));
                        },
                        None => {
                            return Err(Error::XmlError(format!("Unknown entity &{};", name)));
                        },
                    }
                }
            },
            Ok(Event::End(_)) => {
                stack.pop();
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "XML parsing error at position {}: {}",
                    reader.error_position(),
                    e
                )));
            },
            _ => {},
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(Error::XmlError("Unexpected end of document".to_string()));
    }
    if dom.root().is_none() {
        return Err(Error::XmlError("No root element found".to_string()));
    }
    Ok(dom)
}

fn open_element(dom: &mut Dom, stack: &[NodeId], e: &BytesStart<'_>) -> Result<NodeId> {
    let tag = utf8(e.name().as_ref().to_vec(), "tag name")?;
    let id = dom.create_element(&tag);
    for attr in e.attributes() {
        let attr = attr?;
        let key = utf8(attr.key.as_ref().to_vec(), "attribute key")?;
        let value = utf8(attr.value.to_vec(), "attribute value")?;
        dom.set_attribute(id, &key, &unescape_xml(&value));
    }
    match stack.last() {
        Some(&parent) => dom.append_child(parent, id),
        None if dom.root().is_none() => dom.set_root(id),
        None => {
            return Err(Error::XmlError(format!(
                "Unexpected second root element <{}>",
                tag
            )));
        },
    }
    Ok(id)
}

fn utf8(bytes: Vec<u8>, what: &str) -> Result<String> {
    String::from_utf8(bytes).map_err(|_| Error::XmlError(format!("Invalid UTF-8 in {}", what)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested() {
        let xml = br#"<?xml version="1.0"?>
<table:table table:name="S1">
  <table:table-row>
    <table:table-cell office:value-type="string"><text:p>a &amp; b</text:p></table:table-cell>
    <table:table-cell table:number-columns-repeated="3"/>
  </table:table-row>
</table:table>"#;
        let dom = Dom::parse(xml).unwrap();
        let root = dom.root().unwrap();
        assert_eq!(dom.tag(root), "table:table");
        assert_eq!(dom.attribute(root, "table:name"), Some("S1"));
        assert_eq!(dom.text(root), "");

        let row = dom.first_child(root).unwrap();
        let cells: Vec<_> = dom.children(row).collect();
        assert_eq!(cells.len(), 2);
        assert_eq!(dom.text_content(cells[0]), "a & b");
        assert_eq!(dom.attribute(cells[1], "table:number-columns-repeated"), Some("3"));
        assert!(!dom.has_child_nodes(cells[1]));
    }

    #[test]
    fn test_parse_attribute_entities() {
        let dom = Dom::parse(br#"<a name="x &lt; y"/>"#).unwrap();
        let root = dom.root().unwrap();
        assert_eq!(dom.attribute(root, "name"), Some("x < y"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Dom::parse(b""), Err(Error::XmlError(_))));
        assert!(matches!(Dom::parse(b"<a><b></a>"), Err(Error::XmlError(_))));
        assert!(matches!(Dom::parse(b"<a/><b/>"), Err(Error::XmlError(_))));
    }
}
