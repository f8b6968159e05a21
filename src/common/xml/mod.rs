//! XML text helpers shared by the DOM parser and serializer.

mod escape;

pub use escape::{escape_xml, push_escaped, resolve_entity, unescape_xml};
