//! Index-addressed element tree used as the host document for table stores.
//!
//! Nodes live in a single arena owned by [`Dom`] and are addressed by
//! [`NodeId`]. Parent and sibling links are stored as ids, so there is no
//! reference cycle between an element, its container and its siblings.
//!
//! The operations mirror the small capability set the run store needs from a
//! document: create an element, read and write attributes, insert an element
//! after another one, and walk first-child / next-sibling links.
//!
//! Character data is kept as text nodes interleaved with the child elements,
//! so mixed content keeps its order. The element navigation methods
//! ([`Dom::first_child`], [`Dom::next_sibling`], [`Dom::children`]) skip text
//! nodes; [`Dom::child_nodes`] visits both.

mod parser;
mod writer;

use crate::common::{Error, Result};
use smallvec::SmallVec;

/// Stable handle to a node inside a [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

type Attributes = SmallVec<[(String, String); 4]>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Kind {
    #[default]
    Element,
    Text,
}

#[derive(Debug, Clone, Default)]
struct Node {
    kind: Kind,
    tag: String,
    attributes: Attributes,
    text: String,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

/// Arena of XML elements and text nodes.
///
/// Ids of removed nodes are recycled by later allocations.
#[derive(Debug, Clone, Default)]
pub struct Dom {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
}

impl Dom {
    /// Create an empty document without a root element.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document whose root element has the given tag.
    pub fn with_root(tag: &str) -> Self {
        let mut dom = Self::new();
        let root = dom.create_element(tag);
        dom.root = Some(root);
        dom
    }

    /// Parse a document from XML bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        parser::parse(bytes)
    }

    /// Root element, if the document has one.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub(crate) fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    /// Number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Whether the arena holds no live nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.index()] = node;
                id
            },
            None => {
                let id = NodeId(self.nodes.len() as u32);
                self.nodes.push(node);
                id
            },
        }
    }

    /// Allocate a new detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(Node {
            tag: tag.to_string(),
            ..Node::default()
        })
    }

    /// Allocate a new detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(Node {
            kind: Kind::Text,
            text: text.to_string(),
            ..Node::default()
        })
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.node(id).kind == Kind::Text
    }

    /// Qualified tag name, e.g. `table:table-cell`. Empty for text nodes.
    pub fn tag(&self, id: NodeId) -> &str {
        &self.node(id).tag
    }

    /// Get attribute value by qualified name.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id)
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether the element carries the attribute.
    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let attributes = &mut self.node_mut(id).attributes;
        match attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => {
                existing.clear();
                existing.push_str(value);
            },
            None => attributes.push((name.to_string(), value.to_string())),
        }
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        let attributes = &mut self.node_mut(id).attributes;
        let pos = attributes.iter().position(|(key, _)| key == name)?;
        Some(attributes.remove(pos).1)
    }

    /// All attributes in document order.
    pub fn attributes(&self, id: NodeId) -> impl Iterator<Item = (&str, &str)> {
        self.node(id)
            .attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Direct text of an element (its text children, joined), or the content
    /// of a text node.
    pub fn text(&self, id: NodeId) -> String {
        if self.is_text(id) {
            return self.node(id).text.clone();
        }
        self.child_nodes(id)
            .filter(|child| self.is_text(*child))
            .map(|child| self.node(child).text.as_str())
            .collect()
    }

    /// Replace the direct text of an element with one text node placed
    /// before its child elements.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if self.is_text(id) {
            let node = self.node_mut(id);
            node.text.clear();
            node.text.push_str(text);
            return;
        }
        let segments: Vec<NodeId> = self.child_nodes(id).filter(|c| self.is_text(*c)).collect();
        for segment in segments {
            self.remove(segment);
        }
        if !text.is_empty() {
            let segment = self.create_text(text);
            self.prepend_child(id, segment);
        }
    }

    /// Append character data after the current last child, merging with a
    /// trailing text node.
    pub(crate) fn push_text(&mut self, id: NodeId, text: &str) {
        match self.node(id).last_child {
            Some(last) if self.is_text(last) => self.node_mut(last).text.push_str(text),
            _ => {
                let segment = self.create_text(text);
                self.append_child(id, segment);
            },
        }
    }

    pub(crate) fn segment(&self, id: NodeId) -> &str {
        &self.node(id).text
    }

    /// Text of the node and all of its descendants, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        if self.is_text(id) {
            out.push_str(&self.node(id).text);
            return;
        }
        for child in self.child_nodes(id) {
            self.collect_text(child, out);
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    fn skip_text(&self, mut current: Option<NodeId>, step: fn(&Node) -> Option<NodeId>) -> Option<NodeId> {
        while let Some(id) = current {
            if !self.is_text(id) {
                return Some(id);
            }
            current = step(self.node(id));
        }
        None
    }

    /// First child element.
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.skip_text(self.node(id).first_child, |n| n.next_sibling)
    }

    /// Last child element.
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.skip_text(self.node(id).last_child, |n| n.prev_sibling)
    }

    /// Next sibling element.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.skip_text(self.node(id).next_sibling, |n| n.next_sibling)
    }

    /// Previous sibling element.
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.skip_text(self.node(id).prev_sibling, |n| n.prev_sibling)
    }

    /// Whether the element has at least one child element; text does not count.
    pub fn has_child_nodes(&self, id: NodeId) -> bool {
        self.first_child(id).is_some()
    }

    /// Iterate over the child elements of `id`.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            dom: self,
            next: self.first_child(id),
        }
    }

    /// Iterate over every child of `id`, text nodes included.
    pub fn child_nodes(&self, id: NodeId) -> ChildNodes<'_> {
        ChildNodes {
            dom: self,
            next: self.node(id).first_child,
        }
    }

    /// Append a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.node(child).parent.is_none(), "child must be detached");
        let last = self.node(parent).last_child;
        {
            let node = self.node_mut(child);
            node.parent = Some(parent);
            node.prev_sibling = last;
            node.next_sibling = None;
        }
        match last {
            Some(last) => self.node_mut(last).next_sibling = Some(child),
            None => self.node_mut(parent).first_child = Some(child),
        }
        self.node_mut(parent).last_child = Some(child);
    }

    /// Insert a detached node as the first child of `parent`.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.node(child).parent.is_none(), "child must be detached");
        let first = self.node(parent).first_child;
        {
            let node = self.node_mut(child);
            node.parent = Some(parent);
            node.prev_sibling = None;
            node.next_sibling = first;
        }
        match first {
            Some(first) => self.node_mut(first).prev_sibling = Some(child),
            None => self.node_mut(parent).last_child = Some(child),
        }
        self.node_mut(parent).first_child = Some(child);
    }

    /// Insert the detached node `new` directly after `after`.
    ///
    /// Fails when `after` is itself detached, since there is no container to
    /// insert into.
    pub fn insert_after(&mut self, new: NodeId, after: NodeId) -> Result<()> {
        let parent = self.node(after).parent.ok_or_else(|| {
            Error::InvalidArgument(format!(
                "Cannot insert after detached element <{}>",
                self.node(after).tag
            ))
        })?;
        debug_assert!(self.node(new).parent.is_none(), "element must be detached");
        let next = self.node(after).next_sibling;
        {
            let node = self.node_mut(new);
            node.parent = Some(parent);
            node.prev_sibling = Some(after);
            node.next_sibling = next;
        }
        self.node_mut(after).next_sibling = Some(new);
        match next {
            Some(next) => self.node_mut(next).prev_sibling = Some(new),
            None => self.node_mut(parent).last_child = Some(new),
        }
        Ok(())
    }

    /// Unlink a node (and its subtree) from its parent.
    ///
    /// The node stays in the arena and can be attached again.
    pub fn detach(&mut self, id: NodeId) {
        let Node {
            parent,
            prev_sibling,
            next_sibling,
            ..
        } = *self.node(id);
        let Some(parent) = parent else {
            return;
        };
        match prev_sibling {
            Some(prev) => self.node_mut(prev).next_sibling = next_sibling,
            None => self.node_mut(parent).first_child = next_sibling,
        }
        match next_sibling {
            Some(next) => self.node_mut(next).prev_sibling = prev_sibling,
            None => self.node_mut(parent).last_child = prev_sibling,
        }
        let node = self.node_mut(id);
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    /// Detach a node and free it together with its subtree.
    ///
    /// The ids of the removed nodes must not be used afterwards.
    pub fn remove(&mut self, id: NodeId) {
        self.detach(id);
        if self.root == Some(id) {
            self.root = None;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            stack.extend(self.child_nodes(current));
            self.nodes[current.index()] = Node::default();
            self.free.push(current);
        }
    }

    /// Remove every child of `id`, text included.
    pub fn clear_children(&mut self, id: NodeId) {
        while let Some(child) = self.node(id).first_child {
            self.remove(child);
        }
    }

    /// Copy the subtree rooted at `id` into new, detached nodes.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let copy = self.shallow_clone(id);
        let mut stack = vec![(id, copy)];
        while let Some((source, target)) = stack.pop() {
            let mut child = self.node(source).first_child;
            while let Some(current) = child {
                let cloned = self.shallow_clone(current);
                self.append_child(target, cloned);
                stack.push((current, cloned));
                child = self.node(current).next_sibling;
            }
        }
        copy
    }

    fn shallow_clone(&mut self, id: NodeId) -> NodeId {
        let source = self.node(id);
        let node = Node {
            kind: source.kind,
            tag: source.tag.clone(),
            attributes: source.attributes.clone(),
            text: source.text.clone(),
            ..Node::default()
        };
        self.alloc(node)
    }

    /// Elements under `id` (inclusive) with the given tag, in document order.
    pub fn elements_by_tag(&self, id: NodeId, tag: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.walk(id, |current| {
            if self.tag(current) == tag {
                found.push(current);
            }
            false
        });
        found
    }

    /// First element under `id` (inclusive) with the given tag.
    pub fn find_first(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        let mut found = None;
        self.walk(id, |current| {
            let hit = self.tag(current) == tag;
            if hit {
                found = Some(current);
            }
            hit
        });
        found
    }

    // Pre-order walk over elements; stops once `visit` returns true
    fn walk(&self, id: NodeId, mut visit: impl FnMut(NodeId) -> bool) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if visit(current) {
                return;
            }
            let mark = stack.len();
            stack.extend(self.children(current));
            stack[mark..].reverse();
        }
    }

    /// Serialize the subtree rooted at `id`.
    pub fn to_xml_string(&self, id: NodeId) -> String {
        writer::to_xml_string(self, id)
    }

    /// Serialize the whole document with an XML declaration.
    pub fn to_document_string(&self) -> String {
        writer::to_document_string(self)
    }
}

/// Iterator over the child elements of a node.
pub struct Children<'a> {
    dom: &'a Dom,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.dom.next_sibling(current);
        Some(current)
    }
}

/// Iterator over every child of a node, text nodes included.
pub struct ChildNodes<'a> {
    dom: &'a Dom,
    next: Option<NodeId>,
}

impl Iterator for ChildNodes<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.dom.node(current).next_sibling;
        Some(current)
    }
}
