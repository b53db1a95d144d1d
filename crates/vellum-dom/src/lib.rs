//! SVG output tree for the Vellum rendering pipeline.
//!
//! This crate provides the persistent, arena-based element tree that the
//! rendering core keeps synchronized with the scene graph. It follows the
//! node model of the [DOM Living Standard](https://dom.spec.whatwg.org/),
//! restricted to what an [SVG 2](https://www.w3.org/TR/SVG2/) output surface
//! needs: namespaced elements, attributes and text.
//!
//! # Design
//!
//! The tree uses arena allocation with [`ElementId`] indices for all
//! relationships, providing O(1) access and traversal without borrow checker
//! issues. Freed slots are never reused, so a stale [`ElementId`] can only
//! ever resolve to `None`.
//!
//! Every attribute write is counted, and an optional journal records each
//! mutation as a [`DomMutation`], so callers can verify that an incremental
//! update touched exactly what it should have.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::rc::Rc;

use strum_macros::Display;

/// Map of attribute names to values for an element.
pub type AttributesMap = HashMap<String, String>;

/// An output document shared between the drawables and resource blocks
/// that write into it.
pub type SharedDocument = Rc<RefCell<SvgDocument>>;

/// A type-safe index into the output tree.
///
/// `ElementId` provides O(1) access to any node in the tree without
/// borrowing issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub usize);

impl ElementId {
    /// The root `<svg>` element is always at index 0.
    pub const ROOT: Self = Self(0);
}

/// [§ 1.9 Namespaces](https://dom.spec.whatwg.org/#namespaces)
///
/// Namespace an element was created in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Namespace {
    /// `http://www.w3.org/2000/svg`
    #[strum(serialize = "http://www.w3.org/2000/svg")]
    Svg,
    /// `http://www.w3.org/1999/xhtml`, for foreign content embedded in SVG.
    #[strum(serialize = "http://www.w3.org/1999/xhtml")]
    Xhtml,
}

/// A node in the output tree, storing indices for parent/child/sibling
/// relationships.
#[derive(Debug, Clone)]
pub struct Node {
    /// Element or text payload.
    pub node_type: NodeType,
    /// Parent element, `None` while detached.
    pub parent: Option<ElementId>,
    /// Children in document order.
    pub children: Vec<ElementId>,
    /// The node immediately following this one in its parent's children.
    pub next_sibling: Option<ElementId>,
    /// The node immediately preceding this one in its parent's children.
    pub prev_sibling: Option<ElementId>,
}

/// Payload of a [`Node`].
#[derive(Debug, Clone)]
pub enum NodeType {
    /// A namespaced element.
    Element(ElementData),
    /// Character data.
    Text(String),
}

/// Element-specific data.
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Namespace the element was created in.
    pub namespace: Namespace,
    /// The element's local name, e.g. `rect` or `linearGradient`.
    pub tag_name: String,
    /// The element's attribute list.
    pub attrs: AttributesMap,
}

/// One recorded change to the output tree.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum DomMutation {
    /// A detached element was allocated.
    CreateElement {
        /// New element.
        id: ElementId,
        /// Its local name.
        tag_name: String,
    },
    /// An attribute was written.
    SetAttribute {
        /// Target element.
        id: ElementId,
        /// Attribute name.
        name: String,
        /// New value.
        value: String,
    },
    /// An attribute was removed.
    RemoveAttribute {
        /// Target element.
        id: ElementId,
        /// Attribute name.
        name: String,
    },
    /// A node was inserted under a parent.
    InsertChild {
        /// New parent.
        parent: ElementId,
        /// Inserted node.
        child: ElementId,
    },
    /// A node was removed from its parent.
    RemoveChild {
        /// Old parent.
        parent: ElementId,
        /// Removed node.
        child: ElementId,
    },
    /// A subtree was released from the arena.
    Free {
        /// Root of the released subtree.
        id: ElementId,
    },
}

/// Arena-based SVG output tree with O(1) node access and traversal.
#[derive(Debug, Clone)]
pub struct SvgDocument {
    /// All nodes, indexed by `ElementId`. Freed slots hold `None`.
    /// The root `<svg>` element is always at index 0 (`ElementId::ROOT`).
    nodes: Vec<Option<Node>>,
    attribute_writes: usize,
    journal: Option<Vec<DomMutation>>,
}

impl SvgDocument {
    /// Create a new document with just the root `<svg>` element.
    #[must_use]
    pub fn new() -> Self {
        let mut document = Self {
            nodes: Vec::new(),
            attribute_writes: 0,
            journal: None,
        };
        let root = document.create_element("svg");
        debug_assert_eq!(root, ElementId::ROOT, "root must be the first allocation");
        document
    }

    /// Get the root element ID.
    #[must_use]
    pub const fn root(&self) -> ElementId {
        ElementId::ROOT
    }

    /// Get a node by its ID, `None` if it was never allocated or has been freed.
    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: ElementId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Whether `id` refers to a live node.
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes, including the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    /// Check if the tree is empty (should always hold at least the root).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of attribute writes since creation.
    #[must_use]
    pub const fn attribute_writes(&self) -> usize {
        self.attribute_writes
    }

    /// Start or stop recording mutations. Stopping discards the journal.
    pub fn set_journaling(&mut self, enabled: bool) {
        self.journal = enabled.then(Vec::new);
    }

    /// Take the mutations recorded since the last call.
    pub fn take_journal(&mut self) -> Vec<DomMutation> {
        self.journal.as_mut().map(std::mem::take).unwrap_or_default()
    }

    fn record(&mut self, mutation: impl FnOnce() -> DomMutation) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(mutation());
        }
    }

    fn alloc(&mut self, node_type: NodeType) -> ElementId {
        let id = ElementId(self.nodes.len());
        self.nodes.push(Some(Node {
            node_type,
            parent: None,
            children: Vec::new(),
            next_sibling: None,
            prev_sibling: None,
        }));
        id
    }

    /// `createElementNS(svgNS, tag_name)`: allocate a detached SVG element.
    pub fn create_element(&mut self, tag_name: &str) -> ElementId {
        self.create_element_ns(Namespace::Svg, tag_name)
    }

    /// Allocate a detached element in the given namespace.
    pub fn create_element_ns(&mut self, namespace: Namespace, tag_name: &str) -> ElementId {
        let id = self.alloc(NodeType::Element(ElementData {
            namespace,
            tag_name: tag_name.to_string(),
            attrs: AttributesMap::new(),
        }));
        self.record(|| DomMutation::CreateElement {
            id,
            tag_name: tag_name.to_string(),
        });
        id
    }

    /// Allocate a detached text node.
    pub fn create_text(&mut self, text: &str) -> ElementId {
        self.alloc(NodeType::Text(text.to_string()))
    }

    /// Get element data if this node is an element.
    #[must_use]
    pub fn as_element(&self, id: ElementId) -> Option<&ElementData> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Element(data) => Some(data),
            NodeType::Text(_) => None,
        })
    }

    /// Get the local name of an element.
    #[must_use]
    pub fn tag_name(&self, id: ElementId) -> Option<&str> {
        self.as_element(id).map(|e| e.tag_name.as_str())
    }

    /// Read an attribute value.
    #[must_use]
    pub fn attribute(&self, id: ElementId, name: &str) -> Option<&str> {
        self.as_element(id)
            .and_then(|e| e.attrs.get(name))
            .map(String::as_str)
    }

    /// `setAttribute(name, value)`. Writes to freed or text nodes are ignored.
    pub fn set_attribute(&mut self, id: ElementId, name: &str, value: &str) {
        let Some(Node {
            node_type: NodeType::Element(data),
            ..
        }) = self.get_mut(id)
        else {
            return;
        };
        let _ = data.attrs.insert(name.to_string(), value.to_string());
        self.attribute_writes += 1;
        self.record(|| DomMutation::SetAttribute {
            id,
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    /// `removeAttribute(name)`. Returns whether the attribute was present.
    pub fn remove_attribute(&mut self, id: ElementId, name: &str) -> bool {
        let Some(Node {
            node_type: NodeType::Element(data),
            ..
        }) = self.get_mut(id)
        else {
            return false;
        };
        let removed = data.attrs.remove(name).is_some();
        if removed {
            self.record(|| DomMutation::RemoveAttribute {
                id,
                name: name.to_string(),
            });
        }
        removed
    }

    /// Recompute sibling links after the children of `parent` changed.
    fn relink_children(&mut self, parent: ElementId) {
        let children = self.children(parent).to_vec();
        for (index, &child) in children.iter().enumerate() {
            let prev = index.checked_sub(1).map(|i| children[i]);
            let next = children.get(index + 1).copied();
            if let Some(node) = self.get_mut(child) {
                node.prev_sibling = prev;
                node.next_sibling = next;
            }
        }
    }

    /// [§ 4.2.3 Append](https://dom.spec.whatwg.org/#concept-node-append)
    ///
    /// "To append a node to a parent, pre-insert node into parent before null."
    ///
    /// Appends `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) {
        self.insert_before(parent, child, None);
    }

    /// [§ 4.2.3 Pre-insert](https://dom.spec.whatwg.org/#concept-node-pre-insert)
    ///
    /// Inserts `child` into `parent` before `reference`. A `None` reference,
    /// or one that is not a child of `parent`, appends.
    pub fn insert_before(
        &mut self,
        parent: ElementId,
        child: ElementId,
        reference: Option<ElementId>,
    ) {
        if !self.contains(parent) || !self.contains(child) || parent == child {
            return;
        }
        self.detach(child);

        let position = reference.and_then(|r| self.children(parent).iter().position(|&c| c == r));
        if let Some(node) = self.get_mut(parent) {
            match position {
                Some(index) => node.children.insert(index, child),
                None => node.children.push(child),
            }
        }
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        }
        self.relink_children(parent);
        self.record(|| DomMutation::InsertChild { parent, child });
    }

    /// [§ 4.2.3 Remove](https://dom.spec.whatwg.org/#concept-node-remove)
    ///
    /// Removes `child` from `parent`. Does nothing if `child` is not a child
    /// of `parent`. The removed node stays allocated and can be re-inserted.
    pub fn remove_child(&mut self, parent: ElementId, child: ElementId) {
        if self.parent(child) != Some(parent) {
            return;
        }
        if let Some(node) = self.get_mut(parent) {
            node.children.retain(|&c| c != child);
        }
        if let Some(node) = self.get_mut(child) {
            node.parent = None;
            node.prev_sibling = None;
            node.next_sibling = None;
        }
        self.relink_children(parent);
        self.record(|| DomMutation::RemoveChild { parent, child });
    }

    /// Remove `id` from its parent, if it has one.
    pub fn detach(&mut self, id: ElementId) {
        if let Some(parent) = self.parent(id) {
            self.remove_child(parent, id);
        }
    }

    /// Detach `id` and release it and its whole subtree from the arena.
    /// The root cannot be freed.
    pub fn free(&mut self, id: ElementId) {
        if id == ElementId::ROOT || !self.contains(id) {
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current.0).and_then(Option::take) {
                stack.extend(node.children);
            }
        }
        self.record(|| DomMutation::Free { id });
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get all children of a node.
    #[must_use]
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Get the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: ElementId) -> Option<ElementId> {
        self.get(id).and_then(|n| n.children.first().copied())
    }

    /// Get the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: ElementId) -> Option<ElementId> {
        self.get(id).and_then(|n| n.next_sibling)
    }

    /// Get the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: ElementId) -> Option<ElementId> {
        self.get(id).and_then(|n| n.prev_sibling)
    }

    /// Iterate over all ancestors of a node, from parent to root.
    #[must_use]
    pub fn ancestors(&self, id: ElementId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Whether `id` is connected to the root.
    #[must_use]
    pub fn is_connected(&self, id: ElementId) -> bool {
        id == ElementId::ROOT || self.ancestors(id).any(|a| a == ElementId::ROOT)
    }

    /// Serialize the whole document as SVG markup.
    #[must_use]
    pub fn to_markup(&self) -> String {
        self.subtree_markup(ElementId::ROOT)
    }

    /// Serialize one subtree. Attributes are written in name order so the
    /// output is deterministic.
    #[must_use]
    pub fn subtree_markup(&self, id: ElementId) -> String {
        let mut out = String::new();
        self.write_markup(id, &mut out);
        out
    }

    fn write_markup(&self, id: ElementId, out: &mut String) {
        let Some(node) = self.get(id) else {
            return;
        };
        match &node.node_type {
            NodeType::Text(text) => out.push_str(&escape(text, false)),
            NodeType::Element(data) => {
                let _ = write!(out, "<{}", data.tag_name);
                if id == ElementId::ROOT {
                    let _ = write!(out, " xmlns=\"{}\"", data.namespace);
                }
                let mut names: Vec<&String> = data.attrs.keys().collect();
                names.sort();
                for name in names {
                    let _ = write!(out, " {name}=\"{}\"", escape(&data.attrs[name], true));
                }
                if node.children.is_empty() {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for &child in &node.children {
                    self.write_markup(child, out);
                }
                let _ = write!(out, "</{}>", data.tag_name);
            }
        }
    }
}

impl SvgDocument {
    /// Create a new document behind a shared handle.
    #[must_use]
    pub fn shared() -> SharedDocument {
        Rc::new(RefCell::new(Self::new()))
    }
}

impl Default for SvgDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape character data or an attribute value.
fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Iterator over ancestors of a node.
#[derive(Debug)]
pub struct AncestorIterator<'a> {
    tree: &'a SvgDocument,
    current: Option<ElementId>,
}

impl Iterator for AncestorIterator<'_> {
    type Item = ElementId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}
