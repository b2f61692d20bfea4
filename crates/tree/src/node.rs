//! Borrowed node views and navigation iterators.

use crate::qname::{QName, XML_NAMESPACE};
use crate::tree::{NodeKind, Tree};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A typed index into a tree's node arena. Ordering of ids is document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) const ROOT: NodeId = NodeId(0);

    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// The raw arena index.
    pub fn get(self) -> u32 {
        self.0
    }
}

/// The type of a node, aligned with the XPath 1.0 data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Root,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
    Namespace,
}

/// A read-only view of one node. `'t` is the lifetime of the borrowed [`Tree`];
/// a view can never outlive the tree it points into.
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t Tree,
    id: NodeId,
}

impl<'t> Node<'t> {
    pub(crate) fn new(tree: &'t Tree, id: NodeId) -> Self {
        Self { tree, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'t Tree {
        self.tree
    }

    fn kind(&self) -> &'t NodeKind {
        &self.tree.data(self.id).kind
    }

    fn at(&self, id: NodeId) -> Node<'t> {
        Node::new(self.tree, id)
    }

    pub fn node_type(&self) -> NodeType {
        match self.kind() {
            NodeKind::Document => NodeType::Root,
            NodeKind::Element { .. } => NodeType::Element,
            NodeKind::Attribute { .. } => NodeType::Attribute,
            NodeKind::Text(_) => NodeType::Text,
            NodeKind::Comment(_) => NodeType::Comment,
            NodeKind::ProcessingInstruction { .. } => NodeType::ProcessingInstruction,
            NodeKind::Namespace { .. } => NodeType::Namespace,
        }
    }

    pub fn is_root(&self) -> bool {
        self.node_type() == NodeType::Root
    }

    pub fn is_element(&self) -> bool {
        self.node_type() == NodeType::Element
    }

    pub fn is_attribute(&self) -> bool {
        self.node_type() == NodeType::Attribute
    }

    pub fn is_text(&self) -> bool {
        self.node_type() == NodeType::Text
    }

    pub fn is_namespace(&self) -> bool {
        self.node_type() == NodeType::Namespace
    }

    /// The qualified name of an element or attribute.
    pub fn name(&self) -> Option<&'t QName> {
        match self.kind() {
            NodeKind::Element { name, .. } | NodeKind::Attribute { name, .. } => Some(name),
            _ => None,
        }
    }

    /// The XPath local name: element/attribute local part, PI target, or the
    /// prefix of a namespace node (empty for the default namespace).
    pub fn local_name(&self) -> Option<&'t str> {
        match self.kind() {
            NodeKind::Element { name, .. } | NodeKind::Attribute { name, .. } => {
                Some(name.local.as_str())
            }
            NodeKind::ProcessingInstruction { target, .. } => Some(target.as_str()),
            NodeKind::Namespace { prefix, .. } => Some(prefix.as_deref().unwrap_or("")),
            _ => None,
        }
    }

    /// The namespace URI of an element or attribute name.
    pub fn namespace_uri(&self) -> Option<&'t str> {
        self.name().and_then(|name| name.namespace.as_deref())
    }

    /// The XPath `name()` of this node.
    pub fn qualified_name(&self) -> String {
        match self.kind() {
            NodeKind::Element { name, .. } | NodeKind::Attribute { name, .. } => name.lexical(),
            _ => self.local_name().unwrap_or_default().to_string(),
        }
    }

    /// The directly stored value: text/comment content, attribute value,
    /// PI data or namespace URI. `None` for elements and the root.
    pub fn value(&self) -> Option<&'t str> {
        match self.kind() {
            NodeKind::Text(text) | NodeKind::Comment(text) => Some(text.as_str()),
            NodeKind::Attribute { value, .. } => Some(value.as_str()),
            NodeKind::ProcessingInstruction { data, .. } => Some(data.as_str()),
            NodeKind::Namespace { uri, .. } => Some(uri.as_str()),
            NodeKind::Document | NodeKind::Element { .. } => None,
        }
    }

    /// The string-value as defined by XPath 1.0: concatenated descendant text
    /// for elements and the root, the stored value for everything else.
    pub fn string_value(&self) -> String {
        match self.kind() {
            NodeKind::Document | NodeKind::Element { .. } => self
                .descendants()
                .filter_map(|node| match node.kind() {
                    NodeKind::Text(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
            _ => self.value().unwrap_or_default().to_string(),
        }
    }

    pub fn parent(&self) -> Option<Node<'t>> {
        self.tree.data(self.id).parent.map(|id| self.at(id))
    }

    pub fn first_child(&self) -> Option<Node<'t>> {
        self.tree.data(self.id).first_child.map(|id| self.at(id))
    }

    pub fn last_child(&self) -> Option<Node<'t>> {
        self.tree.data(self.id).last_child.map(|id| self.at(id))
    }

    pub fn next_sibling(&self) -> Option<Node<'t>> {
        self.tree.data(self.id).next_sibling.map(|id| self.at(id))
    }

    pub fn prev_sibling(&self) -> Option<Node<'t>> {
        self.tree.data(self.id).prev_sibling.map(|id| self.at(id))
    }

    pub fn children(&self) -> Children<'t> {
        Children {
            tree: self.tree,
            next: self.tree.data(self.id).first_child,
        }
    }

    pub fn attributes(&self) -> impl Iterator<Item = Node<'t>> + use<'t> {
        let tree = self.tree;
        let ids: &'t [NodeId] = match self.kind() {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        };
        ids.iter().map(move |&id| Node::new(tree, id))
    }

    /// The namespace nodes of an element: one per in-scope binding.
    pub fn namespaces(&self) -> impl Iterator<Item = Node<'t>> + use<'t> {
        let tree = self.tree;
        let ids: &'t [NodeId] = match self.kind() {
            NodeKind::Element { namespaces, .. } => namespaces,
            _ => &[],
        };
        ids.iter().map(move |&id| Node::new(tree, id))
    }

    /// Value of the attribute with the given expanded name.
    pub fn attribute(&self, namespace: Option<&str>, local: &str) -> Option<&'t str> {
        self.attributes()
            .find(|attr| attr.name().is_some_and(|name| name.matches(namespace, local)))
            .and_then(|attr| attr.value())
    }

    /// Resolves a prefix against the namespace nodes in scope on this element.
    pub fn lookup_namespace(&self, prefix: Option<&str>) -> Option<&'t str> {
        self.namespaces().find_map(|ns| match ns.kind() {
            NodeKind::Namespace { prefix: p, uri } if p.as_deref() == prefix => {
                Some(uri.as_str())
            }
            _ => None,
        })
    }

    /// Ancestors from the parent upwards to the root.
    pub fn ancestors(&self) -> Ancestors<'t> {
        Ancestors {
            tree: self.tree,
            next: self.tree.data(self.id).parent,
        }
    }

    /// Descendants in document order, excluding attribute and namespace nodes.
    pub fn descendants(&self) -> Descendants<'t> {
        Descendants {
            tree: self.tree,
            next: self.id.index() + 1,
            end: self.tree.data(self.id).subtree_end.index(),
        }
    }

    /// Nodes after this node's subtree, in document order.
    pub fn following(&self) -> Descendants<'t> {
        Descendants {
            tree: self.tree,
            next: self.tree.data(self.id).subtree_end.index() + 1,
            end: self.tree.len() - 1,
        }
    }

    /// Nodes before this node that are not its ancestors, in reverse document order.
    pub fn preceding(&self) -> Preceding<'t> {
        Preceding {
            tree: self.tree,
            cursor: self.id.index(),
            next_ancestor: self.tree.data(self.id).parent,
        }
    }

    pub fn is_ancestor_of(&self, other: &Node<'t>) -> bool {
        self.tree.ptr_eq(other.tree)
            && self.id < other.id
            && other.id <= self.tree.data(self.id).subtree_end
    }

    /// Text directly inside an element before its first child node.
    pub fn text(&self) -> Option<&'t str> {
        self.first_child()
            .filter(|child| child.is_text())
            .and_then(|child| child.value())
    }

    /// Text directly following this node, up to the next sibling node.
    pub fn tail(&self) -> Option<&'t str> {
        if self.is_attribute() || self.is_namespace() {
            return None;
        }
        self.next_sibling()
            .filter(|sibling| sibling.is_text())
            .and_then(|sibling| sibling.value())
    }

    /// The value of the nearest `xml:lang` in scope.
    pub fn language(&self) -> Option<&'t str> {
        let start = if self.is_element() {
            Some(*self)
        } else {
            self.parent()
        };
        std::iter::successors(start, |node| node.parent())
            .find_map(|node| node.attribute(Some(XML_NAMESPACE), "lang"))
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.tree.ptr_eq(other.tree)
    }
}

impl Eq for Node<'_> {}

impl Hash for Node<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tree.addr().hash(state);
        self.id.hash(state);
    }
}

impl PartialOrd for Node<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node<'_> {
    /// Document order within a tree; trees are ordered by arena address.
    fn cmp(&self, other: &Self) -> Ordering {
        self.tree
            .addr()
            .cmp(&other.tree.addr())
            .then(self.id.cmp(&other.id))
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            NodeKind::Document => write!(f, "Root#{}", self.id.0),
            NodeKind::Element { name, .. } => write!(f, "Element#{}({})", self.id.0, name),
            NodeKind::Attribute { name, value } => {
                write!(f, "Attribute#{}({}={:?})", self.id.0, name, value)
            }
            NodeKind::Text(text) => write!(f, "Text#{}({:?})", self.id.0, text),
            NodeKind::Comment(text) => write!(f, "Comment#{}({:?})", self.id.0, text),
            NodeKind::ProcessingInstruction { target, .. } => {
                write!(f, "PI#{}({})", self.id.0, target)
            }
            NodeKind::Namespace { prefix, uri } => write!(
                f,
                "Namespace#{}({}={})",
                self.id.0,
                prefix.as_deref().unwrap_or(""),
                uri
            ),
        }
    }
}

pub struct Children<'t> {
    tree: &'t Tree,
    next: Option<NodeId>,
}

impl<'t> Iterator for Children<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.tree.data(id).next_sibling;
        Some(Node::new(self.tree, id))
    }
}

pub struct Ancestors<'t> {
    tree: &'t Tree,
    next: Option<NodeId>,
}

impl<'t> Iterator for Ancestors<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.tree.data(id).parent;
        Some(Node::new(self.tree, id))
    }
}

/// Walks a contiguous id range forwards, skipping attribute and namespace nodes.
pub struct Descendants<'t> {
    tree: &'t Tree,
    next: usize,
    end: usize,
}

impl<'t> Iterator for Descendants<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next <= self.end {
            let id = NodeId::from_index(self.next);
            self.next += 1;
            match self.tree.data(id).kind {
                NodeKind::Attribute { .. } | NodeKind::Namespace { .. } => continue,
                _ => return Some(Node::new(self.tree, id)),
            }
        }
        None
    }
}

pub struct Preceding<'t> {
    tree: &'t Tree,
    /// One past the next candidate index.
    cursor: usize,
    next_ancestor: Option<NodeId>,
}

impl<'t> Iterator for Preceding<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor > 0 {
            self.cursor -= 1;
            let id = NodeId::from_index(self.cursor);
            if Some(id) == self.next_ancestor {
                self.next_ancestor = self.tree.data(id).parent;
                continue;
            }
            match self.tree.data(id).kind {
                NodeKind::Attribute { .. } | NodeKind::Namespace { .. } => continue,
                _ => return Some(Node::new(self.tree, id)),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::TreeBuilder;
    use crate::qname::QName;
    use crate::NodeType;

    /// <doc xml:lang="en"><a x="1">one<b/>tail</a><!--c--><a>two</a></doc>
    fn sample() -> crate::Tree {
        let mut b = TreeBuilder::new();
        b.start_element(QName::local("doc"));
        b.attribute(QName::prefixed("xml", crate::XML_NAMESPACE, "lang"), "en")
            .unwrap();
        b.start_element(QName::local("a"));
        b.attribute(QName::local("x"), "1").unwrap();
        b.text("one");
        b.start_element(QName::local("b"));
        b.end_element().unwrap();
        b.text("tail");
        b.end_element().unwrap();
        b.comment("c");
        b.start_element(QName::local("a"));
        b.text("two");
        b.end_element().unwrap();
        b.end_element().unwrap();
        b.finish().unwrap()
    }

    #[test]
    fn test_navigation_and_values() {
        let tree = sample();
        let doc = tree.document_element().unwrap();
        assert_eq!(doc.local_name(), Some("doc"));
        assert_eq!(doc.string_value(), "onetailtwo");

        let children: Vec<_> = doc.children().map(|n| n.node_type()).collect();
        assert_eq!(
            children,
            vec![NodeType::Element, NodeType::Comment, NodeType::Element]
        );

        let first_a = doc.first_child().unwrap();
        assert_eq!(first_a.attribute(None, "x"), Some("1"));
        assert_eq!(first_a.text(), Some("one"));
        let b = first_a.children().nth(1).unwrap();
        assert_eq!(b.tail(), Some("tail"));
        assert_eq!(b.language(), Some("en"));
        assert_eq!(b.ancestors().count(), 3);
        assert!(doc.is_ancestor_of(&b));
        assert!(!b.is_ancestor_of(&doc));
    }

    #[test]
    fn test_following_and_preceding() {
        let tree = sample();
        let doc = tree.document_element().unwrap();
        let first_a = doc.first_child().unwrap();
        let b = first_a.children().nth(1).unwrap();

        let following: Vec<String> = b
            .following()
            .map(|n| n.value().unwrap_or(n.local_name().unwrap_or("")).to_string())
            .collect();
        assert_eq!(following, vec!["tail", "c", "a", "two"]);

        let preceding: Vec<String> = b
            .preceding()
            .map(|n| n.value().unwrap_or(n.local_name().unwrap_or("")).to_string())
            .collect();
        assert_eq!(preceding, vec!["one"]);
    }

    #[test]
    fn test_document_order_matches_ids() {
        let tree = sample();
        let mut all: Vec<_> = tree.root().descendants().collect();
        let sorted = {
            let mut copy = all.clone();
            copy.sort();
            copy
        };
        assert_eq!(all, sorted);
        all.dedup();
        assert_eq!(all.len(), sorted.len());
    }
}
