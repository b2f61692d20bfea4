//! Arena storage for a finished, read-only tree.
//!
//! All nodes live in one `Vec<NodeData>` owned by [`TreeData`]. A node's index
//! is its identity, and because the builder allocates nodes strictly in the
//! order they are encountered (element, its namespace nodes, its attributes,
//! then its children), index order is document order.

use crate::node::{Node, NodeId};
use crate::qname::QName;
use std::fmt;
use std::sync::Arc;

/// Payload of a single arena slot.
#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Document,
    Element {
        name: QName,
        namespaces: Vec<NodeId>,
        attributes: Vec<NodeId>,
    },
    Attribute {
        name: QName,
        value: String,
    },
    Text(String),
    Comment(String),
    ProcessingInstruction {
        target: String,
        data: String,
    },
    Namespace {
        prefix: Option<String>,
        uri: String,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) prev_sibling: Option<NodeId>,
    pub(crate) next_sibling: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) last_child: Option<NodeId>,
    /// Highest index inside this node's subtree (inclusive). Equal to the
    /// node's own index for leaves, attributes and namespace nodes.
    pub(crate) subtree_end: NodeId,
}

impl NodeData {
    pub(crate) fn new(kind: NodeKind, parent: Option<NodeId>, id: NodeId) -> Self {
        Self {
            kind,
            parent,
            prev_sibling: None,
            next_sibling: None,
            first_child: None,
            last_child: None,
            subtree_end: id,
        }
    }
}

pub struct TreeData {
    pub(crate) nodes: Vec<NodeData>,
}

impl TreeData {
    pub(crate) fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }
}

/// A finished XML tree. Cloning is cheap and shares the arena.
///
/// The node graph is frozen once [`crate::TreeBuilder::finish`] returns; any
/// number of threads may evaluate against it at the same time.
#[derive(Clone)]
pub struct Tree {
    pub(crate) inner: Arc<TreeData>,
}

impl Tree {
    pub(crate) fn from_data(data: TreeData) -> Self {
        Self {
            inner: Arc::new(data),
        }
    }

    /// The document root node.
    pub fn root(&self) -> Node<'_> {
        Node::new(self, NodeId::ROOT)
    }

    /// The outermost element, if the document has one.
    pub fn document_element(&self) -> Option<Node<'_>> {
        self.root().children().find(|child| child.is_element())
    }

    /// Looks up a node by its arena id.
    pub fn get(&self, id: NodeId) -> Option<Node<'_>> {
        (id.index() < self.inner.nodes.len()).then(|| Node::new(self, id))
    }

    /// Number of nodes in the arena, including attribute and namespace nodes.
    pub fn len(&self) -> usize {
        self.inner.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        // The document root always exists.
        false
    }

    /// True when both handles share the same arena.
    pub fn ptr_eq(&self, other: &Tree) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn data(&self, id: NodeId) -> &NodeData {
        self.inner.data(id)
    }

    /// Address of the shared arena, used to order nodes of different trees.
    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("nodes", &self.inner.nodes.len())
            .finish()
    }
}
