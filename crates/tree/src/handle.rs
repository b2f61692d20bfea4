//! Owning node handles that can outlive a borrow of the tree.
//!
//! A [`Node`] borrows its tree and is the right type while evaluating. Results
//! that must be stored (for example the origin of a string result) use
//! [`NodeRef`], which keeps the tree alive, or [`WeakNodeRef`], which does not
//! and reports [`TreeError::StaleReference`] once the tree is gone.

use crate::error::TreeError;
use crate::node::{Node, NodeId};
use crate::tree::{Tree, TreeData};
use std::fmt;
use std::sync::{Arc, Weak};

/// A node together with a strong reference to its tree.
#[derive(Clone)]
pub struct NodeRef {
    tree: Tree,
    id: NodeId,
}

impl NodeRef {
    pub fn node(&self) -> Node<'_> {
        Node::new(&self.tree, self.id)
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn downgrade(&self) -> WeakNodeRef {
        WeakNodeRef {
            tree: Arc::downgrade(&self.tree.inner),
            id: self.id,
        }
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.tree.ptr_eq(&other.tree)
    }
}

impl Eq for NodeRef {}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeRef({:?})", self.node())
    }
}

/// A node reference that does not keep its tree alive.
#[derive(Clone)]
pub struct WeakNodeRef {
    tree: Weak<TreeData>,
    id: NodeId,
}

impl WeakNodeRef {
    /// Recovers a strong handle, failing if the tree has been dropped.
    pub fn upgrade(&self) -> Result<NodeRef, TreeError> {
        let inner = self.tree.upgrade().ok_or(TreeError::StaleReference)?;
        Ok(NodeRef {
            tree: Tree { inner },
            id: self.id,
        })
    }

    pub fn is_alive(&self) -> bool {
        self.tree.strong_count() > 0
    }

    pub fn id(&self) -> NodeId {
        self.id
    }
}

impl PartialEq for WeakNodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Weak::ptr_eq(&self.tree, &other.tree)
    }
}

impl Eq for WeakNodeRef {}

impl fmt::Debug for WeakNodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakNodeRef")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl<'t> Node<'t> {
    /// An owning handle to this node.
    pub fn to_ref(&self) -> NodeRef {
        NodeRef {
            tree: self.tree().clone(),
            id: self.id(),
        }
    }

    /// A non-owning handle to this node.
    pub fn downgrade(&self) -> WeakNodeRef {
        WeakNodeRef {
            tree: Arc::downgrade(&self.tree().inner),
            id: self.id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::TreeBuilder;
    use crate::error::TreeError;
    use crate::qname::QName;

    fn small_tree() -> crate::Tree {
        let mut b = TreeBuilder::new();
        b.start_element(QName::local("root"));
        b.text("hello");
        b.end_element().unwrap();
        b.finish().unwrap()
    }

    #[test]
    fn test_strong_ref_keeps_tree_alive() {
        let tree = small_tree();
        let handle = tree.document_element().unwrap().to_ref();
        drop(tree);
        assert_eq!(handle.node().string_value(), "hello");
        assert_eq!(handle.node().local_name(), Some("root"));
    }

    #[test]
    fn test_weak_ref_detects_dropped_tree() {
        let tree = small_tree();
        let weak = tree.document_element().unwrap().downgrade();
        assert!(weak.is_alive());
        {
            let strong = weak.upgrade().unwrap();
            assert_eq!(strong.node(), tree.document_element().unwrap());
        }
        drop(tree);
        assert!(!weak.is_alive());
        assert!(matches!(weak.upgrade(), Err(TreeError::StaleReference)));
    }
}
