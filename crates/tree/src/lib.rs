pub mod builder;
pub mod error;
pub mod handle;
pub mod node;
mod path;
pub mod qname;
pub mod tree;
#[cfg(feature = "xml")]
pub mod xml;

pub use builder::TreeBuilder;
pub use error::TreeError;
pub use handle::{NodeRef, WeakNodeRef};
pub use node::{Node, NodeId, NodeType};
pub use qname::{QName, XML_NAMESPACE};
pub use tree::Tree;
