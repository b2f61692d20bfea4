//! XPath 1.0 over an immutable, namespace-aware XML tree.
//!
//! The integration crate ties the tree model ([`arbor_tree`]) and the
//! evaluator ([`arbor_xpath1`]) together behind a [`Document`] facade, a JSON
//! configuration loader and a unified error type.
//!
//! ```ignore
//! use arbor::Document;
//!
//! let doc = Document::parse("<root><a>TEXT</a></root>")?;
//! let result = doc.xpath("//a/text()")?;
//! assert!(result.as_node_set().unwrap()[0].as_smart_string().unwrap().is_text());
//! ```

pub mod config;
pub mod document;
pub mod error;

pub use config::EngineConfig;
pub use document::Document;
pub use error::ArborError;

pub use arbor_tree::{Node, NodeRef, NodeType, Tree, TreeBuilder, TreeError, WeakNodeRef};
pub use arbor_xpath1::{
    CompiledExpression, ErrorKind, EvalError, FunctionRegistry, NamespaceMap, OriginKind,
    ResultItem, SmartString, SyntaxError, SyntaxErrorKind, Variables, XPathError,
    XPathEvaluator, XPathOptions, XPathResult, XPathValue, compile, evaluate_once,
    evaluate_once_with_functions,
};
