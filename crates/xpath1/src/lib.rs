//! XPath 1.0 expression compiler and evaluator over `arbor_tree` trees.
//!
//! # Key Types
//!
//! - [`CompiledExpression`]: a parsed expression with bound namespaces, extension
//!   functions and options, re-evaluatable against any context node
//! - [`XPathEvaluator`]: evaluates expression text against one context node
//! - [`XPathResult`]: the projected result, with [`SmartString`]s for text and
//!   attribute values
//!
//! # Example
//!
//! ```ignore
//! use arbor_xpath1::{compile, Variables};
//!
//! let tree = arbor_tree::xml::parse("<root><a>TEXT</a></root>")?;
//! let expr = compile("//a/text()")?;
//! let result = expr.call(tree.root(), &Variables::new())?;
//! ```

pub mod ast;
pub mod axes;
pub mod compiled;
pub mod engine;
pub mod error;
mod exslt;
pub mod functions;
pub mod namespaces;
pub mod operators;
pub mod options;
pub mod parser;
pub mod result;
pub mod value;
pub mod variables;

pub use ast::{Axis, BinaryOperator, Expression, FunctionName, LocationPath, NodeTest, Step};
pub use compiled::{
    CompiledExpression, XPathEvaluator, compile, evaluate_once, evaluate_once_with_functions,
};
pub use engine::{EvaluationContext, evaluate};
pub use error::{ErrorKind, EvalError, NamespaceError, SyntaxError, SyntaxErrorKind, XPathError};
pub use functions::{ExtensionError, ExtensionFunction, FunctionRegistry};
pub use namespaces::{EXSLT_REGEXP_NAMESPACE, NamespaceMap, NamespaceResolver};
pub use options::XPathOptions;
pub use parser::parse_expression;
pub use result::{OriginKind, ResultItem, SmartString, XPathResult};
pub use value::XPathValue;
pub use variables::Variables;
