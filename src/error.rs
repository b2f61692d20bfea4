use arbor_tree::TreeError;
use arbor_xpath1::{NamespaceError, SyntaxError, XPathError};
use thiserror::Error;

/// The error type of the integration layer, covering tree construction,
/// expression handling and configuration loading.
#[derive(Error, Debug)]
pub enum ArborError {
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error(transparent)]
    XPath(#[from] XPathError),

    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("Namespace error: {0}")]
    Namespace(#[from] NamespaceError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
