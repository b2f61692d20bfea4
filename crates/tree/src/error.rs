use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Attribute '{0}' must be added directly after its start tag")]
    MisplacedAttribute(String),

    #[error("Namespace declaration for '{0}' must be added directly after its start tag")]
    MisplacedNamespace(String),

    #[error("Duplicate attribute '{0}'")]
    DuplicateAttribute(String),

    #[error("end_element() called without an open element")]
    UnbalancedEnd,

    #[error("Element '{0}' was never closed")]
    UnclosedElement(String),

    #[error("Node reference outlived its tree")]
    StaleReference,

    #[cfg(feature = "xml")]
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),
}
