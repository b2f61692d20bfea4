use std::fmt;
use thiserror::Error;

/// Which part of the grammar rejected an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    InvalidExpression,
    /// The failure happened inside a bracketed predicate.
    InvalidPredicate,
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxErrorKind::InvalidExpression => write!(f, "invalid expression"),
            SyntaxErrorKind::InvalidPredicate => write!(f, "invalid predicate"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} in '{expression}' at offset {offset}")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub expression: String,
    /// Byte offset into `expression` where parsing stopped.
    pub offset: usize,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, expression: &str, offset: usize) -> Self {
        Self {
            kind,
            expression: expression.to_string(),
            offset,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    #[error("Undefined variable '${0}'")]
    UndefinedVariable(String),

    #[error("Function '{function}' error: {message}")]
    FunctionError { function: String, message: String },

    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Extension function '{function}' failed: {message}")]
    ExtensionFailed { function: String, message: String },
}

impl EvalError {
    pub(crate) fn function(function: &str, message: impl Into<String>) -> Self {
        EvalError::FunctionError {
            function: function.to_string(),
            message: message.into(),
        }
    }
}

/// Coarse classification of an [`XPathError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    UndefinedPrefix,
    Eval,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum XPathError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("Undefined namespace prefix '{prefix}'")]
    UndefinedPrefix { prefix: String },

    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl XPathError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            XPathError::Syntax(_) => ErrorKind::Syntax,
            XPathError::UndefinedPrefix { .. } => ErrorKind::UndefinedPrefix,
            XPathError::Eval(_) => ErrorKind::Eval,
        }
    }

    pub(crate) fn undefined_prefix(prefix: &str) -> Self {
        XPathError::UndefinedPrefix {
            prefix: prefix.to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NamespaceError {
    #[error("Namespace prefix must not be empty (bound to '{uri}')")]
    EmptyPrefix { uri: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_and_messages() {
        let syntax: XPathError =
            SyntaxError::new(SyntaxErrorKind::InvalidPredicate, "//*[1.1.1]", 7).into();
        assert_eq!(syntax.kind(), ErrorKind::Syntax);
        assert_eq!(
            syntax.to_string(),
            "invalid predicate in '//*[1.1.1]' at offset 7"
        );

        let prefix = XPathError::undefined_prefix("foo");
        assert_eq!(prefix.kind(), ErrorKind::UndefinedPrefix);
        assert!(prefix.to_string().contains("'foo'"));

        let eval: XPathError = EvalError::UndefinedVariable("x".into()).into();
        assert_eq!(eval.kind(), ErrorKind::Eval);
        assert_eq!(eval.to_string(), "Undefined variable '$x'");
    }
}
