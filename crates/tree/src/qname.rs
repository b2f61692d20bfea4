//! Qualified names for elements and attributes.

use std::fmt;

/// The namespace URI permanently bound to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// A qualified name: a local part, an optional namespace URI and the prefix it
/// was written with (kept only for `name()` and path generation).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub local: String,
    pub namespace: Option<String>,
    pub prefix: Option<String>,
}

impl QName {
    /// A name in no namespace.
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            namespace: None,
            prefix: None,
        }
    }

    /// A namespaced name without a recorded prefix.
    pub fn namespaced(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            namespace: Some(namespace.into()),
            prefix: None,
        }
    }

    /// A namespaced name together with the prefix used in the source document.
    pub fn prefixed(
        prefix: impl Into<String>,
        namespace: impl Into<String>,
        local: impl Into<String>,
    ) -> Self {
        Self {
            local: local.into(),
            namespace: Some(namespace.into()),
            prefix: Some(prefix.into()),
        }
    }

    /// Matches on the expanded name only; prefixes are irrelevant for identity.
    pub fn matches(&self, namespace: Option<&str>, local: &str) -> bool {
        self.local == local && self.namespace.as_deref() == namespace
    }

    /// The lexical form, `prefix:local` or `local`.
    pub fn lexical(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local),
            None => self.local.clone(),
        }
    }
}

impl fmt::Display for QName {
    /// Clark notation: `{uri}local`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}
