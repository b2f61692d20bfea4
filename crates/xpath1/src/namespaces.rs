//! Prefix bindings used to resolve qualified names in expressions.

use crate::error::{NamespaceError, XPathError};
use arbor_tree::XML_NAMESPACE;
use std::collections::BTreeMap;

/// Namespace URI of the EXSLT regular expression functions.
pub const EXSLT_REGEXP_NAMESPACE: &str = "http://exslt.org/regular-expressions";

/// Prefix to URI bindings supplied by the caller. Prefixes are never empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceMap {
    bindings: BTreeMap<String, String>,
}

impl NamespaceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, P, U>(pairs: I) -> Result<Self, NamespaceError>
    where
        I: IntoIterator<Item = (P, U)>,
        P: Into<String>,
        U: Into<String>,
    {
        let mut map = Self::new();
        for (prefix, uri) in pairs {
            map.insert(prefix, uri)?;
        }
        Ok(map)
    }

    /// Binds `prefix` to `uri`, replacing an earlier binding.
    pub fn insert(
        &mut self,
        prefix: impl Into<String>,
        uri: impl Into<String>,
    ) -> Result<(), NamespaceError> {
        let prefix = prefix.into();
        let uri = uri.into();
        if prefix.is_empty() {
            return Err(NamespaceError::EmptyPrefix { uri });
        }
        self.bindings.insert(prefix, uri);
        Ok(())
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.bindings.get(prefix).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings
            .iter()
            .map(|(prefix, uri)| (prefix.as_str(), uri.as_str()))
    }
}

/// Resolves prefixes during evaluation: explicit bindings first, then the
/// implicit `xml` binding, then `re` when the regexp extension is enabled.
#[derive(Debug, Clone, Copy)]
pub struct NamespaceResolver<'e> {
    map: &'e NamespaceMap,
    regexp_default: bool,
}

impl<'e> NamespaceResolver<'e> {
    pub fn new(map: &'e NamespaceMap, regexp_default: bool) -> Self {
        Self {
            map,
            regexp_default,
        }
    }

    pub fn resolve(&self, prefix: &str) -> Result<&'e str, XPathError> {
        if let Some(uri) = self.map.get(prefix) {
            return Ok(uri);
        }
        match prefix {
            "xml" => Ok(XML_NAMESPACE),
            "re" if self.regexp_default => Ok(EXSLT_REGEXP_NAMESPACE),
            _ => Err(XPathError::undefined_prefix(prefix)),
        }
    }
}
