use crate::value::XPathValue;
use std::collections::HashMap;

/// Variable bindings for one evaluation call, keyed by name without the `$`.
#[derive(Debug, Clone, Default)]
pub struct Variables<'t> {
    values: HashMap<String, XPathValue<'t>>,
}

impl<'t> Variables<'t> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style binding.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<XPathValue<'t>>) -> Self {
        self.set(name, value);
        self
    }

    /// Binds `name`. Node-sets are stored in document order without duplicates.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<XPathValue<'t>>) {
        let value = match value.into() {
            XPathValue::NodeSet(mut nodes) => {
                nodes.sort_unstable();
                nodes.dedup();
                XPathValue::NodeSet(nodes)
            }
            other => other,
        };
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&XPathValue<'t>> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<'t, K: Into<String>, V: Into<XPathValue<'t>>> FromIterator<(K, V)> for Variables<'t> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut variables = Variables::new();
        for (name, value) in iter {
            variables.set(name, value);
        }
        variables
    }
}
