//! Engine configuration loaded from JSON.
//!
//! ```json
//! {
//!   "options": { "smartStrings": false, "rawAxisOrder": true },
//!   "namespaces": { "h": "http://www.w3.org/1999/xhtml" }
//! }
//! ```
//!
//! Every field is optional and falls back to its default.

use crate::error::ArborError;
use arbor_tree::Node;
use arbor_xpath1::{CompiledExpression, NamespaceMap, XPathEvaluator, XPathOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub options: XPathOptions,
    /// Prefix to namespace URI bindings available to every expression.
    pub namespaces: BTreeMap<String, String>,
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ArborError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ArborError> {
        let path = path.as_ref();
        log::debug!("Loading engine configuration from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Validated namespace bindings. Empty prefixes are rejected.
    pub fn namespace_map(&self) -> Result<NamespaceMap, ArborError> {
        let map = NamespaceMap::from_pairs(
            self.namespaces
                .iter()
                .map(|(prefix, uri)| (prefix.as_str(), uri.as_str())),
        )?;
        Ok(map)
    }

    /// An evaluator for `context` carrying this configuration.
    pub fn evaluator<'t>(&self, context: Node<'t>) -> Result<XPathEvaluator<'t>, ArborError> {
        Ok(XPathEvaluator::new(context)
            .with_namespaces(self.namespace_map()?)
            .with_options(self.options))
    }

    /// Compiles `expression` with this configuration's namespaces and options.
    pub fn compile(&self, expression: &str) -> Result<CompiledExpression, ArborError> {
        let compiled =
            CompiledExpression::compile_with_namespaces(expression, self.namespace_map()?)?
                .with_options(self.options);
        Ok(compiled)
    }
}
