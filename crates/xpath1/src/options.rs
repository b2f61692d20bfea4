use serde::{Deserialize, Serialize};

/// Evaluation switches. Field names serialize in camelCase, and missing
/// fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct XPathOptions {
    /// Attach origin information to strings taken from text and attribute nodes.
    pub smart_strings: bool,
    /// Bind the EXSLT regular expression functions under the `re` prefix.
    pub use_regexp_extension: bool,
    /// Return reverse-axis results in axis order instead of document order.
    pub raw_axis_order: bool,
}

impl Default for XPathOptions {
    fn default() -> Self {
        Self {
            smart_strings: true,
            use_regexp_extension: true,
            raw_axis_order: false,
        }
    }
}

impl XPathOptions {
    pub fn with_smart_strings(mut self, enabled: bool) -> Self {
        self.smart_strings = enabled;
        self
    }

    pub fn with_regexp_extension(mut self, enabled: bool) -> Self {
        self.use_regexp_extension = enabled;
        self
    }

    pub fn with_raw_axis_order(mut self, enabled: bool) -> Self {
        self.raw_axis_order = enabled;
        self
    }
}
