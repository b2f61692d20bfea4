//! The four XPath 1.0 value types and their conversions.

use arbor_tree::Node;
use std::fmt;

/// Represents the possible result types of an XPath expression evaluation.
///
/// Node-sets produced by the evaluator are duplicate-free and in document order.
#[derive(Debug, Clone, PartialEq)]
pub enum XPathValue<'t> {
    NodeSet(Vec<Node<'t>>),
    String(String),
    Number(f64),
    Boolean(bool),
}

impl<'t> XPathValue<'t> {
    /// Coerces the XPath value to a boolean as per XPath 1.0 rules.
    pub fn to_bool(&self) -> bool {
        match self {
            XPathValue::NodeSet(nodes) => !nodes.is_empty(),
            XPathValue::String(s) => !s.is_empty(),
            XPathValue::Number(n) => *n != 0.0 && !n.is_nan(),
            XPathValue::Boolean(b) => *b,
        }
    }

    /// Coerces the XPath value to a number as per XPath 1.0 rules.
    pub fn to_number(&self) -> f64 {
        match self {
            XPathValue::Number(n) => *n,
            XPathValue::String(s) => parse_number(s),
            XPathValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            XPathValue::NodeSet(nodes) => nodes
                .first()
                .map_or(f64::NAN, |n| parse_number(&n.string_value())),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            XPathValue::NodeSet(_) => "node-set",
            XPathValue::String(_) => "string",
            XPathValue::Number(_) => "number",
            XPathValue::Boolean(_) => "boolean",
        }
    }

    pub fn is_node_set(&self) -> bool {
        matches!(self, XPathValue::NodeSet(_))
    }
}

impl fmt::Display for XPathValue<'_> {
    /// Coerces the XPath value to a string as per XPath 1.0 rules.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XPathValue::NodeSet(nodes) => write!(
                f,
                "{}",
                nodes.first().map(|n| n.string_value()).unwrap_or_default()
            ),
            XPathValue::String(s) => write!(f, "{}", s),
            XPathValue::Number(n) => write!(f, "{}", format_number(*n)),
            XPathValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<bool> for XPathValue<'_> {
    fn from(value: bool) -> Self {
        XPathValue::Boolean(value)
    }
}

impl From<f64> for XPathValue<'_> {
    fn from(value: f64) -> Self {
        XPathValue::Number(value)
    }
}

impl From<i64> for XPathValue<'_> {
    fn from(value: i64) -> Self {
        XPathValue::Number(value as f64)
    }
}

impl From<&str> for XPathValue<'_> {
    fn from(value: &str) -> Self {
        XPathValue::String(value.to_string())
    }
}

impl From<String> for XPathValue<'_> {
    fn from(value: String) -> Self {
        XPathValue::String(value)
    }
}

impl<'t> From<Node<'t>> for XPathValue<'t> {
    fn from(node: Node<'t>) -> Self {
        XPathValue::NodeSet(vec![node])
    }
}

impl<'t> From<Vec<Node<'t>>> for XPathValue<'t> {
    /// Sorts into document order and removes duplicates.
    fn from(mut nodes: Vec<Node<'t>>) -> Self {
        nodes.sort_unstable();
        nodes.dedup();
        XPathValue::NodeSet(nodes)
    }
}

/// XPath string form of a number: `NaN`, `Infinity`, `-Infinity`, integers
/// without a fractional part, never an exponent.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

pub(crate) fn is_xml_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/// Parses the XPath `Number` production surrounded by optional whitespace.
/// Anything else (exponents, a leading `+`, `inf`) is NaN.
pub fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim_matches(is_xml_whitespace);
    let unsigned = trimmed.strip_prefix('-').unwrap_or(trimmed);

    let mut digits = 0;
    let mut dots = 0;
    for c in unsigned.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return f64::NAN,
        }
    }
    if digits == 0 || dots > 1 {
        return f64::NAN;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}
