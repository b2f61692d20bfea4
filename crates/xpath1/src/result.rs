//! Final result values handed back to callers.
//!
//! Strings taken from text and attribute nodes become [`SmartString`]s that
//! remember where they came from through a weak handle. The handle never
//! keeps the tree alive; once the tree is dropped, origin queries report
//! [`TreeError::StaleReference`].

use crate::options::XPathOptions;
use crate::value::{XPathValue, format_number};
use arbor_tree::{Node, NodeRef, TreeError, WeakNodeRef};
use std::fmt;
use std::ops::Deref;

/// Where a [`SmartString`] was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginKind {
    Attribute,
    /// Text that is the first child of its parent.
    Text,
    /// Text that follows a sibling node; it belongs to that sibling.
    Tail,
    /// Computed strings.
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Origin {
    node: WeakNodeRef,
    kind: OriginKind,
    attribute_name: Option<String>,
}

/// A string value with an optional back-reference to the node it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartString {
    value: String,
    origin: Option<Origin>,
}

impl SmartString {
    /// A string without origin.
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            origin: None,
        }
    }

    /// The string value of a text or attribute node together with its origin.
    /// Other node kinds yield a plain string.
    pub fn from_node(node: Node<'_>) -> Self {
        let value = node.string_value();
        let (kind, attribute_name) = if node.is_attribute() {
            (OriginKind::Attribute, Some(node.qualified_name()))
        } else if node.is_text() && node.prev_sibling().is_some() {
            (OriginKind::Tail, None)
        } else if node.is_text() {
            (OriginKind::Text, None)
        } else {
            return Self::plain(value);
        };
        Self {
            value,
            origin: Some(Origin {
                node: node.downgrade(),
                kind,
                attribute_name,
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value
    }

    pub fn origin_kind(&self) -> OriginKind {
        self.origin
            .as_ref()
            .map_or(OriginKind::None, |origin| origin.kind)
    }

    pub fn is_text(&self) -> bool {
        self.origin_kind() == OriginKind::Text
    }

    pub fn is_tail(&self) -> bool {
        self.origin_kind() == OriginKind::Tail
    }

    pub fn is_attribute(&self) -> bool {
        self.origin_kind() == OriginKind::Attribute
    }

    /// The qualified name of the originating attribute.
    pub fn attribute_name(&self) -> Option<&str> {
        self.origin.as_ref()?.attribute_name.as_deref()
    }

    /// The text or attribute node the string was read from.
    pub fn origin(&self) -> Result<Option<NodeRef>, TreeError> {
        match &self.origin {
            Some(origin) => origin.node.upgrade().map(Some),
            None => Ok(None),
        }
    }

    /// The element owning the string: the parent of a text or attribute node,
    /// or the preceding sibling of a tail.
    pub fn parent(&self) -> Result<Option<NodeRef>, TreeError> {
        let Some(origin) = &self.origin else {
            return Ok(None);
        };
        let node_ref = origin.node.upgrade()?;
        let node = node_ref.node();
        let owner = match origin.kind {
            OriginKind::Tail => node.prev_sibling(),
            _ => node.parent(),
        };
        Ok(owner.map(|owner| owner.to_ref()))
    }
}

impl Deref for SmartString {
    type Target = str;

    fn deref(&self) -> &str {
        &self.value
    }
}

impl AsRef<str> for SmartString {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for SmartString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl PartialEq<str> for SmartString {
    fn eq(&self, other: &str) -> bool {
        self.value == other
    }
}

impl PartialEq<&str> for SmartString {
    fn eq(&self, other: &&str) -> bool {
        self.value == *other
    }
}

/// One member of a node-set result.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultItem<'t> {
    Node(Node<'t>),
    /// The value of a text or attribute node.
    String(SmartString),
    /// The value of a text or attribute node when smart strings are disabled.
    Plain(String),
}

impl<'t> ResultItem<'t> {
    pub fn as_node(&self) -> Option<Node<'t>> {
        match self {
            ResultItem::Node(node) => Some(*node),
            ResultItem::String(_) | ResultItem::Plain(_) => None,
        }
    }

    pub fn as_smart_string(&self) -> Option<&SmartString> {
        match self {
            ResultItem::String(s) => Some(s),
            _ => None,
        }
    }

    /// The text of a string item, smart or plain.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ResultItem::String(s) => Some(s.as_str()),
            ResultItem::Plain(s) => Some(s),
            ResultItem::Node(_) => None,
        }
    }

    /// The XPath string-value of the item.
    pub fn string_value(&self) -> String {
        match self {
            ResultItem::Node(node) => node.string_value(),
            ResultItem::String(s) => s.to_string(),
            ResultItem::Plain(s) => s.clone(),
        }
    }
}

/// The result of evaluating an expression. Node-set results borrow the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum XPathResult<'t> {
    Boolean(bool),
    Number(f64),
    String(SmartString),
    NodeSet(Vec<ResultItem<'t>>),
}

impl<'t> XPathResult<'t> {
    /// Converts an evaluated value. `reverse_axis` tells whether the final
    /// step of the expression walked a reverse axis.
    pub fn project(value: XPathValue<'t>, options: &XPathOptions, reverse_axis: bool) -> Self {
        match value {
            XPathValue::Boolean(b) => XPathResult::Boolean(b),
            XPathValue::Number(n) => XPathResult::Number(n),
            XPathValue::String(s) => XPathResult::String(SmartString::plain(s)),
            XPathValue::NodeSet(mut nodes) => {
                if reverse_axis && options.raw_axis_order {
                    nodes.reverse();
                }
                let items = nodes
                    .into_iter()
                    .map(|node| {
                        if !(node.is_text() || node.is_attribute()) {
                            ResultItem::Node(node)
                        } else if options.smart_strings {
                            ResultItem::String(SmartString::from_node(node))
                        } else {
                            ResultItem::Plain(node.string_value())
                        }
                    })
                    .collect();
                XPathResult::NodeSet(items)
            }
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            XPathResult::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            XPathResult::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_smart_string(&self) -> Option<&SmartString> {
        match self {
            XPathResult::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_node_set(&self) -> Option<&[ResultItem<'t>]> {
        match self {
            XPathResult::NodeSet(items) => Some(items),
            _ => None,
        }
    }

    /// The nodes of a node-set result, skipping string items.
    pub fn nodes(&self) -> Vec<Node<'t>> {
        self.as_node_set()
            .map(|items| items.iter().filter_map(ResultItem::as_node).collect())
            .unwrap_or_default()
    }

    /// The string-values of the members of a node-set result.
    pub fn strings(&self) -> Vec<String> {
        self.as_node_set()
            .map(|items| items.iter().map(ResultItem::string_value).collect())
            .unwrap_or_default()
    }
}

impl fmt::Display for XPathResult<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XPathResult::Boolean(b) => write!(f, "{}", b),
            XPathResult::Number(n) => write!(f, "{}", format_number(*n)),
            XPathResult::String(s) => write!(f, "{}", s),
            XPathResult::NodeSet(items) => match items.first() {
                Some(item) => write!(f, "{}", item.string_value()),
                None => Ok(()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_tree::xml;

    fn project<'t>(nodes: Vec<Node<'t>>, options: &XPathOptions) -> Vec<ResultItem<'t>> {
        match XPathResult::project(XPathValue::NodeSet(nodes), options, false) {
            XPathResult::NodeSet(items) => items,
            other => panic!("Expected NodeSet, got {other:?}"),
        }
    }

    #[test]
    fn test_origin_kinds() {
        let tree = xml::parse(r#"<r><a id="x">TEXT<b/>TAIL</a></r>"#).unwrap();
        let a = tree.document_element().unwrap().first_child().unwrap();
        let attr = a.attributes().next().unwrap();
        let text = a.first_child().unwrap();
        let tail = a.last_child().unwrap();
        let options = XPathOptions::default();

        let items = project(vec![a, attr, text, tail], &options);
        assert_eq!(items[0].as_node(), Some(a));

        let attr_s = items[1].as_smart_string().unwrap();
        assert!(attr_s.is_attribute() && !attr_s.is_text() && !attr_s.is_tail());
        assert_eq!(attr_s.attribute_name(), Some("id"));
        assert_eq!(attr_s.parent().unwrap().unwrap().node(), a);

        let text_s = items[2].as_smart_string().unwrap();
        assert_eq!(text_s.origin_kind(), OriginKind::Text);
        assert_eq!(*text_s, "TEXT");
        assert_eq!(text_s.origin().unwrap().unwrap().node(), text);
        assert_eq!(text_s.parent().unwrap().unwrap().node(), a);

        let tail_s = items[3].as_smart_string().unwrap();
        assert!(tail_s.is_tail());
        assert_eq!(
            tail_s.parent().unwrap().unwrap().node().local_name(),
            Some("b")
        );
    }

    #[test]
    fn test_smart_strings_disabled() {
        let tree = xml::parse("<root><a>TEXT</a></root>").unwrap();
        let text = tree.root().descendants().find(|n| n.is_text()).unwrap();
        let options = XPathOptions::default().with_smart_strings(false);

        let items = project(vec![text], &options);
        assert_eq!(items[0], ResultItem::Plain("TEXT".to_string()));
        assert!(items[0].as_smart_string().is_none());
        assert_eq!(items[0].as_str(), Some("TEXT"));
        assert_eq!(items[0].string_value(), "TEXT");
    }

    #[test]
    fn test_attributes_without_smart_strings() {
        let tree = xml::parse(r#"<root id="r1"/>"#).unwrap();
        let attr = tree.document_element().unwrap().attributes().next().unwrap();
        let options = XPathOptions::default().with_smart_strings(false);

        let items = project(vec![attr], &options);
        assert!(matches!(&items[0], ResultItem::Plain(value) if value == "r1"));
    }

    #[test]
    fn test_origin_after_tree_is_dropped() {
        let tree = xml::parse("<root><a>TEXT</a></root>").unwrap();
        let text = tree.root().descendants().find(|n| n.is_text()).unwrap();
        let smart = SmartString::from_node(text);
        assert!(smart.origin().unwrap().is_some());

        drop(tree);
        assert_eq!(smart.as_str(), "TEXT");
        assert!(smart.is_text());
        assert!(matches!(smart.origin(), Err(TreeError::StaleReference)));
        assert!(matches!(smart.parent(), Err(TreeError::StaleReference)));
    }

    #[test]
    fn test_raw_axis_order() {
        let tree = xml::parse("<r><a/><b/><c/></r>").unwrap();
        let nodes: Vec<_> = tree.document_element().unwrap().children().collect();

        let ordered = XPathResult::project(
            XPathValue::NodeSet(nodes.clone()),
            &XPathOptions::default(),
            true,
        );
        assert_eq!(ordered.nodes(), nodes);

        let raw = XPathResult::project(
            XPathValue::NodeSet(nodes.clone()),
            &XPathOptions::default().with_raw_axis_order(true),
            true,
        );
        let mut reversed = nodes;
        reversed.reverse();
        assert_eq!(raw.nodes(), reversed);
    }

    #[test]
    fn test_scalar_results() {
        let number = XPathResult::project(XPathValue::Number(3.0), &XPathOptions::default(), false);
        assert_eq!(number.as_number(), Some(3.0));
        assert_eq!(number.to_string(), "3");

        let string = XPathResult::project(
            XPathValue::String("x".into()),
            &XPathOptions::default(),
            false,
        );
        let s = string.as_smart_string().unwrap();
        assert_eq!(s.origin_kind(), OriginKind::None);
        assert!(string.as_node_set().is_none());
    }
}
