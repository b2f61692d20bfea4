//! Absolute location paths for nodes.

use crate::node::{Node, NodeType};

impl<'t> Node<'t> {
    /// An absolute XPath that selects exactly this node, e.g.
    /// `/root/item[2]/text()[1]`.
    ///
    /// Namespaced elements are written as `*[k]` and namespaced attributes
    /// through `local-name()`/`namespace-uri()` predicates, so the path can be
    /// evaluated without any prefix bindings.
    pub fn path(&self) -> String {
        let mut steps: Vec<String> = std::iter::successors(Some(*self), |node| node.parent())
            .filter(|node| !node.is_root())
            .map(|node| node.step())
            .collect();
        if steps.is_empty() {
            return "/".to_string();
        }
        steps.reverse();
        let mut path = String::new();
        for step in steps {
            path.push('/');
            path.push_str(&step);
        }
        path
    }

    fn step(&self) -> String {
        match self.node_type() {
            NodeType::Root => String::new(),
            NodeType::Element => match self.name() {
                Some(name) if name.namespace.is_some() => {
                    format!("*[{}]", self.sibling_position(|n| n.is_element()))
                }
                Some(name) => {
                    let same_name = |n: &Node<'_>| {
                        n.is_element()
                            && n.name().is_some_and(|other| other.matches(None, &name.local))
                    };
                    let siblings = self
                        .parent()
                        .map_or(1, |parent| parent.children().filter(same_name).count());
                    if siblings > 1 {
                        format!("{}[{}]", name.local, self.sibling_position(same_name))
                    } else {
                        name.local.clone()
                    }
                }
                None => String::new(),
            },
            NodeType::Text => format!("text()[{}]", self.sibling_position(|n| n.is_text())),
            NodeType::Comment => format!(
                "comment()[{}]",
                self.sibling_position(|n| n.node_type() == NodeType::Comment)
            ),
            NodeType::ProcessingInstruction => {
                let target = self.local_name().unwrap_or_default();
                let position = self.sibling_position(|n| {
                    n.node_type() == NodeType::ProcessingInstruction
                        && n.local_name() == Some(target)
                });
                format!("processing-instruction({})[{}]", literal(target), position)
            }
            NodeType::Attribute => match self.name() {
                Some(name) => match &name.namespace {
                    Some(uri) => format!(
                        "@*[local-name()={}][namespace-uri()={}]",
                        literal(&name.local),
                        literal(uri)
                    ),
                    None => format!("@{}", name.local),
                },
                None => String::new(),
            },
            NodeType::Namespace => match self.local_name() {
                Some(prefix) if !prefix.is_empty() => format!("namespace::{prefix}"),
                _ => "namespace::*[name()='']".to_string(),
            },
        }
    }

    /// One-based position among the preceding siblings accepted by `filter`.
    fn sibling_position(&self, filter: impl Fn(&Node<'t>) -> bool) -> usize {
        std::iter::successors(self.prev_sibling(), |node| node.prev_sibling())
            .filter(|node| filter(node))
            .count()
            + 1
    }
}

fn literal(text: &str) -> String {
    if text.contains('\'') {
        format!("\"{text}\"")
    } else {
        format!("'{text}'")
    }
}
