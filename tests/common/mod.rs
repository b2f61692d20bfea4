#![allow(dead_code)]

pub mod fixtures;

use arbor::{Document, Node, XPathResult};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Parses one of the fixture documents, panicking on malformed test input.
pub fn document(xml: &str) -> Document {
    Document::parse(xml).expect("fixture must be well-formed")
}

/// All nodes of a tree in document order, including attribute and namespace nodes.
pub fn all_nodes(doc: &Document) -> Vec<Node<'_>> {
    let mut nodes = vec![doc.root()];
    for node in doc.root().descendants() {
        nodes.extend(node.namespaces());
        nodes.extend(node.attributes());
        nodes.push(node);
    }
    nodes.sort();
    nodes
}

/// The node-set of a result as plain nodes. Text and attribute items are
/// mapped back through their origin.
pub fn result_nodes<'t>(doc: &'t Document, result: &XPathResult<'t>) -> Vec<Node<'t>> {
    result
        .as_node_set()
        .expect("expected a node-set result")
        .iter()
        .map(|item| match item.as_node() {
            Some(node) => node,
            None => {
                let origin = item
                    .as_smart_string()
                    .and_then(|s| s.origin().ok().flatten())
                    .expect("string items must carry an origin");
                doc.tree().get(origin.id()).expect("origin belongs to the document")
            }
        })
        .collect()
}
