//! Builds a [`Tree`] from XML text parsed with `roxmltree`.

use crate::builder::TreeBuilder;
use crate::error::TreeError;
use crate::qname::QName;
use crate::tree::Tree;
use roxmltree::{Node, NodeType};

/// Parses `text` and converts the document into a [`Tree`].
pub fn parse(text: &str) -> Result<Tree, TreeError> {
    let document = roxmltree::Document::parse(text)?;
    from_document(&document)
}

/// Converts an already parsed `roxmltree` document.
pub fn from_document(document: &roxmltree::Document<'_>) -> Result<Tree, TreeError> {
    let mut builder = TreeBuilder::new();
    for child in document.root().children() {
        append(&mut builder, child)?;
    }
    builder.finish()
}

fn append(builder: &mut TreeBuilder, node: Node<'_, '_>) -> Result<(), TreeError> {
    match node.node_type() {
        NodeType::Element => {
            let tag = node.tag_name();
            builder.start_element(qualified(node, tag.namespace(), tag.name(), true));

            for ns in node.namespaces() {
                builder.namespace(ns.name(), ns.uri())?;
            }
            let parent_default = node
                .parent_element()
                .is_some_and(|parent| parent.lookup_namespace_uri(None).is_some());
            if parent_default && node.lookup_namespace_uri(None).is_none() {
                builder.namespace(None, "")?;
            }

            for attr in node.attributes() {
                builder.attribute(
                    qualified(node, attr.namespace(), attr.name(), false),
                    attr.value(),
                )?;
            }
            for child in node.children() {
                append(builder, child)?;
            }
            builder.end_element()?;
        }
        NodeType::Text => {
            builder.text(node.text().unwrap_or_default());
        }
        NodeType::Comment => {
            builder.comment(node.text().unwrap_or_default());
        }
        NodeType::PI => {
            if let Some(pi) = node.pi() {
                builder.processing_instruction(pi.target, pi.value.unwrap_or_default());
            }
        }
        NodeType::Root => {
            log::warn!("Ignoring nested document root while converting XML");
        }
    }
    Ok(())
}

/// Recovers the prefix a name was written with. Attributes never take the
/// default namespace, so only prefixed bindings are considered for them.
fn qualified(scope: Node<'_, '_>, namespace: Option<&str>, local: &str, element: bool) -> QName {
    let Some(uri) = namespace else {
        return QName::local(local);
    };
    let default_matches = element && scope.lookup_namespace_uri(None) == Some(uri);
    let prefix = if default_matches {
        None
    } else {
        scope
            .namespaces()
            .find(|ns| ns.uri() == uri && ns.name().is_some())
            .and_then(|ns| ns.name())
    };
    match prefix {
        Some(prefix) => QName::prefixed(prefix, uri, local),
        None => QName::namespaced(uri, local),
    }
}
