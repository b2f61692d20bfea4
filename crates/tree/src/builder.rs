//! Event-style construction of a [`Tree`].
//!
//! The builder receives the document as a stream of start tags, attributes,
//! character data and end tags, the way a parser reports it. Namespace and
//! attribute nodes are allocated when the start tag is closed (on the next
//! child event or `end_element`), which keeps arena order equal to document
//! order.

use crate::error::TreeError;
use crate::node::NodeId;
use crate::qname::{QName, XML_NAMESPACE};
use crate::tree::{NodeData, NodeKind, Tree, TreeData};

type Binding = (Option<String>, String);

struct OpenElement {
    id: NodeId,
    scope: Vec<Binding>,
}

struct PendingStart {
    name: QName,
    declarations: Vec<Binding>,
    attributes: Vec<(QName, String)>,
}

pub struct TreeBuilder {
    nodes: Vec<NodeData>,
    open: Vec<OpenElement>,
    pending: Option<PendingStart>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        let root = NodeData::new(NodeKind::Document, None, NodeId::ROOT);
        Self {
            nodes: vec![root],
            open: vec![OpenElement {
                id: NodeId::ROOT,
                scope: vec![(Some("xml".to_string()), XML_NAMESPACE.to_string())],
            }],
            pending: None,
        }
    }

    /// Opens an element. Attributes and namespace declarations may follow
    /// until the next child or end event.
    pub fn start_element(&mut self, name: QName) -> &mut Self {
        self.flush_start_tag();
        self.pending = Some(PendingStart {
            name,
            declarations: Vec::new(),
            attributes: Vec::new(),
        });
        self
    }

    /// Declares a namespace on the open start tag. `None` is the default
    /// namespace; an empty URI undeclares the binding.
    pub fn namespace(&mut self, prefix: Option<&str>, uri: &str) -> Result<&mut Self, TreeError> {
        let pending = self
            .pending
            .as_mut()
            .ok_or_else(|| TreeError::MisplacedNamespace(prefix.unwrap_or("").to_string()))?;
        pending
            .declarations
            .retain(|(existing, _)| existing.as_deref() != prefix);
        pending
            .declarations
            .push((prefix.map(str::to_string), uri.to_string()));
        Ok(self)
    }

    pub fn attribute(
        &mut self,
        name: QName,
        value: impl Into<String>,
    ) -> Result<&mut Self, TreeError> {
        let pending = self
            .pending
            .as_mut()
            .ok_or_else(|| TreeError::MisplacedAttribute(name.lexical()))?;
        if pending
            .attributes
            .iter()
            .any(|(existing, _)| existing.matches(name.namespace.as_deref(), &name.local))
        {
            return Err(TreeError::DuplicateAttribute(name.lexical()));
        }
        pending.attributes.push((name, value.into()));
        Ok(self)
    }

    /// Appends character data. Adjacent text is merged into one text node.
    pub fn text(&mut self, text: &str) -> &mut Self {
        self.flush_start_tag();
        if text.is_empty() {
            return self;
        }
        let parent = self.current();
        if let Some(last) = self.nodes[parent.index()].last_child {
            if let NodeKind::Text(existing) = &mut self.nodes[last.index()].kind {
                existing.push_str(text);
                return self;
            }
        }
        self.append_child(NodeKind::Text(text.to_string()));
        self
    }

    pub fn comment(&mut self, text: &str) -> &mut Self {
        self.flush_start_tag();
        self.append_child(NodeKind::Comment(text.to_string()));
        self
    }

    pub fn processing_instruction(&mut self, target: &str, data: &str) -> &mut Self {
        self.flush_start_tag();
        self.append_child(NodeKind::ProcessingInstruction {
            target: target.to_string(),
            data: data.to_string(),
        });
        self
    }

    pub fn end_element(&mut self) -> Result<&mut Self, TreeError> {
        self.flush_start_tag();
        if self.open.len() <= 1 {
            return Err(TreeError::UnbalancedEnd);
        }
        if let Some(element) = self.open.pop() {
            self.close(element.id);
        }
        Ok(self)
    }

    pub fn finish(mut self) -> Result<Tree, TreeError> {
        self.flush_start_tag();
        if self.open.len() > 1 {
            let unclosed = self
                .open
                .last()
                .and_then(|element| match &self.nodes[element.id.index()].kind {
                    NodeKind::Element { name, .. } => Some(name.lexical()),
                    _ => None,
                })
                .unwrap_or_default();
            return Err(TreeError::UnclosedElement(unclosed));
        }
        self.close(NodeId::ROOT);
        log::debug!("Built tree with {} nodes", self.nodes.len());
        Ok(Tree::from_data(TreeData { nodes: self.nodes }))
    }

    fn current(&self) -> NodeId {
        self.open.last().map_or(NodeId::ROOT, |element| element.id)
    }

    fn close(&mut self, id: NodeId) {
        let end = NodeId::from_index(self.nodes.len() - 1);
        self.nodes[id.index()].subtree_end = end;
    }

    fn append_child(&mut self, kind: NodeKind) -> NodeId {
        let parent = self.current();
        let id = NodeId::from_index(self.nodes.len());
        let previous = self.nodes[parent.index()].last_child;

        let mut data = NodeData::new(kind, Some(parent), id);
        data.prev_sibling = previous;
        self.nodes.push(data);

        match previous {
            Some(prev) => self.nodes[prev.index()].next_sibling = Some(id),
            None => self.nodes[parent.index()].first_child = Some(id),
        }
        self.nodes[parent.index()].last_child = Some(id);
        id
    }

    /// Allocates a node owned by `owner` without linking it as a child.
    fn append_owned(&mut self, owner: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(NodeData::new(kind, Some(owner), id));
        id
    }

    fn flush_start_tag(&mut self) {
        let Some(start) = self.pending.take() else {
            return;
        };

        let mut scope = self
            .open
            .last()
            .map(|element| element.scope.clone())
            .unwrap_or_default();
        for (prefix, uri) in start.declarations {
            scope.retain(|(existing, _)| *existing != prefix);
            if !uri.is_empty() {
                scope.push((prefix, uri));
            }
        }

        let element = self.append_child(NodeKind::Element {
            name: start.name,
            namespaces: Vec::new(),
            attributes: Vec::new(),
        });

        let namespace_ids: Vec<NodeId> = scope
            .iter()
            .map(|(prefix, uri)| {
                self.append_owned(
                    element,
                    NodeKind::Namespace {
                        prefix: prefix.clone(),
                        uri: uri.clone(),
                    },
                )
            })
            .collect();
        let attribute_ids: Vec<NodeId> = start
            .attributes
            .into_iter()
            .map(|(name, value)| self.append_owned(element, NodeKind::Attribute { name, value }))
            .collect();

        if let NodeKind::Element {
            namespaces,
            attributes,
            ..
        } = &mut self.nodes[element.index()].kind
        {
            *namespaces = namespace_ids;
            *attributes = attribute_ids;
        }

        self.open.push(OpenElement { id: element, scope });
    }
}
