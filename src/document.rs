//! A parsed XML document with XPath conveniences.

use crate::error::ArborError;
use arbor_tree::{Node, Tree};
use arbor_xpath1::{NamespaceMap, Variables, XPathEvaluator, XPathOptions, XPathResult};

/// Owns a [`Tree`] and evaluates expressions against it.
#[derive(Debug, Clone)]
pub struct Document {
    tree: Tree,
}

impl Document {
    pub fn parse(text: &str) -> Result<Self, ArborError> {
        let tree = arbor_tree::xml::parse(text)?;
        log::debug!("Parsed document with {} nodes", tree.len());
        Ok(Self { tree })
    }

    pub fn from_tree(tree: Tree) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root()
    }

    pub fn document_element(&self) -> Option<Node<'_>> {
        self.tree.document_element()
    }

    /// Evaluates `expression` from the document root with default options.
    pub fn xpath(&self, expression: &str) -> Result<XPathResult<'_>, ArborError> {
        self.xpath_with(expression, &NamespaceMap::new(), &XPathOptions::default())
    }

    pub fn xpath_with(
        &self,
        expression: &str,
        namespaces: &NamespaceMap,
        options: &XPathOptions,
    ) -> Result<XPathResult<'_>, ArborError> {
        let result = arbor_xpath1::evaluate_once(
            expression,
            self.root(),
            namespaces,
            &Variables::new(),
            options,
        )?;
        Ok(result)
    }

    /// An evaluator rooted at the document node.
    pub fn evaluator(&self) -> XPathEvaluator<'_> {
        XPathEvaluator::new(self.root())
    }
}

impl From<Tree> for Document {
    fn from(tree: Tree) -> Self {
        Self::from_tree(tree)
    }
}
