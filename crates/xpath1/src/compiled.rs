//! Pre-compiled expressions and one-shot evaluation entry points.

use crate::ast::Expression;
use crate::engine::{self, EvaluationContext};
use crate::error::{NamespaceError, SyntaxError, XPathError};
use crate::functions::FunctionRegistry;
use crate::namespaces::{NamespaceMap, NamespaceResolver};
use crate::options::XPathOptions;
use crate::parser::parse_expression;
use crate::result::XPathResult;
use crate::value::XPathValue;
use crate::variables::Variables;
use arbor_tree::Node;
use std::collections::BTreeSet;

/// A parsed expression together with its namespace bindings, extension
/// functions and options. Immutable once built and shareable across threads.
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    source: String,
    ast: Expression,
    prefixes: BTreeSet<String>,
    namespaces: NamespaceMap,
    functions: FunctionRegistry,
    options: XPathOptions,
}

/// Shorthand for [`CompiledExpression::compile`].
pub fn compile(text: &str) -> Result<CompiledExpression, SyntaxError> {
    CompiledExpression::compile(text)
}

impl CompiledExpression {
    pub fn compile(text: &str) -> Result<Self, SyntaxError> {
        Self::compile_with_namespaces(text, NamespaceMap::new())
    }

    /// Compiles `text` with prefixes bound for every later call. Prefixes are
    /// not checked here; an unbound prefix fails when the expression is evaluated.
    pub fn compile_with_namespaces(
        text: &str,
        namespaces: NamespaceMap,
    ) -> Result<Self, SyntaxError> {
        let ast = parse_expression(text)?;
        log::debug!("Compiled XPath '{}': {:?}", text, ast);
        Ok(Self {
            source: text.to_string(),
            prefixes: ast.referenced_prefixes(),
            ast,
            namespaces,
            functions: FunctionRegistry::default(),
            options: XPathOptions::default(),
        })
    }

    pub fn with_functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions = functions;
        self
    }

    pub fn with_options(mut self, options: XPathOptions) -> Self {
        self.options = options;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Expression {
        &self.ast
    }

    pub fn namespaces(&self) -> &NamespaceMap {
        &self.namespaces
    }

    pub fn options(&self) -> &XPathOptions {
        &self.options
    }

    pub fn referenced_prefixes(&self) -> &BTreeSet<String> {
        &self.prefixes
    }

    pub fn referenced_variables(&self) -> BTreeSet<String> {
        self.ast.referenced_variables()
    }

    /// Evaluates against `context` with the given variable bindings.
    pub fn call<'t>(
        &self,
        context: Node<'t>,
        variables: &Variables<'t>,
    ) -> Result<XPathResult<'t>, XPathError> {
        run(
            &self.ast,
            &self.prefixes,
            context,
            &self.namespaces,
            &self.functions,
            variables,
            &self.options,
        )
    }

    /// Evaluates against `context` without variables.
    pub fn evaluate<'t>(&self, context: Node<'t>) -> Result<XPathResult<'t>, XPathError> {
        self.call(context, &Variables::new())
    }

    /// Evaluates to the raw XPath value, skipping result projection.
    pub fn evaluate_value<'t>(
        &self,
        context: Node<'t>,
        variables: &Variables<'t>,
    ) -> Result<XPathValue<'t>, XPathError> {
        let resolver = NamespaceResolver::new(&self.namespaces, self.options.use_regexp_extension);
        check_prefixes(&self.prefixes, &resolver)?;
        let e_ctx = EvaluationContext::new(
            context,
            variables,
            &self.functions,
            resolver,
            &self.options,
        );
        engine::evaluate(&self.ast, &e_ctx)
    }
}

/// Every referenced prefix must be bound before evaluation starts, even
/// when the step using it would never be reached.
fn check_prefixes(
    prefixes: &BTreeSet<String>,
    resolver: &NamespaceResolver<'_>,
) -> Result<(), XPathError> {
    for prefix in prefixes {
        resolver.resolve(prefix)?;
    }
    Ok(())
}

fn run<'t>(
    ast: &Expression,
    prefixes: &BTreeSet<String>,
    context: Node<'t>,
    namespaces: &NamespaceMap,
    functions: &FunctionRegistry,
    variables: &Variables<'t>,
    options: &XPathOptions,
) -> Result<XPathResult<'t>, XPathError> {
    let resolver = NamespaceResolver::new(namespaces, options.use_regexp_extension);
    check_prefixes(prefixes, &resolver)?;
    let e_ctx = EvaluationContext::new(context, variables, functions, resolver, options);
    let value = engine::evaluate(ast, &e_ctx)?;
    Ok(XPathResult::project(
        value,
        options,
        ast.ends_with_reverse_axis(),
    ))
}

/// Compiles and evaluates `text` in one go. Syntax errors surface as
/// [`XPathError::Syntax`].
pub fn evaluate_once<'t>(
    text: &str,
    context: Node<'t>,
    namespaces: &NamespaceMap,
    variables: &Variables<'t>,
    options: &XPathOptions,
) -> Result<XPathResult<'t>, XPathError> {
    evaluate_once_with_functions(
        text,
        context,
        namespaces,
        variables,
        &FunctionRegistry::default(),
        options,
    )
}

/// [`evaluate_once`] with extension functions available to this call only.
pub fn evaluate_once_with_functions<'t>(
    text: &str,
    context: Node<'t>,
    namespaces: &NamespaceMap,
    variables: &Variables<'t>,
    functions: &FunctionRegistry,
    options: &XPathOptions,
) -> Result<XPathResult<'t>, XPathError> {
    let ast = parse_expression(text)?;
    run(
        &ast,
        &ast.referenced_prefixes(),
        context,
        namespaces,
        functions,
        variables,
        options,
    )
}

/// Evaluates expression text repeatedly against one context node with its own
/// namespaces, variables, extension functions and options.
#[derive(Debug, Clone)]
pub struct XPathEvaluator<'t> {
    context: Node<'t>,
    namespaces: NamespaceMap,
    variables: Variables<'t>,
    functions: FunctionRegistry,
    options: XPathOptions,
}

impl<'t> XPathEvaluator<'t> {
    pub fn new(context: Node<'t>) -> Self {
        Self {
            context,
            namespaces: NamespaceMap::new(),
            variables: Variables::new(),
            functions: FunctionRegistry::default(),
            options: XPathOptions::default(),
        }
    }

    pub fn with_namespaces(mut self, namespaces: NamespaceMap) -> Self {
        self.namespaces = namespaces;
        self
    }

    pub fn register_namespace(
        &mut self,
        prefix: impl Into<String>,
        uri: impl Into<String>,
    ) -> Result<(), NamespaceError> {
        self.namespaces.insert(prefix, uri)
    }

    pub fn with_functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions = functions;
        self
    }

    pub fn with_options(mut self, options: XPathOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_variable(
        mut self,
        name: impl Into<String>,
        value: impl Into<XPathValue<'t>>,
    ) -> Self {
        self.variables.set(name, value);
        self
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<XPathValue<'t>>) {
        self.variables.set(name, value);
    }

    pub fn functions_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.functions
    }

    pub fn context(&self) -> Node<'t> {
        self.context
    }

    pub fn options(&self) -> &XPathOptions {
        &self.options
    }

    pub fn evaluate(&self, text: &str) -> Result<XPathResult<'t>, XPathError> {
        evaluate_once_with_functions(
            text,
            self.context,
            &self.namespaces,
            &self.variables,
            &self.functions,
            &self.options,
        )
    }
}
