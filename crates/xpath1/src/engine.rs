//! The evaluation engine for executing a parsed XPath AST against an `arbor_tree::Tree`.

use super::ast::{
    Axis, BinaryOperator, Expression, LocationPath, NameTest, NodeTest, NodeTypeTest, Step,
    UnaryOperator,
};
use super::functions::{self, FunctionRegistry};
use super::{axes, operators};
use crate::error::{EvalError, XPathError};
use crate::namespaces::NamespaceResolver;
use crate::options::XPathOptions;
use crate::value::XPathValue;
use crate::variables::Variables;
use arbor_tree::{Node, NodeType};

/// A container for all state needed during expression evaluation.
/// `'t` is the lifetime of the borrowed tree.
/// `'e` is the lifetime of the evaluation environment (bindings, registry, options).
#[derive(Clone, Copy)]
pub struct EvaluationContext<'t, 'e> {
    pub context_node: Node<'t>,
    pub context_position: usize, // 1-based index
    pub context_size: usize,
    pub variables: &'e Variables<'t>,
    pub functions: &'e FunctionRegistry,
    pub namespaces: NamespaceResolver<'e>,
    pub options: &'e XPathOptions,
}

impl<'t, 'e> EvaluationContext<'t, 'e> {
    pub fn new(
        context_node: Node<'t>,
        variables: &'e Variables<'t>,
        functions: &'e FunctionRegistry,
        namespaces: NamespaceResolver<'e>,
        options: &'e XPathOptions,
    ) -> Self {
        Self {
            context_node,
            context_position: 1,
            context_size: 1,
            variables,
            functions,
            namespaces,
            options,
        }
    }

    /// The same environment focused on another node.
    pub fn with_focus(&self, node: Node<'t>, position: usize, size: usize) -> Self {
        Self {
            context_node: node,
            context_position: position,
            context_size: size,
            ..*self
        }
    }

    /// The document root of the context node's tree.
    pub fn root_node(&self) -> Node<'t> {
        self.context_node.tree().root()
    }
}

/// Evaluates a parsed expression and returns a concrete `XPathValue`.
pub fn evaluate<'t>(
    expr: &Expression,
    e_ctx: &EvaluationContext<'t, '_>,
) -> Result<XPathValue<'t>, XPathError> {
    match expr {
        Expression::Literal(s) => Ok(XPathValue::String(s.clone())),
        Expression::Number(n) => Ok(XPathValue::Number(*n)),
        Expression::LocationPath(path) => {
            let nodes = evaluate_location_path(path, e_ctx)?;
            Ok(XPathValue::NodeSet(nodes))
        }
        Expression::Variable(name) => e_ctx
            .variables
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UndefinedVariable(name.clone()).into()),
        Expression::FunctionCall { name, args } => {
            let mut evaluated_args = Vec::with_capacity(args.len());
            for arg in args {
                evaluated_args.push(evaluate(arg, e_ctx)?);
            }
            functions::evaluate_function(name, evaluated_args, e_ctx)
        }
        Expression::Filter {
            primary,
            predicates,
        } => {
            let nodes = expect_node_set(evaluate(primary, e_ctx)?, "A predicate")?;
            let nodes = apply_predicates(nodes, predicates, e_ctx)?;
            Ok(XPathValue::NodeSet(nodes))
        }
        Expression::BinaryOp { left, op, right } => match op {
            BinaryOperator::Or => {
                if evaluate(left, e_ctx)?.to_bool() {
                    return Ok(XPathValue::Boolean(true));
                }
                Ok(XPathValue::Boolean(evaluate(right, e_ctx)?.to_bool()))
            }
            BinaryOperator::And => {
                if !evaluate(left, e_ctx)?.to_bool() {
                    return Ok(XPathValue::Boolean(false));
                }
                Ok(XPathValue::Boolean(evaluate(right, e_ctx)?.to_bool()))
            }
            _ => {
                let left_val = evaluate(left, e_ctx)?;
                let right_val = evaluate(right, e_ctx)?;
                operators::evaluate(*op, left_val, right_val)
            }
        },
        Expression::UnaryOp { op, expr } => {
            let val = evaluate(expr, e_ctx)?;
            match op {
                UnaryOperator::Minus => Ok(XPathValue::Number(-val.to_number())),
            }
        }
    }
}

fn expect_node_set<'t>(value: XPathValue<'t>, what: &str) -> Result<Vec<Node<'t>>, XPathError> {
    match value {
        XPathValue::NodeSet(nodes) => Ok(nodes),
        other => Err(EvalError::TypeError(format!(
            "{} requires a node-set, got {}",
            what,
            other.type_name()
        ))
        .into()),
    }
}

fn evaluate_location_path<'t>(
    path: &LocationPath,
    e_ctx: &EvaluationContext<'t, '_>,
) -> Result<Vec<Node<'t>>, XPathError> {
    let mut current_nodes = if let Some(start_expr) = &path.start_point {
        // The path starts from the result of another expression.
        expect_node_set(evaluate(start_expr, e_ctx)?, "A location path step")?
    } else if path.is_absolute {
        vec![e_ctx.root_node()]
    } else {
        vec![e_ctx.context_node]
    };

    for step in &path.steps {
        current_nodes = evaluate_step(step, &current_nodes, e_ctx)?;
    }
    Ok(current_nodes)
}

/// Evaluates one step for every context node: axis collection, node test and
/// predicates run per context node, then the partial results are merged into
/// document order.
fn evaluate_step<'t>(
    step: &Step,
    context_nodes: &[Node<'t>],
    e_ctx: &EvaluationContext<'t, '_>,
) -> Result<Vec<Node<'t>>, XPathError> {
    if context_nodes.is_empty() {
        return Ok(vec![]);
    }
    let test = ResolvedTest::new(&step.node_test, step.axis, e_ctx)?;

    let mut result = Vec::new();
    for &node in context_nodes {
        let axis_nodes = collect_axis_nodes(step.axis, node);
        let tested: Vec<Node<'t>> = axis_nodes
            .into_iter()
            .filter(|candidate| test.matches(*candidate))
            .collect();
        result.extend(apply_predicates(tested, &step.predicates, e_ctx)?);
    }

    if context_nodes.len() > 1 || step.axis.is_reverse() {
        result.sort_unstable();
        result.dedup();
    }
    log::trace!(
        "Step {:?}::{:?} selected {} nodes",
        step.axis,
        step.node_test,
        result.len()
    );
    Ok(result)
}

/// Stage 1: Collects the nodes along an axis from one context node, in axis order.
fn collect_axis_nodes(axis: Axis, node: Node<'_>) -> Vec<Node<'_>> {
    let mut results = Vec::new();
    match axis {
        Axis::Child => axes::collect_child_nodes(node, &mut results),
        Axis::Attribute => axes::collect_attribute_nodes(node, &mut results),
        Axis::Namespace => axes::collect_namespace_nodes(node, &mut results),
        Axis::Descendant => axes::collect_descendant_nodes(node, &mut results),
        Axis::DescendantOrSelf => axes::collect_descendant_or_self_nodes(node, &mut results),
        Axis::Parent => axes::collect_parent_nodes(node, &mut results),
        Axis::Ancestor => axes::collect_ancestor_nodes(node, &mut results),
        Axis::AncestorOrSelf => axes::collect_ancestor_or_self_nodes(node, &mut results),
        Axis::SelfAxis => axes::collect_self_nodes(node, &mut results),
        Axis::FollowingSibling => axes::collect_following_sibling_nodes(node, &mut results),
        Axis::PrecedingSibling => axes::collect_preceding_sibling_nodes(node, &mut results),
        Axis::Following => axes::collect_following_nodes(node, &mut results),
        Axis::Preceding => axes::collect_preceding_nodes(node, &mut results),
    }
    results
}

/// Stage 2: A node test with its prefix already resolved.
struct ResolvedTest<'s, 'e> {
    test: &'s NodeTest,
    principal: NodeType,
    namespace: Option<&'e str>,
}

impl<'s, 'e> ResolvedTest<'s, 'e> {
    fn new(
        test: &'s NodeTest,
        axis: Axis,
        e_ctx: &EvaluationContext<'_, 'e>,
    ) -> Result<Self, XPathError> {
        let principal = match axis {
            Axis::Attribute => NodeType::Attribute,
            Axis::Namespace => NodeType::Namespace,
            _ => NodeType::Element,
        };
        let namespace = match test {
            NodeTest::Name(NameTest {
                prefix: Some(prefix),
                ..
            })
            | NodeTest::PrefixWildcard(prefix) => Some(e_ctx.namespaces.resolve(prefix)?),
            _ => None,
        };
        Ok(Self {
            test,
            principal,
            namespace,
        })
    }

    fn matches(&self, node: Node<'_>) -> bool {
        match self.test {
            NodeTest::Wildcard => node.node_type() == self.principal,
            NodeTest::PrefixWildcard(_) => {
                node.node_type() == self.principal && node.namespace_uri() == self.namespace
            }
            NodeTest::Name(name) => {
                node.node_type() == self.principal
                    && node.local_name() == Some(name.local.as_str())
                    && node.namespace_uri() == self.namespace
            }
            NodeTest::NodeType(node_type) => match node_type {
                NodeTypeTest::Node => true,
                NodeTypeTest::Text => node.node_type() == NodeType::Text,
                NodeTypeTest::Comment => node.node_type() == NodeType::Comment,
                NodeTypeTest::ProcessingInstruction(target) => {
                    node.node_type() == NodeType::ProcessingInstruction
                        && target
                            .as_deref()
                            .is_none_or(|target| node.local_name() == Some(target))
                }
            },
        }
    }
}

/// Stage 3: Filters nodes (given in axis order) by a series of predicates.
/// A numeric predicate result selects by proximity position.
fn apply_predicates<'t>(
    nodes: Vec<Node<'t>>,
    predicates: &[Expression],
    e_ctx: &EvaluationContext<'t, '_>,
) -> Result<Vec<Node<'t>>, XPathError> {
    let mut final_nodes = nodes;
    for predicate in predicates {
        let context_size = final_nodes.len();
        let mut predicate_results = Vec::with_capacity(context_size);
        for (i, node) in final_nodes.iter().enumerate() {
            let predicate_e_ctx = e_ctx.with_focus(*node, i + 1, context_size);
            let keep = match evaluate(predicate, &predicate_e_ctx)? {
                XPathValue::Number(n) => n == (i + 1) as f64,
                other => other.to_bool(),
            };
            if keep {
                predicate_results.push(*node);
            }
        }
        final_nodes = predicate_results;
    }
    Ok(final_nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::NamespaceMap;
    use crate::parser::parse_expression;
    use arbor_tree::{Tree, xml};

    const DOC: &str = r#"<doc xml:lang="en"><para id="p1">Hello</para><!--note--><div><para>Inner</para></div><?pi data?><para id="p2">World</para></doc>"#;

    struct TestSetup {
        funcs: FunctionRegistry,
        namespaces: NamespaceMap,
        options: XPathOptions,
    }

    impl TestSetup {
        fn new() -> Self {
            Self {
                funcs: FunctionRegistry::default(),
                namespaces: NamespaceMap::new(),
                options: XPathOptions::default(),
            }
        }

        fn eval<'t>(
            &self,
            tree: &'t Tree,
            vars: &Variables<'t>,
            expr: &str,
        ) -> Result<XPathValue<'t>, XPathError> {
            let e_ctx = EvaluationContext::new(
                tree.root(),
                vars,
                &self.funcs,
                NamespaceResolver::new(&self.namespaces, true),
                &self.options,
            );
            let expr = parse_expression(expr)?;
            evaluate(&expr, &e_ctx)
        }
    }

    fn texts(value: XPathValue<'_>) -> Vec<String> {
        match value {
            XPathValue::NodeSet(nodes) => nodes.iter().map(|n| n.string_value()).collect(),
            other => panic!("Expected a NodeSet, got {other:?}"),
        }
    }

    #[test]
    fn test_predicate_by_attribute() {
        let tree = xml::parse(DOC).unwrap();
        let setup = TestSetup::new();
        let vars = Variables::new();
        let result = setup.eval(&tree, &vars, "doc/para[@id='p2']").unwrap();
        assert_eq!(texts(result), vec!["World"]);
    }

    #[test]
    fn test_predicates_apply_per_context_node() {
        let _ = env_logger::builder().is_test(true).try_init();
        let tree = xml::parse(DOC).unwrap();
        let setup = TestSetup::new();
        let vars = Variables::new();
        let first_paras = setup.eval(&tree, &vars, "//para[1]").unwrap();
        assert_eq!(texts(first_paras), vec!["Hello", "Inner"]);

        let last = setup.eval(&tree, &vars, "(//para)[last()]").unwrap();
        assert_eq!(texts(last), vec!["World"]);
    }

    #[test]
    fn test_reverse_axis_positions() {
        let _ = env_logger::builder().is_test(true).try_init();
        let tree = xml::parse(DOC).unwrap();
        let setup = TestSetup::new();
        let vars = Variables::new();
        let nearest = setup
            .eval(&tree, &vars, "//para[@id='p2']/preceding-sibling::*[1]")
            .unwrap();
        assert_eq!(texts(nearest), vec!["Inner"]);

        let ancestors = setup
            .eval(&tree, &vars, "//div/para/ancestor-or-self::*")
            .unwrap();
        assert_eq!(
            texts(ancestors),
            vec!["HelloInnerWorld", "Inner", "Inner"]
        );
    }

    #[test]
    fn test_node_type_tests() {
        let tree = xml::parse(DOC).unwrap();
        let setup = TestSetup::new();
        let vars = Variables::new();
        assert_eq!(
            texts(setup.eval(&tree, &vars, "/doc/comment()").unwrap()),
            vec!["note"]
        );
        assert_eq!(
            texts(setup.eval(&tree, &vars, "/doc/processing-instruction('pi')").unwrap()),
            vec!["data"]
        );
        assert!(
            texts(setup.eval(&tree, &vars, "/doc/processing-instruction('other')").unwrap())
                .is_empty()
        );
        let count = setup.eval(&tree, &vars, "count(/doc/node())").unwrap();
        assert_eq!(count.to_number(), 5.0);
        let namespaces = setup.eval(&tree, &vars, "count(/doc/namespace::*)").unwrap();
        assert_eq!(namespaces.to_number(), 1.0);
        let xml_ns = setup.eval(&tree, &vars, "string(/doc/namespace::xml)").unwrap();
        assert_eq!(xml_ns.to_string(), arbor_tree::XML_NAMESPACE);
    }

    #[test]
    fn test_variables() {
        let tree = xml::parse(DOC).unwrap();
        let setup = TestSetup::new();
        let doc = tree.document_element().unwrap();
        let vars = Variables::new().with("myVar", "test-value").with("doc", doc);

        let result = setup.eval(&tree, &vars, "$myVar").unwrap();
        assert_eq!(result.to_string(), "test-value");

        let from_var = setup.eval(&tree, &vars, "$doc/para/text()").unwrap();
        assert_eq!(texts(from_var), vec!["Hello", "World"]);

        let err = setup.eval(&tree, &vars, "$missing").unwrap_err();
        assert_eq!(err, XPathError::Eval(EvalError::UndefinedVariable("missing".into())));
    }

    #[test]
    fn test_path_from_non_node_set_is_type_error() {
        let tree = xml::parse(DOC).unwrap();
        let setup = TestSetup::new();
        let vars = Variables::new().with("s", "text");
        let err = setup.eval(&tree, &vars, "$s/para").unwrap_err();
        assert!(matches!(err, XPathError::Eval(EvalError::TypeError(_))));
        let err = setup.eval(&tree, &vars, "$s[1]").unwrap_err();
        assert!(matches!(err, XPathError::Eval(EvalError::TypeError(_))));
    }

    #[test]
    fn test_boolean_operators_short_circuit() {
        let tree = xml::parse(DOC).unwrap();
        let setup = TestSetup::new();
        let vars = Variables::new();
        // The right-hand side would fail with an undefined variable.
        let result = setup.eval(&tree, &vars, "true() or $missing").unwrap();
        assert_eq!(result, XPathValue::Boolean(true));
        let result = setup.eval(&tree, &vars, "false() and $missing").unwrap();
        assert_eq!(result, XPathValue::Boolean(false));
    }

    #[test]
    fn test_undefined_prefix_is_reported_at_evaluation() {
        let tree = xml::parse(DOC).unwrap();
        let setup = TestSetup::new();
        let vars = Variables::new();
        let err = setup.eval(&tree, &vars, "//foo:bar").unwrap_err();
        assert_eq!(
            err,
            XPathError::UndefinedPrefix {
                prefix: "foo".into()
            }
        );
    }
}
