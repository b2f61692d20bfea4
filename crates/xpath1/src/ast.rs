//! Defines the Abstract Syntax Tree (AST) for XPath 1.0 expressions.

use std::collections::BTreeSet;
use std::fmt;

/// The top-level expression that can be evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(String),
    Number(f64),
    LocationPath(LocationPath),
    Variable(String),
    FunctionCall {
        name: FunctionName,
        args: Vec<Expression>,
    },
    /// A primary expression followed by predicates, e.g. `(//a)[1]` or `$v[2]`.
    Filter {
        primary: Box<Expression>,
        predicates: Vec<Expression>,
    },
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
    UnaryOp {
        op: UnaryOperator,
        expr: Box<Expression>,
    },
}

impl Expression {
    /// Checks if the expression is a `LocationPath` variant.
    pub fn is_location_path(&self) -> bool {
        matches!(self, Expression::LocationPath(_))
    }

    /// Checks if the expression is a `BinaryOp` variant.
    pub fn is_binary_op(&self) -> bool {
        matches!(self, Expression::BinaryOp { .. })
    }

    /// True when the expression is a path whose final step walks a reverse axis.
    pub fn ends_with_reverse_axis(&self) -> bool {
        match self {
            Expression::LocationPath(path) => path
                .steps
                .last()
                .is_some_and(|step| step.axis.is_reverse()),
            _ => false,
        }
    }

    /// Namespace prefixes used by name tests and function names.
    pub fn referenced_prefixes(&self) -> BTreeSet<String> {
        let mut prefixes = BTreeSet::new();
        self.walk(&mut |expr| {
            if let Expression::FunctionCall {
                name:
                    FunctionName {
                        prefix: Some(prefix),
                        ..
                    },
                ..
            } = expr
            {
                prefixes.insert(prefix.clone());
            }
            if let Expression::LocationPath(path) = expr {
                for step in &path.steps {
                    match &step.node_test {
                        NodeTest::Name(NameTest {
                            prefix: Some(prefix),
                            ..
                        })
                        | NodeTest::PrefixWildcard(prefix) => {
                            prefixes.insert(prefix.clone());
                        }
                        _ => {}
                    }
                }
            }
        });
        prefixes
    }

    /// Names of all `$variable` references.
    pub fn referenced_variables(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.walk(&mut |expr| {
            if let Expression::Variable(name) = expr {
                names.insert(name.clone());
            }
        });
        names
    }

    /// Visits this expression and every nested one, including predicates.
    fn walk(&self, visit: &mut dyn FnMut(&Expression)) {
        visit(self);
        match self {
            Expression::Literal(_) | Expression::Number(_) | Expression::Variable(_) => {}
            Expression::LocationPath(path) => {
                if let Some(start) = &path.start_point {
                    start.walk(visit);
                }
                for step in &path.steps {
                    for predicate in &step.predicates {
                        predicate.walk(visit);
                    }
                }
            }
            Expression::FunctionCall { args, .. } => {
                for arg in args {
                    arg.walk(visit);
                }
            }
            Expression::Filter {
                primary,
                predicates,
            } => {
                primary.walk(visit);
                for predicate in predicates {
                    predicate.walk(visit);
                }
            }
            Expression::BinaryOp { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            Expression::UnaryOp { expr, .. } => expr.walk(visit),
        }
    }
}

/// A possibly prefixed function name, e.g. `count` or `re:test`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionName {
    pub prefix: Option<String>,
    pub local: String,
}

impl FunctionName {
    pub fn new(prefix: Option<&str>, local: &str) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            local: local.to_string(),
        }
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

/// A unary operator used in an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Minus,
}

/// A binary operator used in an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Logical
    Or,
    And,
    // Equality
    Equals,
    NotEquals,
    // Relational
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    // Additive
    Plus,
    Minus,
    // Multiplicative
    Multiply,
    Divide,
    Modulo,
    // Set
    Union,
}

/// Represents a full location path, like `/child::foo`, `descendant::bar[1]`, or `$var/item`.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    /// An optional starting expression, for paths like `$var/foo` or `func()/foo`.
    /// If `None`, the path starts from the context node or root.
    pub start_point: Option<Box<Expression>>,
    /// True if the path starts from the document root (e.g., `/foo`).
    /// Meaningless if `start_point` is `Some`.
    pub is_absolute: bool,
    pub steps: Vec<Step>,
}

/// Represents a single step in a location path, like `child::foo[position() > 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Expression>,
}

impl Step {
    /// `descendant-or-self::node()`, the expansion of `//`.
    pub fn descendant_or_self() -> Self {
        Self {
            axis: Axis::DescendantOrSelf,
            node_test: NodeTest::NodeType(NodeTypeTest::Node),
            predicates: vec![],
        }
    }
}

/// The axis of movement from the context node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Attribute,
    Namespace,
    Parent,
    Ancestor,
    AncestorOrSelf,
    SelfAxis,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
}

impl Axis {
    /// Reverse axes number their proximity positions backwards from the context node.
    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            Axis::Ancestor | Axis::AncestorOrSelf | Axis::Preceding | Axis::PrecedingSibling
        )
    }
}

/// A test to apply to nodes on a given axis to see if they should be included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// A qualified name test (e.g., `foo`, `xsl:if`).
    Name(NameTest),
    /// A wildcard test (`*`).
    Wildcard,
    /// Any name in the namespace bound to a prefix (`p:*`).
    PrefixWildcard(String),
    /// A node type test (e.g., `text()`, `node()`).
    NodeType(NodeTypeTest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTest {
    pub prefix: Option<String>,
    pub local: String,
}

impl NameTest {
    pub fn new(prefix: Option<&str>, local: &str) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            local: local.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTypeTest {
    Text,
    Node,
    Comment,
    /// `processing-instruction()` with an optional target literal.
    ProcessingInstruction(Option<String>),
}
