//! Binary operator semantics: comparisons, arithmetic and union.

use crate::ast::BinaryOperator;
use crate::error::{EvalError, XPathError};
use crate::value::{XPathValue, parse_number};
use arbor_tree::Node;

/// Applies a binary operator to two already evaluated operands. The engine
/// short-circuits `or`/`and` before reaching this point.
pub fn evaluate<'t>(
    op: BinaryOperator,
    left: XPathValue<'t>,
    right: XPathValue<'t>,
) -> Result<XPathValue<'t>, XPathError> {
    use BinaryOperator::*;
    let value = match op {
        Or => XPathValue::Boolean(left.to_bool() || right.to_bool()),
        And => XPathValue::Boolean(left.to_bool() && right.to_bool()),
        Equals | NotEquals | LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
            XPathValue::Boolean(compare(op, &left, &right))
        }
        Plus => XPathValue::Number(left.to_number() + right.to_number()),
        Minus => XPathValue::Number(left.to_number() - right.to_number()),
        Multiply => XPathValue::Number(left.to_number() * right.to_number()),
        Divide => XPathValue::Number(left.to_number() / right.to_number()),
        // `%` truncates towards zero and keeps the dividend's sign, as `mod` requires.
        Modulo => XPathValue::Number(left.to_number() % right.to_number()),
        Union => return union(left, right),
    };
    Ok(value)
}

fn union<'t>(left: XPathValue<'t>, right: XPathValue<'t>) -> Result<XPathValue<'t>, XPathError> {
    match (left, right) {
        (XPathValue::NodeSet(mut nodes), XPathValue::NodeSet(more)) => {
            nodes.extend(more);
            nodes.sort_unstable();
            nodes.dedup();
            Ok(XPathValue::NodeSet(nodes))
        }
        (left, right) => Err(EvalError::TypeError(format!(
            "Union operands must be node-sets, got {} and {}",
            left.type_name(),
            right.type_name()
        ))
        .into()),
    }
}

/// XPath 1.0 comparison: node-sets compare existentially, other operands are
/// promoted to boolean, number or string depending on the operator.
pub fn compare(op: BinaryOperator, left: &XPathValue<'_>, right: &XPathValue<'_>) -> bool {
    match (left, right) {
        (XPathValue::NodeSet(lhs), XPathValue::NodeSet(rhs)) => {
            let right_values: Vec<String> = rhs.iter().map(|n| n.string_value()).collect();
            lhs.iter().any(|node| {
                let value = node.string_value();
                right_values
                    .iter()
                    .any(|other| compare_strings(op, &value, other))
            })
        }
        (XPathValue::NodeSet(nodes), other) => compare_node_set(op, nodes, other),
        (other, XPathValue::NodeSet(nodes)) => compare_node_set(flip(op), nodes, other),
        _ => compare_scalars(op, left, right),
    }
}

/// Mirrors a relational operator so the node-set operand can sit on the left.
fn flip(op: BinaryOperator) -> BinaryOperator {
    match op {
        BinaryOperator::LessThan => BinaryOperator::GreaterThan,
        BinaryOperator::LessThanOrEqual => BinaryOperator::GreaterThanOrEqual,
        BinaryOperator::GreaterThan => BinaryOperator::LessThan,
        BinaryOperator::GreaterThanOrEqual => BinaryOperator::LessThanOrEqual,
        other => other,
    }
}

fn compare_node_set(op: BinaryOperator, nodes: &[Node<'_>], other: &XPathValue<'_>) -> bool {
    match other {
        XPathValue::Boolean(b) => compare_scalars(
            op,
            &XPathValue::Boolean(!nodes.is_empty()),
            &XPathValue::Boolean(*b),
        ),
        XPathValue::Number(n) => nodes
            .iter()
            .any(|node| compare_numbers(op, parse_number(&node.string_value()), *n)),
        XPathValue::String(s) => nodes
            .iter()
            .any(|node| compare_strings(op, &node.string_value(), s)),
        XPathValue::NodeSet(_) => compare(op, &XPathValue::NodeSet(nodes.to_vec()), other),
    }
}

fn compare_scalars(op: BinaryOperator, left: &XPathValue<'_>, right: &XPathValue<'_>) -> bool {
    match op {
        BinaryOperator::Equals | BinaryOperator::NotEquals => {
            let equal = if matches!(left, XPathValue::Boolean(_))
                || matches!(right, XPathValue::Boolean(_))
            {
                left.to_bool() == right.to_bool()
            } else if matches!(left, XPathValue::Number(_))
                || matches!(right, XPathValue::Number(_))
            {
                left.to_number() == right.to_number()
            } else {
                left.to_string() == right.to_string()
            };
            (op == BinaryOperator::Equals) == equal
        }
        _ => compare_numbers(op, left.to_number(), right.to_number()),
    }
}

fn compare_strings(op: BinaryOperator, left: &str, right: &str) -> bool {
    match op {
        BinaryOperator::Equals => left == right,
        BinaryOperator::NotEquals => left != right,
        _ => compare_numbers(op, parse_number(left), parse_number(right)),
    }
}

fn compare_numbers(op: BinaryOperator, left: f64, right: f64) -> bool {
    match op {
        BinaryOperator::Equals => left == right,
        BinaryOperator::NotEquals => left != right,
        BinaryOperator::LessThan => left < right,
        BinaryOperator::LessThanOrEqual => left <= right,
        BinaryOperator::GreaterThan => left > right,
        BinaryOperator::GreaterThanOrEqual => left >= right,
        _ => false,
    }
}
