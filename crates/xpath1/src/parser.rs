//! A `nom`-based parser for the XPath 1.0 expression language.

use super::ast::*;
use crate::error::{SyntaxError, SyntaxErrorKind};
use nom::{
    Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit0, digit1, multispace0, satisfy},
    combinator::{map, not, opt, peek, recognize},
    error::{ErrorKind, ParseError},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated},
};

/// Parser error carrying the syntax error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SyntaxFailure<'a> {
    pub input: &'a str,
    pub kind: SyntaxErrorKind,
}

impl<'a> ParseError<&'a str> for SyntaxFailure<'a> {
    fn from_error_kind(input: &'a str, _kind: ErrorKind) -> Self {
        Self {
            input,
            kind: SyntaxErrorKind::InvalidExpression,
        }
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

type PResult<'a, O> = nom::IResult<&'a str, O, SyntaxFailure<'a>>;

// --- Main Public Parser ---

pub fn parse_expression(input: &str) -> Result<Expression, SyntaxError> {
    let offset = |rest: &str| input.len() - rest.len();
    match ws(expression).parse(input) {
        Ok(("", expr)) => Ok(expr),
        Ok((rest, _)) => Err(SyntaxError::new(
            SyntaxErrorKind::InvalidExpression,
            input,
            offset(rest),
        )),
        Err(nom::Err::Error(failure) | nom::Err::Failure(failure)) => Err(SyntaxError::new(
            failure.kind,
            input,
            offset(failure.input),
        )),
        Err(nom::Err::Incomplete(_)) => Err(SyntaxError::new(
            SyntaxErrorKind::InvalidExpression,
            input,
            input.len(),
        )),
    }
}

// --- Combinators & Helpers ---

fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

fn is_name_start_char(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

/// An operator name such as `and` or `div`, not followed by further name characters.
fn keyword<'a>(
    word: &'static str,
) -> impl Parser<&'a str, Output = &'a str, Error = SyntaxFailure<'a>> {
    terminated(tag(word), not(satisfy(is_name_char)))
}

fn build_binary_expr_parser<'a, F, G>(
    sub_expr_parser: F,
    op_parser: G,
) -> impl FnMut(&'a str) -> PResult<'a, Expression>
where
    F: Parser<&'a str, Output = Expression, Error = SyntaxFailure<'a>> + Clone,
    G: Parser<&'a str, Output = BinaryOperator, Error = SyntaxFailure<'a>> + Clone,
{
    move |input: &str| {
        let (input, mut left) = sub_expr_parser.clone().parse(input)?;
        let (input, remainder) =
            many0(pair(ws(op_parser.clone()), sub_expr_parser.clone())).parse(input)?;

        for (op, right) in remainder {
            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok((input, left))
    }
}

// --- Expression Parsers (in order of precedence) ---

fn expression(input: &str) -> PResult<'_, Expression> {
    or_expr(input)
}

fn or_op(input: &str) -> PResult<'_, BinaryOperator> {
    map(keyword("or"), |_| BinaryOperator::Or).parse(input)
}

fn and_op(input: &str) -> PResult<'_, BinaryOperator> {
    map(keyword("and"), |_| BinaryOperator::And).parse(input)
}

fn or_expr(input: &str) -> PResult<'_, Expression> {
    build_binary_expr_parser(and_expr, or_op)(input)
}

fn and_expr(input: &str) -> PResult<'_, Expression> {
    build_binary_expr_parser(equality_expr, and_op)(input)
}

fn equality_op(input: &str) -> PResult<'_, BinaryOperator> {
    alt((
        map(tag("="), |_| BinaryOperator::Equals),
        map(tag("!="), |_| BinaryOperator::NotEquals),
    ))
    .parse(input)
}

fn relational_op(input: &str) -> PResult<'_, BinaryOperator> {
    alt((
        map(tag("<="), |_| BinaryOperator::LessThanOrEqual),
        map(tag(">="), |_| BinaryOperator::GreaterThanOrEqual),
        map(tag("<"), |_| BinaryOperator::LessThan),
        map(tag(">"), |_| BinaryOperator::GreaterThan),
    ))
    .parse(input)
}

fn additive_op(input: &str) -> PResult<'_, BinaryOperator> {
    alt((
        map(char('+'), |_| BinaryOperator::Plus),
        map(char('-'), |_| BinaryOperator::Minus),
    ))
    .parse(input)
}

fn multiplicative_op(input: &str) -> PResult<'_, BinaryOperator> {
    alt((
        map(char('*'), |_| BinaryOperator::Multiply),
        map(keyword("div"), |_| BinaryOperator::Divide),
        map(keyword("mod"), |_| BinaryOperator::Modulo),
    ))
    .parse(input)
}

fn union_op(input: &str) -> PResult<'_, BinaryOperator> {
    map(char('|'), |_| BinaryOperator::Union).parse(input)
}

fn equality_expr(input: &str) -> PResult<'_, Expression> {
    build_binary_expr_parser(relational_expr, equality_op)(input)
}

fn relational_expr(input: &str) -> PResult<'_, Expression> {
    build_binary_expr_parser(additive_expr, relational_op)(input)
}

fn additive_expr(input: &str) -> PResult<'_, Expression> {
    build_binary_expr_parser(multiplicative_expr, additive_op)(input)
}

fn multiplicative_expr(input: &str) -> PResult<'_, Expression> {
    build_binary_expr_parser(unary_expr, multiplicative_op)(input)
}

fn unary_expr(input: &str) -> PResult<'_, Expression> {
    alt((
        map(preceded(ws(char('-')), unary_expr), |expr| {
            Expression::UnaryOp {
                op: UnaryOperator::Minus,
                expr: Box::new(expr),
            }
        }),
        union_expr,
    ))
    .parse(input)
}

fn union_expr(input: &str) -> PResult<'_, Expression> {
    build_binary_expr_parser(path_expr, union_op)(input)
}

fn path_separator(input: &str) -> PResult<'_, &str> {
    ws(alt((tag("//"), tag("/")))).parse(input)
}

/// Handles the ambiguity between location paths and primary expressions that
/// may be followed by predicates and a relative path.
fn path_expr(input: &str) -> PResult<'_, Expression> {
    // Primary expressions first: `position()` must not be read as a step named `position`.
    let (i, start_expr) = alt((
        filter_expr,
        map(ws(location_path), Expression::LocationPath),
    ))
    .parse(input)?;

    let (i, remainder_steps) = many0(pair(path_separator, step)).parse(i)?;

    if remainder_steps.is_empty() {
        return Ok((i, start_expr));
    }

    let (start_point, is_absolute, mut steps) = match start_expr {
        Expression::LocationPath(lp) => (lp.start_point, lp.is_absolute, lp.steps),
        other => (Some(Box::new(other)), false, vec![]),
    };
    push_steps(&mut steps, remainder_steps);

    Ok((
        i,
        Expression::LocationPath(LocationPath {
            start_point,
            is_absolute,
            steps,
        }),
    ))
}

fn push_steps(steps: &mut Vec<Step>, remainder: Vec<(&str, Step)>) {
    for (sep, next_step) in remainder {
        if sep == "//" {
            steps.push(Step::descendant_or_self());
        }
        steps.push(next_step);
    }
}

fn filter_expr(input: &str) -> PResult<'_, Expression> {
    let (i, primary) = primary_expr(input)?;
    let (i, predicates) = many0(predicate).parse(i)?;
    if predicates.is_empty() {
        return Ok((i, primary));
    }
    Ok((
        i,
        Expression::Filter {
            primary: Box::new(primary),
            predicates,
        },
    ))
}

fn primary_expr(input: &str) -> PResult<'_, Expression> {
    ws(alt((
        variable_reference,
        map(number, Expression::Number),
        map(string_literal, Expression::Literal),
        function_call,
        delimited(ws(char('(')), expression, ws(char(')'))),
    )))
    .parse(input)
}

// --- Literal Parsers ---

/// `Digits ('.' Digits?)? | '.' Digits`; no sign and no exponent.
fn number(input: &str) -> PResult<'_, f64> {
    let (i, text) = recognize(alt((
        recognize(pair(digit1, opt(pair(char('.'), digit0)))),
        recognize(pair(char('.'), digit1)),
    )))
    .parse(input)?;
    Ok((i, text.parse::<f64>().unwrap_or(f64::NAN)))
}

fn string_literal(input: &str) -> PResult<'_, String> {
    map(
        alt((
            delimited(char('\''), take_while(|c| c != '\''), char('\'')),
            delimited(char('"'), take_while(|c| c != '"'), char('"')),
        )),
        |s: &str| s.to_string(),
    )
    .parse(input)
}

// --- Variable Reference Parser ---
fn variable_reference(input: &str) -> PResult<'_, Expression> {
    map(preceded(char('$'), q_name), |(prefix, local)| {
        Expression::Variable(match prefix {
            Some(prefix) => format!("{prefix}:{local}"),
            None => local.to_string(),
        })
    })
    .parse(input)
}

// --- Name and NodeTest Parsers ---
fn nc_name(input: &str) -> PResult<'_, &str> {
    recognize(pair(
        take_while1(is_name_start_char),
        take_while(is_name_char),
    ))
    .parse(input)
}

fn q_name(input: &str) -> PResult<'_, (Option<&str>, &str)> {
    map(
        pair(nc_name, opt(preceded(char(':'), nc_name))),
        |(first, second)| match second {
            Some(local) => (Some(first), local),
            None => (None, first),
        },
    )
    .parse(input)
}

fn node_type_test(input: &str) -> PResult<'_, NodeTest> {
    alt((
        map(
            delimited(
                pair(tag("processing-instruction"), ws(char('('))),
                opt(ws(string_literal)),
                char(')'),
            ),
            |target| NodeTest::NodeType(NodeTypeTest::ProcessingInstruction(target)),
        ),
        map(
            terminated(
                alt((tag("text"), tag("node"), tag("comment"))),
                pair(ws(char('(')), char(')')),
            ),
            |node_type: &str| match node_type {
                "text" => NodeTest::NodeType(NodeTypeTest::Text),
                "comment" => NodeTest::NodeType(NodeTypeTest::Comment),
                _ => NodeTest::NodeType(NodeTypeTest::Node),
            },
        ),
    ))
    .parse(input)
}

fn node_test(input: &str) -> PResult<'_, NodeTest> {
    alt((
        map(tag("*"), |_| NodeTest::Wildcard),
        node_type_test,
        map(terminated(nc_name, tag(":*")), |prefix: &str| {
            NodeTest::PrefixWildcard(prefix.to_string())
        }),
        map(q_name, |(prefix, local)| {
            NodeTest::Name(NameTest::new(prefix, local))
        }),
    ))
    .parse(input)
}

// --- Path Parsers ---
fn axis(input: &str) -> PResult<'_, Axis> {
    map(
        terminated(
            alt((
                tag("ancestor-or-self"),
                tag("ancestor"),
                tag("attribute"),
                tag("child"),
                tag("descendant-or-self"),
                tag("descendant"),
                tag("following-sibling"),
                tag("following"),
                tag("namespace"),
                tag("parent"),
                tag("preceding-sibling"),
                tag("preceding"),
                tag("self"),
            )),
            ws(tag("::")),
        ),
        |axis_str: &str| match axis_str {
            "ancestor-or-self" => Axis::AncestorOrSelf,
            "ancestor" => Axis::Ancestor,
            "attribute" => Axis::Attribute,
            "descendant-or-self" => Axis::DescendantOrSelf,
            "descendant" => Axis::Descendant,
            "following-sibling" => Axis::FollowingSibling,
            "following" => Axis::Following,
            "namespace" => Axis::Namespace,
            "parent" => Axis::Parent,
            "preceding-sibling" => Axis::PrecedingSibling,
            "preceding" => Axis::Preceding,
            "self" => Axis::SelfAxis,
            _ => Axis::Child,
        },
    )
    .parse(input)
}

/// A bracketed predicate. Once `[` is seen, any failure is an invalid predicate.
fn predicate(input: &str) -> PResult<'_, Expression> {
    let (i, _) = ws(char('[')).parse(input)?;
    let (i, expr) = expression(i).map_err(invalid_predicate)?;
    let (i, _) = ws(char(']')).parse(i).map_err(invalid_predicate)?;
    Ok((i, expr))
}

fn invalid_predicate(err: nom::Err<SyntaxFailure<'_>>) -> nom::Err<SyntaxFailure<'_>> {
    match err {
        nom::Err::Incomplete(needed) => nom::Err::Incomplete(needed),
        nom::Err::Error(failure) | nom::Err::Failure(failure) => nom::Err::Failure(SyntaxFailure {
            input: failure.input,
            kind: SyntaxErrorKind::InvalidPredicate,
        }),
    }
}

fn abbreviated_step(input: &str) -> PResult<'_, Step> {
    alt((
        map(tag(".."), |_| Step {
            axis: Axis::Parent,
            node_test: NodeTest::NodeType(NodeTypeTest::Node),
            predicates: vec![],
        }),
        map(tag("."), |_| Step {
            axis: Axis::SelfAxis,
            node_test: NodeTest::NodeType(NodeTypeTest::Node),
            predicates: vec![],
        }),
    ))
    .parse(input)
}

fn step(input: &str) -> PResult<'_, Step> {
    if let Ok(result) = abbreviated_step(input) {
        return Ok(result);
    }
    let (i, (axis, node_test)) = alt((
        map(preceded(ws(char('@')), node_test), |nt| (Axis::Attribute, nt)),
        map(pair(opt(axis), node_test), |(ax, nt)| {
            (ax.unwrap_or(Axis::Child), nt)
        }),
    ))
    .parse(input)?;
    let (i, predicates) = many0(predicate).parse(i)?;
    Ok((
        i,
        Step {
            axis,
            node_test,
            predicates,
        },
    ))
}

fn location_path(input: &str) -> PResult<'_, LocationPath> {
    // This parser handles a path that does NOT start with a variable or function call.
    let (i, is_absolute, mut steps) = if let Ok((rem, _)) = tag::<_, _, SyntaxFailure<'_>>("//")(input) {
        let (rem, step) = preceded(multispace0, step).parse(rem)?;
        (rem, true, vec![Step::descendant_or_self(), step])
    } else if let Ok((rem, _)) = tag::<_, _, SyntaxFailure<'_>>("/")(input) {
        match preceded(multispace0, step).parse(rem) {
            Ok((rem, first_step)) => (rem, true, vec![first_step]),
            Err(nom::Err::Failure(failure)) => return Err(nom::Err::Failure(failure)),
            // A lone "/" selects the root.
            Err(_) => (rem, true, vec![]),
        }
    } else {
        let (rem, first_step) = step(input)?;
        (rem, false, vec![first_step])
    };

    if steps.is_empty() {
        return Ok((
            i,
            LocationPath {
                start_point: None,
                is_absolute,
                steps,
            },
        ));
    }

    // After the first step, subsequent steps MUST be preceded by / or //.
    let (i, remainder) = many0(pair(path_separator, step)).parse(i)?;
    push_steps(&mut steps, remainder);

    Ok((
        i,
        LocationPath {
            start_point: None,
            is_absolute,
            steps,
        },
    ))
}

// --- Function Call Parser ---
fn function_call(input: &str) -> PResult<'_, Expression> {
    // A function call must be a QName followed by '('. This lookahead avoids
    // parsing a simple step name (like 'foo' in 'foo/bar') as a function.
    let (i, (prefix, local)) = q_name(input)?;
    let (i, _) = peek(ws(char('('))).parse(i)?;

    // Node-type tests like text() are not functions. They are handled by the step parser.
    if prefix.is_none()
        && matches!(local, "text" | "node" | "comment" | "processing-instruction")
    {
        return Err(nom::Err::Error(SyntaxFailure::from_error_kind(
            input,
            ErrorKind::Verify,
        )));
    }

    let (i, _) = multispace0(i)?;
    let (i, args) = delimited(
        char('('),
        separated_list0(ws(char(',')), ws(expression)),
        char(')'),
    )
    .parse(i)?;

    Ok((
        i,
        Expression::FunctionCall {
            name: FunctionName::new(prefix, local),
            args,
        },
    ))
}
