//! A `nom` parser for the XPath subset used by the rule tables.

use super::ast::*;
use crate::error::QueryError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit0, digit1, multispace0},
    combinator::{map, not, opt, recognize, value, verify},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated},
};

pub fn parse_expression(input: &str) -> Result<Expression, QueryError> {
    match expression(input.trim()) {
        Ok(("", expr)) => Ok(expr),
        Ok((rest, _)) => Err(QueryError::Parse {
            query: input.to_string(),
            message: format!("unexpected input at '{}'", rest),
        }),
        Err(e) => Err(QueryError::Parse {
            query: input.to_string(),
            message: e.to_string(),
        }),
    }
}

// --- Helpers ---

fn ws<'a, F, O>(inner: F) -> impl Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>
where
    F: Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>,
{
    delimited(multispace0, inner, multispace0)
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

/// An operator word that is not the prefix of a longer name.
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    move |input: &'a str| terminated(tag(word), not(take_while1(is_name_char))).parse(input)
}

/// Left-associative chain `operand (operator operand)*`.
fn binary_chain<'a>(
    input: &'a str,
    operand: fn(&'a str) -> IResult<&'a str, Expression>,
    operator: fn(&'a str) -> IResult<&'a str, BinaryOperator>,
) -> IResult<&'a str, Expression> {
    let (mut input, mut left) = operand(input)?;
    loop {
        match pair(ws(operator), operand).parse(input) {
            Ok((rest, (op, right))) => {
                left = Expression::BinaryOp {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                };
                input = rest;
            }
            Err(nom::Err::Error(_)) => return Ok((input, left)),
            Err(e) => return Err(e),
        }
    }
}

// --- Expressions, lowest precedence first ---

fn expression(input: &str) -> IResult<&str, Expression> {
    or_expr(input)
}

fn or_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(input, and_expr, or_op)
}

fn and_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(input, equality_expr, and_op)
}

fn equality_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(input, relational_expr, equality_op)
}

fn relational_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(input, additive_expr, relational_op)
}

fn additive_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(input, multiplicative_expr, additive_op)
}

fn multiplicative_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(input, unary_expr, multiplicative_op)
}

fn union_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(input, path_expr, union_op)
}

fn or_op(input: &str) -> IResult<&str, BinaryOperator> {
    value(BinaryOperator::Or, keyword("or")).parse(input)
}

fn and_op(input: &str) -> IResult<&str, BinaryOperator> {
    value(BinaryOperator::And, keyword("and")).parse(input)
}

fn equality_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        value(BinaryOperator::NotEquals, tag("!=")),
        value(BinaryOperator::Equals, tag("=")),
    ))
    .parse(input)
}

fn relational_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        value(BinaryOperator::LessThanOrEqual, tag("<=")),
        value(BinaryOperator::GreaterThanOrEqual, tag(">=")),
        value(BinaryOperator::LessThan, tag("<")),
        value(BinaryOperator::GreaterThan, tag(">")),
    ))
    .parse(input)
}

fn additive_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        value(BinaryOperator::Plus, tag("+")),
        value(BinaryOperator::Minus, tag("-")),
    ))
    .parse(input)
}

fn multiplicative_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        value(BinaryOperator::Multiply, tag("*")),
        value(BinaryOperator::Divide, keyword("div")),
        value(BinaryOperator::Modulo, keyword("mod")),
    ))
    .parse(input)
}

fn union_op(input: &str) -> IResult<&str, BinaryOperator> {
    value(BinaryOperator::Union, tag("|")).parse(input)
}

fn unary_expr(input: &str) -> IResult<&str, Expression> {
    alt((
        map(preceded(ws(char('-')), unary_expr), |expr| {
            Expression::Negate(Box::new(expr))
        }),
        union_expr,
    ))
    .parse(input)
}

/// A filter expression optionally continued by steps, or a plain location path.
/// Primary expressions go first so `contains(...)` is not read as a step.
fn path_expr(input: &str) -> IResult<&str, Expression> {
    alt((
        filter_path,
        map(ws(location_path), Expression::LocationPath),
    ))
    .parse(input)
}

fn filter_path(input: &str) -> IResult<&str, Expression> {
    let (input, base) = primary_expr(input)?;
    let (input, predicates) = many0(predicate).parse(input)?;
    let base = if predicates.is_empty() {
        base
    } else {
        Expression::Filter {
            base: Box::new(base),
            predicates,
        }
    };

    let (input, more) = many0(pair(separator, step)).parse(input)?;
    if more.is_empty() {
        return Ok((input, base));
    }

    let mut steps = Vec::new();
    push_steps(&mut steps, more);
    Ok((
        input,
        Expression::LocationPath(LocationPath {
            start: Some(Box::new(base)),
            absolute: false,
            steps,
        }),
    ))
}

fn primary_expr(input: &str) -> IResult<&str, Expression> {
    ws(alt((
        map(number, Expression::Number),
        map(string_literal, Expression::Literal),
        function_call,
        delimited(ws(char('(')), expression, ws(char(')'))),
    )))
    .parse(input)
}

// --- Literals ---

fn number(input: &str) -> IResult<&str, f64> {
    map(
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
        |digits: &str| digits.parse::<f64>().unwrap_or(f64::NAN),
    )
    .parse(input)
}

fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        alt((
            delimited(char('\''), take_while(|c| c != '\''), char('\'')),
            delimited(char('"'), take_while(|c| c != '"'), char('"')),
        )),
        |s: &str| s.to_string(),
    )
    .parse(input)
}

fn name(input: &str) -> IResult<&str, &str> {
    recognize(pair(take_while1(is_name_start), take_while(is_name_char))).parse(input)
}

fn function_call(input: &str) -> IResult<&str, Expression> {
    // text(), node() and comment() are node tests, not functions
    let (input, name) = verify(name, |n: &str| !matches!(n, "text" | "node" | "comment"))
        .parse(input)?;
    let (input, args) = delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), expression),
        ws(char(')')),
    )
    .parse(input)?;
    Ok((
        input,
        Expression::FunctionCall {
            name: name.to_string(),
            args,
        },
    ))
}

// --- Location paths ---

fn separator(input: &str) -> IResult<&str, &str> {
    ws(alt((tag("//"), tag("/")))).parse(input)
}

fn push_steps(steps: &mut Vec<Step>, more: Vec<(&str, Step)>) {
    for (sep, step) in more {
        if sep == "//" {
            steps.push(Step::descendant_or_self());
        }
        steps.push(step);
    }
}

fn location_path(input: &str) -> IResult<&str, LocationPath> {
    alt((
        map(preceded(tag("//"), relative_steps), |steps| {
            let mut all = vec![Step::descendant_or_self()];
            all.extend(steps);
            LocationPath {
                start: None,
                absolute: true,
                steps: all,
            }
        }),
        map(preceded(char('/'), opt(relative_steps)), |steps| LocationPath {
            start: None,
            absolute: true,
            steps: steps.unwrap_or_default(),
        }),
        map(relative_steps, |steps| LocationPath {
            start: None,
            absolute: false,
            steps,
        }),
    ))
    .parse(input)
}

fn relative_steps(input: &str) -> IResult<&str, Vec<Step>> {
    let (input, first) = step(input)?;
    let (input, more) = many0(pair(separator, step)).parse(input)?;
    let mut steps = vec![first];
    push_steps(&mut steps, more);
    Ok((input, steps))
}

fn step(input: &str) -> IResult<&str, Step> {
    alt((
        value(
            Step {
                axis: Axis::Parent,
                test: NodeTest::Kind(KindTest::Node),
                predicates: vec![],
            },
            tag(".."),
        ),
        value(
            Step {
                axis: Axis::SelfAxis,
                test: NodeTest::Kind(KindTest::Node),
                predicates: vec![],
            },
            tag("."),
        ),
        axis_step,
    ))
    .parse(input)
}

fn axis_step(input: &str) -> IResult<&str, Step> {
    let (input, (axis, test)) = alt((
        map(preceded(char('@'), node_test), |test| (Axis::Attribute, test)),
        map(pair(opt(axis), node_test), |(axis, test)| {
            (axis.unwrap_or(Axis::Child), test)
        }),
    ))
    .parse(input)?;
    let (input, predicates) = many0(predicate).parse(input)?;
    Ok((
        input,
        Step {
            axis,
            test,
            predicates,
        },
    ))
}

fn axis(input: &str) -> IResult<&str, Axis> {
    alt((
        value(Axis::Child, tag("child::")),
        value(Axis::DescendantOrSelf, tag("descendant-or-self::")),
        value(Axis::Descendant, tag("descendant::")),
        value(Axis::Attribute, tag("attribute::")),
        value(Axis::Parent, tag("parent::")),
        value(Axis::AncestorOrSelf, tag("ancestor-or-self::")),
        value(Axis::Ancestor, tag("ancestor::")),
        value(Axis::SelfAxis, tag("self::")),
        value(Axis::FollowingSibling, tag("following-sibling::")),
        value(Axis::PrecedingSibling, tag("preceding-sibling::")),
        value(Axis::Following, tag("following::")),
        value(Axis::Preceding, tag("preceding::")),
    ))
    .parse(input)
}

fn node_test(input: &str) -> IResult<&str, NodeTest> {
    alt((
        value(NodeTest::Wildcard, tag("*")),
        kind_test,
        // html5ever lower-cases element and attribute names
        map(name, |n: &str| NodeTest::Name(n.to_ascii_lowercase())),
    ))
    .parse(input)
}

fn kind_test(input: &str) -> IResult<&str, NodeTest> {
    map(
        terminated(
            alt((tag("text"), tag("node"), tag("comment"))),
            pair(ws(char('(')), char(')')),
        ),
        |kind: &str| match kind {
            "text" => NodeTest::Kind(KindTest::Text),
            "comment" => NodeTest::Kind(KindTest::Comment),
            _ => NodeTest::Kind(KindTest::Node),
        },
    )
    .parse(input)
}

fn predicate(input: &str) -> IResult<&str, Expression> {
    delimited(ws(char('[')), expression, ws(char(']'))).parse(input)
}
