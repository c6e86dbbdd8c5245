//! Evaluates a parsed expression against a [`Node`].

use super::ast::*;
use super::functions;
use crate::document::{Node, NodeKind};
use crate::error::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub enum XPathValue<'a> {
    NodeSet(Vec<Node<'a>>),
    String(String),
    Number(f64),
    Boolean(bool),
}

impl<'a> XPathValue<'a> {
    pub fn boolean(&self) -> bool {
        match self {
            XPathValue::NodeSet(nodes) => !nodes.is_empty(),
            XPathValue::String(s) => !s.is_empty(),
            XPathValue::Number(n) => *n != 0.0 && !n.is_nan(),
            XPathValue::Boolean(b) => *b,
        }
    }

    pub fn number(&self) -> f64 {
        match self {
            XPathValue::Number(n) => *n,
            XPathValue::Boolean(b) => f64::from(u8::from(*b)),
            other => parse_number(&other.string()),
        }
    }

    pub fn string(&self) -> String {
        match self {
            XPathValue::NodeSet(nodes) => nodes
                .first()
                .map(|node| node.string_value())
                .unwrap_or_default(),
            XPathValue::String(s) => s.clone(),
            XPathValue::Number(n) => format_number(*n),
            XPathValue::Boolean(b) => b.to_string(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            XPathValue::NodeSet(_) => "node-set",
            XPathValue::String(_) => "string",
            XPathValue::Number(_) => "number",
            XPathValue::Boolean(_) => "boolean",
        }
    }

    pub fn into_nodes(self) -> Result<Vec<Node<'a>>, EvalError> {
        match self {
            XPathValue::NodeSet(nodes) => Ok(nodes),
            other => Err(EvalError::Type(format!(
                "expected a node-set, found a {}",
                other.type_name()
            ))),
        }
    }
}

/// XPath `number()` on a string: optional sign, digits, optional fraction.
pub fn parse_number(s: &str) -> f64 {
    let s = s.trim();
    let digits = s.strip_prefix('-').unwrap_or(s);
    let valid = !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.chars().filter(|&c| c == '.').count() <= 1
        && digits != ".";
    if valid {
        s.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// The dynamic context of one evaluation step.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub node: Node<'a>,
    pub position: usize,
    pub size: usize,
}

impl<'a> Context<'a> {
    pub fn new(node: Node<'a>) -> Self {
        Context {
            node,
            position: 1,
            size: 1,
        }
    }
}

pub fn evaluate<'a>(expr: &Expression, ctx: &Context<'a>) -> Result<XPathValue<'a>, EvalError> {
    match expr {
        Expression::Literal(s) => Ok(XPathValue::String(s.clone())),
        Expression::Number(n) => Ok(XPathValue::Number(*n)),
        Expression::LocationPath(path) => evaluate_path(path, ctx).map(XPathValue::NodeSet),
        Expression::Filter { base, predicates } => {
            let mut nodes = evaluate(base, ctx)?.into_nodes()?;
            normalize(&mut nodes);
            for predicate in predicates {
                nodes = filter(predicate, nodes)?;
            }
            Ok(XPathValue::NodeSet(nodes))
        }
        Expression::FunctionCall { name, args } => {
            let args = args
                .iter()
                .map(|arg| evaluate(arg, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            functions::call(name, args, ctx)
        }
        Expression::Negate(inner) => Ok(XPathValue::Number(-evaluate(inner, ctx)?.number())),
        Expression::BinaryOp { left, op, right } => evaluate_binary(left, *op, right, ctx),
    }
}

fn evaluate_binary<'a>(
    left: &Expression,
    op: BinaryOperator,
    right: &Expression,
    ctx: &Context<'a>,
) -> Result<XPathValue<'a>, EvalError> {
    use BinaryOperator::*;

    match op {
        Or => Ok(XPathValue::Boolean(
            evaluate(left, ctx)?.boolean() || evaluate(right, ctx)?.boolean(),
        )),
        And => Ok(XPathValue::Boolean(
            evaluate(left, ctx)?.boolean() && evaluate(right, ctx)?.boolean(),
        )),
        Union => {
            let mut nodes = evaluate(left, ctx)?.into_nodes()?;
            nodes.extend(evaluate(right, ctx)?.into_nodes()?);
            normalize(&mut nodes);
            Ok(XPathValue::NodeSet(nodes))
        }
        Equals | NotEquals | LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
            let l = evaluate(left, ctx)?;
            let r = evaluate(right, ctx)?;
            Ok(XPathValue::Boolean(compare(op, l, r)))
        }
        Plus | Minus | Multiply | Divide | Modulo => {
            let l = evaluate(left, ctx)?.number();
            let r = evaluate(right, ctx)?.number();
            Ok(XPathValue::Number(match op {
                Plus => l + r,
                Minus => l - r,
                Multiply => l * r,
                Divide => l / r,
                _ => l % r,
            }))
        }
    }
}

/// Comparison with node-set semantics: true if any pair of members compares
/// true.
fn compare(op: BinaryOperator, left: XPathValue<'_>, right: XPathValue<'_>) -> bool {
    let against_boolean = matches!(
        (&left, &right),
        (XPathValue::NodeSet(_), XPathValue::Boolean(_))
            | (XPathValue::Boolean(_), XPathValue::NodeSet(_))
    );
    if against_boolean {
        return compare_scalars(
            op,
            &XPathValue::Boolean(left.boolean()),
            &XPathValue::Boolean(right.boolean()),
        );
    }
    let left = atoms(left);
    let right = atoms(right);
    left.iter()
        .any(|l| right.iter().any(|r| compare_scalars(op, l, r)))
}

fn atoms(value: XPathValue<'_>) -> Vec<XPathValue<'static>> {
    match value {
        XPathValue::NodeSet(nodes) => nodes
            .iter()
            .map(|node| XPathValue::String(node.string_value()))
            .collect(),
        XPathValue::String(s) => vec![XPathValue::String(s)],
        XPathValue::Number(n) => vec![XPathValue::Number(n)],
        XPathValue::Boolean(b) => vec![XPathValue::Boolean(b)],
    }
}

fn compare_scalars(op: BinaryOperator, l: &XPathValue<'_>, r: &XPathValue<'_>) -> bool {
    use BinaryOperator::*;

    let is = |v: &XPathValue<'_>, kind: &str| v.type_name() == kind;
    match op {
        Equals | NotEquals => {
            let equal = if is(l, "boolean") || is(r, "boolean") {
                l.boolean() == r.boolean()
            } else if is(l, "number") || is(r, "number") {
                l.number() == r.number()
            } else {
                l.string() == r.string()
            };
            equal == (op == Equals)
        }
        LessThan => l.number() < r.number(),
        LessThanOrEqual => l.number() <= r.number(),
        GreaterThan => l.number() > r.number(),
        GreaterThanOrEqual => l.number() >= r.number(),
        _ => false,
    }
}

fn evaluate_path<'a>(path: &LocationPath, ctx: &Context<'a>) -> Result<Vec<Node<'a>>, EvalError> {
    let mut nodes = match (&path.start, path.absolute) {
        (Some(start), _) => evaluate(start, ctx)?.into_nodes()?,
        (None, true) => vec![ctx.node.root()],
        (None, false) => vec![ctx.node],
    };

    for step in &path.steps {
        let mut next = Vec::new();
        for node in &nodes {
            next.extend(apply_step(step, *node)?);
        }
        normalize(&mut next);
        nodes = next;
    }
    normalize(&mut nodes);
    Ok(nodes)
}

/// Select along one axis from a single context node. Predicates see
/// positions in axis order, so `preceding-sibling::h3[1]` is the nearest one.
fn apply_step<'a>(step: &Step, node: Node<'a>) -> Result<Vec<Node<'a>>, EvalError> {
    let mut selected: Vec<Node<'a>> = axis_nodes(node, step.axis)
        .into_iter()
        .filter(|candidate| matches_test(candidate, &step.test, step.axis))
        .collect();
    for predicate in &step.predicates {
        selected = filter(predicate, selected)?;
    }
    Ok(selected)
}

fn axis_nodes(node: Node<'_>, axis: Axis) -> Vec<Node<'_>> {
    match axis {
        Axis::Child => node.children(),
        Axis::Descendant => node.descendants(),
        Axis::DescendantOrSelf => {
            let mut out = vec![node];
            out.extend(node.descendants());
            out
        }
        Axis::Attribute => node.attributes(),
        Axis::Parent => node.parent().into_iter().collect(),
        Axis::Ancestor => node.ancestors(),
        Axis::AncestorOrSelf => {
            let mut out = vec![node];
            out.extend(node.ancestors());
            out
        }
        Axis::SelfAxis => vec![node],
        Axis::FollowingSibling => node.following_siblings(),
        Axis::PrecedingSibling => node.preceding_siblings(),
        Axis::Following => node.following(),
        Axis::Preceding => node.preceding(),
    }
}

fn matches_test(node: &Node<'_>, test: &NodeTest, axis: Axis) -> bool {
    let principal = if axis == Axis::Attribute {
        NodeKind::Attribute
    } else {
        NodeKind::Element
    };
    match test {
        NodeTest::Wildcard => node.kind() == principal,
        NodeTest::Name(name) => node.kind() == principal && node.name() == name,
        NodeTest::Kind(KindTest::Node) => true,
        NodeTest::Kind(KindTest::Text) => node.kind() == NodeKind::Text,
        NodeTest::Kind(KindTest::Comment) => node.kind() == NodeKind::Comment,
    }
}

/// Keep the nodes for which the predicate holds. A number predicate is a
/// position test.
fn filter<'a>(predicate: &Expression, nodes: Vec<Node<'a>>) -> Result<Vec<Node<'a>>, EvalError> {
    let size = nodes.len();
    let mut kept = Vec::new();
    for (index, node) in nodes.into_iter().enumerate() {
        let ctx = Context {
            node,
            position: index + 1,
            size,
        };
        let keep = match evaluate(predicate, &ctx)? {
            XPathValue::Number(n) => n == (index + 1) as f64,
            other => other.boolean(),
        };
        if keep {
            kept.push(node);
        }
    }
    Ok(kept)
}

fn normalize(nodes: &mut Vec<Node<'_>>) {
    nodes.sort();
    nodes.dedup();
}
