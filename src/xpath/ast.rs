//! Syntax tree of the supported XPath subset.

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(String),
    Number(f64),
    LocationPath(LocationPath),
    /// A primary expression narrowed by predicates, e.g. `(//section)[1]`.
    Filter {
        base: Box<Expression>,
        predicates: Vec<Expression>,
    },
    FunctionCall {
        name: String,
        args: Vec<Expression>,
    },
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
    Negate(Box<Expression>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Or,
    And,
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Union,
}

/// `/a/b`, `.//c[1]`, or `(expr)/d` when `start` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    pub start: Option<Box<Expression>>,
    pub absolute: bool,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expression>,
}

impl Step {
    /// The `//` abbreviation: `descendant-or-self::node()`.
    pub fn descendant_or_self() -> Self {
        Step {
            axis: Axis::DescendantOrSelf,
            test: NodeTest::Kind(KindTest::Node),
            predicates: vec![],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Attribute,
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
    /// Reverse axes number their nodes nearest-first.
    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            Axis::Ancestor | Axis::AncestorOrSelf | Axis::PrecedingSibling | Axis::Preceding
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    Name(String),
    Wildcard,
    Kind(KindTest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindTest {
    Text,
    Node,
    Comment,
}

impl Expression {
    /// Every function call in the expression, as name and argument count.
    pub fn function_names(&self) -> Vec<(&str, usize)> {
        let mut names = Vec::new();
        self.collect_function_names(&mut names);
        names
    }

    fn collect_function_names<'e>(&'e self, names: &mut Vec<(&'e str, usize)>) {
        match self {
            Expression::Literal(_) | Expression::Number(_) => {}
            Expression::LocationPath(path) => {
                if let Some(start) = &path.start {
                    start.collect_function_names(names);
                }
                for step in &path.steps {
                    for predicate in &step.predicates {
                        predicate.collect_function_names(names);
                    }
                }
            }
            Expression::Filter { base, predicates } => {
                base.collect_function_names(names);
                for predicate in predicates {
                    predicate.collect_function_names(names);
                }
            }
            Expression::FunctionCall { name, args } => {
                names.push((name, args.len()));
                for arg in args {
                    arg.collect_function_names(names);
                }
            }
            Expression::BinaryOp { left, right, .. } => {
                left.collect_function_names(names);
                right.collect_function_names(names);
            }
            Expression::Negate(expr) => expr.collect_function_names(names),
        }
    }
}
