//! XPath queries over a parsed [`Document`](crate::document::Document)
//!
//! A [`Query`] is compiled once, when a rule table is built, and evaluated
//! any number of times afterwards. Evaluation never fails from the caller's
//! point of view: an expression that goes wrong at runtime selects nothing.

pub mod ast;
pub mod engine;
pub mod functions;
pub mod parser;

use std::fmt;

use tracing::debug;

use crate::document::Node;
use crate::error::{EvalError, QueryError};
use ast::Expression;
use engine::{Context, XPathValue};

/// A compiled query.
#[derive(Clone)]
pub struct Query {
    source: String,
    expr: Expression,
}

impl Query {
    /// Compile `source`. Unknown functions and wrong argument counts are
    /// rejected here rather than on first use.
    pub fn new(source: &str) -> Result<Self, QueryError> {
        let expr = parser::parse_expression(source)?;
        for (function, got) in expr.function_names() {
            if !functions::is_known(function) {
                return Err(QueryError::UnknownFunction {
                    query: source.to_string(),
                    function: function.to_string(),
                });
            }
            if let Err(expected) = functions::check_arity(function, got) {
                return Err(QueryError::Arity {
                    query: source.to_string(),
                    function: function.to_string(),
                    expected,
                    got,
                });
            }
        }
        Ok(Query {
            source: source.to_string(),
            expr,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn evaluate<'a>(&self, node: Node<'a>) -> Result<XPathValue<'a>, EvalError> {
        engine::evaluate(&self.expr, &Context::new(node))
    }

    /// Matching nodes in document order. Scalar results and evaluation
    /// errors select nothing.
    pub fn select<'a>(&self, node: Node<'a>) -> Vec<Node<'a>> {
        match self.evaluate(node) {
            Ok(XPathValue::NodeSet(nodes)) => nodes,
            Ok(other) => {
                debug!(query = %self.source, found = other.type_name(), "query selects no nodes");
                vec![]
            }
            Err(e) => {
                debug!(query = %self.source, error = %e, "query failed, treating as no match");
                vec![]
            }
        }
    }

    /// The string-value of every matching node, or the single computed value
    /// of a scalar expression.
    pub fn strings(&self, node: Node<'_>) -> Vec<String> {
        match self.evaluate(node) {
            Ok(XPathValue::NodeSet(nodes)) => nodes.iter().map(|n| n.string_value()).collect(),
            Ok(scalar) => vec![scalar.string()],
            Err(e) => {
                debug!(query = %self.source, error = %e, "query failed, treating as no match");
                vec![]
            }
        }
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Query").field(&self.source).finish()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
