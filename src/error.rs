//! Error types
//!
//! Only configuration errors ever reach a caller. Everything that can go
//! wrong while reading a page is absorbed by the evaluator.

use thiserror::Error;

/// A query could not be compiled.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("query parse error in '{query}': {message}")]
    Parse { query: String, message: String },

    #[error("unknown function '{function}' in '{query}'")]
    UnknownFunction { query: String, function: String },

    #[error("function '{function}' in '{query}' takes {expected} arguments, got {got}")]
    Arity {
        query: String,
        function: String,
        expected: String,
        got: usize,
    },
}

/// Raised while a query is evaluated. Never leaves the crate: the evaluator
/// treats it as "no match".
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("function '{function}': {message}")]
    Function { function: String, message: String },

    #[error("type error: {0}")]
    Type(String),
}

/// A rule table is malformed.
#[derive(Error, Debug)]
pub enum RuleError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("rule key must not be empty")]
    EmptyKey,

    #[error("rule set has no rules")]
    EmptyRuleSet,

    #[error("rule '{0}' has neither a path nor nested rules")]
    MissingExtractor(String),

    #[error("rule '{0}' declares both a path and nested rules")]
    AmbiguousExtractor(String),

    #[error("unknown transform '{0}'")]
    UnknownTransform(String),

    #[error("invalid preprocessing pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid parser configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// A transform could not produce a value. The field is omitted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("no value")]
    NoValue,

    #[error("expected {expected}, found {found}")]
    UnexpectedShape {
        expected: &'static str,
        found: &'static str,
    },

    #[error("{0}")]
    Invalid(String),
}
