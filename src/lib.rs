//! Rule-driven extraction of structured data from IMDb person pages
//!
//! Pages are parsed into a tolerant DOM and read through declarative rule
//! tables:
//! - XPath 1.0 queries over the parsed tree (`xpath`)
//! - rules, rule sets and the evaluator that applies them
//! - one parser per person page, found by name in a `ParserRegistry`
//! - rule tables loaded from JSON (`config`)

pub mod config;
pub mod document;
pub mod error;
pub mod evaluator;
pub mod imdb;
pub mod pages;
pub mod parser;
pub mod rules;
pub mod transforms;
pub mod value;
pub mod xpath;

pub use config::{ParserConfig, TransformRegistry};
pub use document::{Document, Node, Substitution};
pub use error::{EvalError, QueryError, RuleError, TransformError};
pub use pages::ParserRegistry;
pub use parser::PageParser;
pub use rules::{Extractor, Key, Path, Rule, RuleSet, Transform};
pub use value::{Map, MovieRef, PersonRef, Value};
pub use xpath::Query;
