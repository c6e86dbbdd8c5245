//! Declarative extraction rules
//!
//! A [`Rule`] pairs a key with an [`Extractor`]; a [`RuleSet`] groups rules
//! and can scope them to a sub-tree (`section`) or repeat them over a node-set
//! (`foreach`). Rule tables are built once and shared read-only between
//! parses; all queries are compiled at construction so a broken table fails
//! before any page is read.

use std::fmt;
use std::sync::Arc;

use crate::error::{RuleError, TransformError};
use crate::value::Value;
use crate::xpath::Query;

/// A pure function applied to an extracted value. An error omits the value.
pub type Transform = Arc<dyn Fn(Value) -> Result<Value, TransformError> + Send + Sync>;

pub fn transform_fn<F>(f: F) -> Transform
where
    F: Fn(Value) -> Result<Value, TransformError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A query whose matches are joined into one string.
#[derive(Clone)]
pub struct Path {
    pub(crate) query: Query,
    pub(crate) sep: String,
    pub(crate) transform: Option<Transform>,
}

impl Path {
    pub fn new(query: &str) -> Result<Self, RuleError> {
        Ok(Path {
            query: Query::new(query)?,
            sep: String::new(),
            transform: None,
        })
    }

    /// Separator placed between matches. Defaults to nothing, so the text
    /// nodes of an element read as one string.
    pub fn sep(mut self, sep: impl Into<String>) -> Self {
        self.sep = sep.into();
        self
    }

    pub fn transform<F>(self, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, TransformError> + Send + Sync + 'static,
    {
        self.with_transform(transform_fn(f))
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn query(&self) -> &Query {
        &self.query
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Path")
            .field("query", &self.query.as_str())
            .field("sep", &self.sep)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

/// Where a rule's output key comes from.
#[derive(Debug, Clone)]
pub enum Key {
    Literal(String),
    /// Read from the page: first match, trimmed and lower-cased, then the
    /// path's own transform.
    Path(Path),
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Key::Literal(key.to_string())
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Key::Literal(key)
    }
}

impl From<Path> for Key {
    fn from(path: Path) -> Self {
        Key::Path(path)
    }
}

#[derive(Debug, Clone)]
pub enum Extractor {
    /// A single string value.
    Path(Path),
    /// A nested mapping, or a sequence of them when the set has `foreach`.
    Rules(RuleSet),
}

impl From<Path> for Extractor {
    fn from(path: Path) -> Self {
        Extractor::Path(path)
    }
}

impl From<RuleSet> for Extractor {
    fn from(rules: RuleSet) -> Self {
        Extractor::Rules(rules)
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub(crate) key: Key,
    pub(crate) extractor: Extractor,
    pub(crate) foreach: Option<Query>,
    pub(crate) keep_empty: bool,
}

impl Rule {
    pub fn new(key: impl Into<Key>, extractor: impl Into<Extractor>) -> Result<Self, RuleError> {
        let key = key.into();
        if let Key::Literal(literal) = &key {
            if literal.trim().is_empty() {
                return Err(RuleError::EmptyKey);
            }
        }
        Ok(Rule {
            key,
            extractor: extractor.into(),
            foreach: None,
            keep_empty: false,
        })
    }

    /// Evaluate the extractor once per node matched by `query`; the rule
    /// then yields a sequence, present even when nothing matched.
    pub fn foreach(mut self, query: &str) -> Result<Self, RuleError> {
        self.foreach = Some(Query::new(query)?);
        Ok(self)
    }

    /// Insert empty strings and mappings instead of skipping them.
    pub fn keep_empty(mut self) -> Self {
        self.keep_empty = true;
        self
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }
}

#[derive(Clone)]
pub struct RuleSet {
    pub(crate) rules: Vec<Rule>,
    pub(crate) section: Option<Query>,
    pub(crate) foreach: Option<Query>,
    pub(crate) transform: Option<Transform>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Result<Self, RuleError> {
        if rules.is_empty() {
            return Err(RuleError::EmptyRuleSet);
        }
        Ok(RuleSet {
            rules,
            section: None,
            foreach: None,
            transform: None,
        })
    }

    /// Evaluate against the first node matched by `query` instead of the
    /// context node.
    pub fn section(mut self, query: &str) -> Result<Self, RuleError> {
        self.section = Some(Query::new(query)?);
        Ok(self)
    }

    /// Evaluate once per matched node, yielding a sequence of mappings.
    pub fn foreach(mut self, query: &str) -> Result<Self, RuleError> {
        self.foreach = Some(Query::new(query)?);
        Ok(self)
    }

    /// Applied to each mapping of a `foreach`, or to the single mapping.
    pub fn transform<F>(self, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, TransformError> + Send + Sync + 'static,
    {
        self.with_transform(transform_fn(f))
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.rules)
            .field("section", &self.section)
            .field("foreach", &self.foreach)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;

    #[test]
    fn test_invalid_query_fails_at_construction() {
        assert!(matches!(
            Path::new("//div["),
            Err(RuleError::Query(QueryError::Parse { .. }))
        ));
        let rule = Rule::new("x", Path::new(".").unwrap()).unwrap();
        assert!(matches!(
            rule.foreach("//li[bogus()]"),
            Err(RuleError::Query(QueryError::UnknownFunction { .. }))
        ));
        assert!(matches!(
            Path::new("substring()"),
            Err(RuleError::Query(QueryError::Arity { .. }))
        ));
    }

    #[test]
    fn test_empty_key_rejected() {
        let path = Path::new("./text()").unwrap();
        assert!(matches!(Rule::new("  ", path), Err(RuleError::EmptyKey)));
    }

    #[test]
    fn test_empty_rule_set_rejected() {
        assert!(matches!(RuleSet::new(vec![]), Err(RuleError::EmptyRuleSet)));
    }

    #[test]
    fn test_builders() {
        let path = Path::new("//a/text()").unwrap().sep(", ");
        assert_eq!(path.sep, ", ");
        assert_eq!(path.query().as_str(), "//a/text()");

        let set = RuleSet::new(vec![Rule::new("a", path).unwrap().keep_empty()])
            .unwrap()
            .section("//div")
            .unwrap()
            .transform(Ok);
        assert!(set.rules()[0].keep_empty);
        assert!(set.section.is_some());
        assert!(set.transform.is_some());
        assert!(matches!(set.rules()[0].key(), Key::Literal(k) if k == "a"));
    }
}
