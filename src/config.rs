//! Parsers described as JSON
//!
//! ```json
//! {
//!   "name": "otherworks_parser",
//!   "get_refs": true,
//!   "rules": [
//!     {
//!       "key": "other works",
//!       "rules": {
//!         "foreach": "//li[@data-testid=\"list-item\"]",
//!         "rules": [{ "key": "work", "path": ".//text()", "transform": "strip" }]
//!       }
//!     }
//!   ]
//! }
//! ```
//!
//! Transforms are referred to by name and resolved through a
//! [`TransformRegistry`] when the parser is built.

use std::collections::HashMap;

use serde::Deserialize;

use crate::document::Substitution;
use crate::error::RuleError;
use crate::parser::PageParser;
use crate::rules::{Extractor, Key, Path, Rule, RuleSet, Transform};
use crate::transforms;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParserConfig {
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub contains_objects: bool,
    #[serde(default)]
    pub get_refs: bool,
    #[serde(default)]
    pub preprocessors: Vec<SubstitutionConfig>,
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubstitutionConfig {
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
    /// Treat `pattern` as a regular expression.
    #[serde(default)]
    pub regex: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum KeyConfig {
    Literal(String),
    Path(PathConfig),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathConfig {
    pub path: String,
    #[serde(default)]
    pub sep: Option<String>,
    #[serde(default)]
    pub transform: Option<String>,
}

/// A rule. Exactly one of `path` and `rules` must be given; `sep` and
/// `transform` belong to the path.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    pub key: KeyConfig,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub sep: Option<String>,
    #[serde(default)]
    pub transform: Option<String>,
    #[serde(default)]
    pub rules: Option<RuleSetConfig>,
    #[serde(default)]
    pub foreach: Option<String>,
    #[serde(default)]
    pub keep_empty: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSetConfig {
    pub rules: Vec<RuleConfig>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub foreach: Option<String>,
    #[serde(default)]
    pub transform: Option<String>,
}

/// Named transforms available to configuration files.
#[derive(Clone)]
pub struct TransformRegistry {
    transforms: HashMap<String, Transform>,
}

impl TransformRegistry {
    pub fn empty() -> Self {
        TransformRegistry {
            transforms: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, transform: Transform) {
        self.transforms.insert(name.into(), transform);
    }

    pub fn get(&self, name: &str) -> Result<Transform, RuleError> {
        self.transforms
            .get(name)
            .cloned()
            .ok_or_else(|| RuleError::UnknownTransform(name.to_string()))
    }

    fn resolve(&self, name: Option<&str>) -> Result<Option<Transform>, RuleError> {
        name.map(|name| self.get(name)).transpose()
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        let mut registry = TransformRegistry::empty();
        registry.register("strip", transforms::strip());
        registry.register("lower", transforms::lower());
        registry.register("normalize_space", transforms::normalize_space());
        registry.register("split_lines", transforms::split_lines());
        registry.register("int", transforms::int());
        registry.register("analyze_imdbid", transforms::imdbid());
        registry.register("analyze_name", transforms::name());
        registry.register("build_movie", transforms::movie());
        registry.register("build_person", transforms::person());
        registry
    }
}

impl ParserConfig {
    pub fn from_json(json: &str) -> Result<Self, RuleError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn build(&self, registry: &TransformRegistry) -> Result<PageParser, RuleError> {
        let rules = build_rules(&self.rules, registry)?;
        let mut parser = PageParser::new(self.name.clone(), RuleSet::new(rules)?)
            .contains_objects(self.contains_objects)
            .get_refs(self.get_refs);
        if let Some(kind) = &self.kind {
            parser = parser.kind(kind.clone());
        }
        for sub in &self.preprocessors {
            let substitution = if sub.regex {
                Substitution::regex(&sub.pattern, sub.replacement.clone())?
            } else {
                Substitution::literal(sub.pattern.clone(), sub.replacement.clone())
            };
            parser = parser.preprocessor(substitution);
        }
        Ok(parser)
    }
}

fn build_path(
    query: &str,
    sep: Option<&str>,
    transform: Option<&str>,
    registry: &TransformRegistry,
) -> Result<Path, RuleError> {
    let mut path = Path::new(query)?;
    if let Some(sep) = sep {
        path = path.sep(sep);
    }
    if let Some(transform) = registry.resolve(transform)? {
        path = path.with_transform(transform);
    }
    Ok(path)
}

fn build_rules(configs: &[RuleConfig], registry: &TransformRegistry) -> Result<Vec<Rule>, RuleError> {
    configs.iter().map(|config| build_rule(config, registry)).collect()
}

fn build_rule(config: &RuleConfig, registry: &TransformRegistry) -> Result<Rule, RuleError> {
    let key = match &config.key {
        KeyConfig::Literal(key) => Key::from(key.as_str()),
        KeyConfig::Path(path) => Key::Path(build_path(
            &path.path,
            path.sep.as_deref(),
            path.transform.as_deref(),
            registry,
        )?),
    };
    let name = match &config.key {
        KeyConfig::Literal(key) => key.clone(),
        KeyConfig::Path(path) => path.path.clone(),
    };

    let extractor = match (&config.path, &config.rules) {
        (Some(query), None) => Extractor::Path(build_path(
            query,
            config.sep.as_deref(),
            config.transform.as_deref(),
            registry,
        )?),
        (None, Some(set)) => Extractor::Rules(build_rule_set(set, registry)?),
        (None, None) => return Err(RuleError::MissingExtractor(name)),
        (Some(_), Some(_)) => return Err(RuleError::AmbiguousExtractor(name)),
    };

    let mut rule = Rule::new(key, extractor)?;
    if let Some(foreach) = &config.foreach {
        rule = rule.foreach(foreach)?;
    }
    if config.keep_empty {
        rule = rule.keep_empty();
    }
    Ok(rule)
}

fn build_rule_set(config: &RuleSetConfig, registry: &TransformRegistry) -> Result<RuleSet, RuleError> {
    let mut set = RuleSet::new(build_rules(&config.rules, registry)?)?;
    if let Some(section) = &config.section {
        set = set.section(section)?;
    }
    if let Some(foreach) = &config.foreach {
        set = set.foreach(foreach)?;
    }
    if let Some(transform) = registry.resolve(config.transform.as_deref())? {
        set = set.with_transform(transform);
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    const CONFIG: &str = r#"{
        "name": "nick_names",
        "get_refs": false,
        "preprocessors": [{"pattern": "<br/>", "replacement": "<br>"}],
        "rules": [
            {"key": "title", "path": "//h1//text()", "transform": "strip"},
            {
                "key": "nick names",
                "rules": {
                    "foreach": "//li[@class='nick']",
                    "rules": [{"key": "nick", "path": ".//text()", "transform": "strip"}]
                }
            },
            {"key": {"path": "//h2/text()", "transform": "lower"}, "path": "count(//li)", "transform": "int"}
        ]
    }"#;

    const HTML: &str = r#"
        <h1> Bio </h1><h2>Nicks</h2>
        <ul><li class="nick"> Mad Mel </li><li class="nick">Mel</li></ul>
    "#;

    #[test]
    fn test_build_and_parse() {
        let parser = ParserConfig::from_json(CONFIG)
            .unwrap()
            .build(&TransformRegistry::default())
            .unwrap();
        assert_eq!(parser.name(), "nick_names");

        let data = parser.parse(HTML);
        assert_eq!(data["title"], Value::from("Bio"));
        assert_eq!(data["nicks"], Value::Int(2));
        let nicks = data["nick names"].as_list().unwrap();
        assert_eq!(nicks.len(), 2);
        assert_eq!(nicks[0].as_map().unwrap()["nick"], Value::from("Mad Mel"));
    }

    #[test]
    fn test_unknown_transform() {
        let json = r#"{"name": "x", "rules": [{"key": "a", "path": "//a", "transform": "shout"}]}"#;
        let err = ParserConfig::from_json(json)
            .unwrap()
            .build(&TransformRegistry::default())
            .unwrap_err();
        assert!(matches!(err, RuleError::UnknownTransform(name) if name == "shout"));
    }

    #[test]
    fn test_rule_without_extractor() {
        let json = r#"{"name": "x", "rules": [{"key": "a", "foreach": "//a"}]}"#;
        let err = ParserConfig::from_json(json)
            .unwrap()
            .build(&TransformRegistry::default())
            .unwrap_err();
        assert!(matches!(err, RuleError::MissingExtractor(name) if name == "a"));
    }

    #[test]
    fn test_rule_with_both_extractors() {
        let json = r#"{"name": "x", "rules": [
            {"key": "a", "path": "//a", "rules": {"rules": [{"key": "b", "path": "."}]}}
        ]}"#;
        let err = ParserConfig::from_json(json)
            .unwrap()
            .build(&TransformRegistry::default())
            .unwrap_err();
        assert!(matches!(err, RuleError::AmbiguousExtractor(_)));
    }

    #[test]
    fn test_malformed_json_and_regex() {
        assert!(matches!(
            ParserConfig::from_json("{\"name\": 1}"),
            Err(RuleError::Config(_))
        ));

        let json = r#"{"name": "x", "preprocessors": [{"pattern": "(", "regex": true}],
                       "rules": [{"key": "a", "path": "//a"}]}"#;
        let err = ParserConfig::from_json(json)
            .unwrap()
            .build(&TransformRegistry::default())
            .unwrap_err();
        assert!(matches!(err, RuleError::Pattern { .. }));
    }

    #[test]
    fn test_invalid_query_in_config() {
        let json = r#"{"name": "x", "rules": [{"key": "a", "path": "//a["}]}"#;
        let err = ParserConfig::from_json(json)
            .unwrap()
            .build(&TransformRegistry::default())
            .unwrap_err();
        assert!(matches!(err, RuleError::Query(_)));
    }
}
