//! Rule-set evaluation
//!
//! Walks a [`RuleSet`] over a document node and assembles the extracted
//! values. Evaluation is total: failed queries select nothing and failed
//! transforms omit their value, so a page whose layout drifted produces a
//! smaller result instead of an error.

use tracing::{debug, trace, warn};

use crate::document::Node;
use crate::rules::{Extractor, Key, Path, Rule, RuleSet, Transform};
use crate::value::{Map, Value};

/// Evaluate a rule set at `node`.
///
/// Returns a mapping, or a sequence of mappings when the set has `foreach`.
/// `None` means a transform rejected the assembled mapping.
pub fn evaluate(set: &RuleSet, node: Node<'_>) -> Option<Value> {
    let scope = match &set.section {
        Some(section) => {
            let matches = section.select(node);
            if matches.len() > 1 {
                warn!(
                    section = %section,
                    matches = matches.len(),
                    "section matches more than one node, using the first"
                );
            }
            match matches.first() {
                Some(first) => *first,
                None => {
                    trace!(section = %section, "section not found");
                    return Some(match set.foreach {
                        Some(_) => Value::List(vec![]),
                        None => Value::Map(Map::new()),
                    });
                }
            }
        }
        None => node,
    };

    match &set.foreach {
        Some(foreach) => {
            let items = foreach
                .select(scope)
                .into_iter()
                .filter_map(|item| {
                    let data = Value::Map(evaluate_rules(&set.rules, item));
                    apply(set.transform.as_ref(), data, foreach.as_str())
                })
                .collect();
            Some(Value::List(items))
        }
        None => {
            let data = Value::Map(evaluate_rules(&set.rules, scope));
            apply(set.transform.as_ref(), data, "rule set")
        }
    }
}

/// Evaluate rules in declared order into one mapping. Later rules overwrite
/// earlier ones with the same key; the key keeps its first position.
pub fn evaluate_rules(rules: &[Rule], node: Node<'_>) -> Map {
    let mut data = Map::new();
    for rule in rules {
        let key = match resolve_key(&rule.key, node) {
            Some(key) => key,
            None => {
                trace!("rule key resolved to nothing, skipping");
                continue;
            }
        };

        match &rule.foreach {
            Some(foreach) => {
                let items = foreach
                    .select(node)
                    .into_iter()
                    .filter_map(|item| extract(&rule.extractor, item))
                    .filter(|value| rule.keep_empty || value.as_str() != Some(""))
                    .collect();
                data.insert(key, Value::List(items));
            }
            None => match extract(&rule.extractor, node) {
                Some(value) if rule.keep_empty || !value.is_blank() => {
                    data.insert(key, value);
                }
                _ => trace!(key = %key, "no value extracted"),
            },
        }
    }
    data
}

fn resolve_key(key: &Key, node: Node<'_>) -> Option<String> {
    match key {
        Key::Literal(key) => Some(key.clone()),
        Key::Path(path) => {
            let first = path.query.strings(node).into_iter().next()?;
            let key = first.trim().to_lowercase();
            let key = match apply(path.transform.as_ref(), Value::Str(key), path.query.as_str())? {
                Value::Str(key) => key,
                other => {
                    debug!(query = %path.query, found = other.kind_name(), "key is not a string");
                    return None;
                }
            };
            trace!(query = %path.query, key = %key, "resolved key");
            if key.is_empty() { None } else { Some(key) }
        }
    }
}

fn extract(extractor: &Extractor, node: Node<'_>) -> Option<Value> {
    match extractor {
        Extractor::Path(path) => extract_path(path, node),
        Extractor::Rules(set) => evaluate(set, node),
    }
}

fn extract_path(path: &Path, node: Node<'_>) -> Option<Value> {
    let matches = path.query.strings(node);
    if matches.is_empty() {
        return None;
    }
    let joined = matches.join(&path.sep);
    apply(path.transform.as_ref(), Value::Str(joined), path.query.as_str())
}

fn apply(transform: Option<&Transform>, value: Value, origin: &str) -> Option<Value> {
    let Some(transform) = transform else {
        return Some(value);
    };
    match transform(value) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(origin, error = %e, "transform failed, value omitted");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::error::TransformError;
    use crate::transforms;

    const HTML: &str = r#"
        <html><body>
            <div class="bio"><h4>Born:</h4><time datetime="1960-05-17">May 17</time></div>
            <div class="bio"><h4>Other:</h4><time datetime="1999-01-01">Jan 1</time></div>
            <h2>Actor</h2>
            <ul>
                <li><a href="/title/tt0000001/">One</a></li>
                <li><a href="/title/tt0000002/">Two</a></li>
                <li></li>
            </ul>
        </body></html>
    "#;

    fn path(query: &str) -> Path {
        Path::new(query).unwrap()
    }

    fn rule(key: &str, query: &str) -> Rule {
        Rule::new(key, path(query)).unwrap()
    }

    #[test]
    fn test_path_joins_matches() {
        let doc = Document::parse(HTML);
        let rules = vec![
            rule("titles", "//li/a/text()"),
            Rule::new("listed", path("//li/a/text()").sep(", ")).unwrap(),
        ];
        let data = evaluate_rules(&rules, doc.root());
        assert_eq!(data["titles"], Value::from("OneTwo"));
        assert_eq!(data["listed"], Value::from("One, Two"));
    }

    #[test]
    fn test_missing_values_are_omitted() {
        let doc = Document::parse(HTML);
        let rules = vec![
            rule("missing", "//table/text()"),
            rule("blank", "string(//table)"),
            Rule::new("kept", path("string(//table)")).unwrap().keep_empty(),
        ];
        let data = evaluate_rules(&rules, doc.root());
        assert!(!data.contains_key("missing"));
        assert!(!data.contains_key("blank"));
        assert_eq!(data["kept"], Value::from(""));
    }

    #[test]
    fn test_last_write_wins_keeps_first_position() {
        let doc = Document::parse(HTML);
        let rules = vec![
            rule("name", "//h2/text()"),
            rule("other", "//h4/text()"),
            rule("name", "//li[2]/a/text()"),
            rule("name", "//table/text()"),
        ];
        let data = evaluate_rules(&rules, doc.root());
        assert_eq!(data["name"], Value::from("Two"));
        assert_eq!(data.keys().collect::<Vec<_>>(), vec!["name", "other"]);
    }

    #[test]
    fn test_section_uses_first_match_only() {
        let doc = Document::parse(HTML);
        let set = RuleSet::new(vec![rule("date", ".//time/@datetime")])
            .unwrap()
            .section("//div[@class='bio']")
            .unwrap();
        let value = evaluate(&set, doc.root()).unwrap();
        assert_eq!(value.as_map().unwrap()["date"], Value::from("1960-05-17"));
    }

    #[test]
    fn test_section_not_found() {
        let doc = Document::parse(HTML);
        let set = RuleSet::new(vec![rule("date", ".//time/@datetime")])
            .unwrap()
            .section("//div[h4='Died:']")
            .unwrap();
        assert_eq!(evaluate(&set, doc.root()), Some(Value::Map(Map::new())));

        let rules = vec![Rule::new("death", set).unwrap()];
        assert!(evaluate_rules(&rules, doc.root()).is_empty());
    }

    #[test]
    fn test_foreach_yields_one_item_per_node() {
        let doc = Document::parse(HTML);
        let set = RuleSet::new(vec![rule("title", "./a/text()")])
            .unwrap()
            .foreach("//li")
            .unwrap();
        let items = evaluate(&set, doc.root()).unwrap();
        let items = items.as_list().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[2], Value::Map(Map::new()));

        let none = RuleSet::new(vec![rule("title", "./a/text()")])
            .unwrap()
            .foreach("//table")
            .unwrap();
        let rules = vec![Rule::new("films", none).unwrap()];
        assert_eq!(
            evaluate_rules(&rules, doc.root())["films"],
            Value::List(vec![])
        );
    }

    #[test]
    fn test_foreach_transform_per_item() {
        let doc = Document::parse(HTML);
        let set = RuleSet::new(vec![rule("title", "./a/text()")])
            .unwrap()
            .foreach("//li")
            .unwrap()
            .transform(|item| {
                let map = item.into_map()?;
                match map.get("title") {
                    Some(title) => Ok(title.clone()),
                    None => Err(TransformError::NoValue),
                }
            });
        let items = evaluate(&set, doc.root()).unwrap();
        assert_eq!(items, Value::List(vec!["One".into(), "Two".into()]));
    }

    #[test]
    fn test_key_from_query() {
        let doc = Document::parse(HTML);
        let key = path("//h2/text()").transform(|v| Ok(Value::from(format!("{} roles", v.into_string()?))));
        let rules = vec![Rule::new(key, path("count(//li)")).unwrap()];
        let data = evaluate_rules(&rules, doc.root());
        assert_eq!(data["actor roles"], Value::from("3"));
    }

    #[test]
    fn test_key_from_query_without_match_skips_rule() {
        let doc = Document::parse(HTML);
        let rules = vec![Rule::new(path("//h3/text()"), path("//h2/text()")).unwrap()];
        assert!(evaluate_rules(&rules, doc.root()).is_empty());
    }

    #[test]
    fn test_rule_foreach_collects_values() {
        let doc = Document::parse(HTML);
        let rules = vec![
            Rule::new("links", path("./@href"))
                .unwrap()
                .foreach("//li/a")
                .unwrap(),
            Rule::new("none", path("./@href"))
                .unwrap()
                .foreach("//table")
                .unwrap(),
        ];
        let data = evaluate_rules(&rules, doc.root());
        assert_eq!(
            data["links"],
            Value::List(vec!["/title/tt0000001/".into(), "/title/tt0000002/".into()])
        );
        assert_eq!(data["none"], Value::List(vec![]));
    }

    #[test]
    fn test_failed_transform_omits_field() {
        let doc = Document::parse(HTML);
        let rules = vec![
            Rule::new("year", path("//h2/text()").with_transform(transforms::int())).unwrap(),
            Rule::new("count", path("count(//li)").with_transform(transforms::int())).unwrap(),
        ];
        let data = evaluate_rules(&rules, doc.root());
        assert!(!data.contains_key("year"));
        assert_eq!(data["count"], Value::Int(3));
    }
}
