//! Page parsers
//!
//! A [`PageParser`] is plain data: preprocessing substitutions, a root
//! [`RuleSet`], two flags and an optional postprocess hook. Parsing runs
//!
//! 1. substitutions on the raw markup
//! 2. tolerant HTML parsing
//! 3. rule evaluation from the document root
//! 4. movie/person object materialization (`contains_objects`)
//! 5. cross-reference collection (`get_refs`)
//! 6. the postprocess hook
//!
//! `parse` never fails and holds no state between calls, so one parser can be
//! shared freely between threads.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::document::{Document, Node, NodeKind, Substitution, preprocess};
use crate::evaluator;
use crate::imdb::{Reference, analyze_reference, build_movie, build_person};
use crate::rules::RuleSet;
use crate::transforms::{normalize, take};
use crate::value::{Map, Value};

/// Final reshaping of a parsed mapping.
pub type Postprocess = Arc<dyn Fn(Map) -> Map + Send + Sync>;

#[derive(Clone)]
pub struct PageParser {
    name: String,
    kind: Option<String>,
    preprocessors: Vec<Substitution>,
    rules: RuleSet,
    contains_objects: bool,
    get_refs: bool,
    postprocess: Option<Postprocess>,
}

impl PageParser {
    pub fn new(name: impl Into<String>, rules: RuleSet) -> Self {
        PageParser {
            name: name.into(),
            kind: None,
            preprocessors: Vec::new(),
            rules,
            contains_objects: false,
            get_refs: false,
            postprocess: None,
        }
    }

    pub fn preprocessor(mut self, substitution: Substitution) -> Self {
        self.preprocessors.push(substitution);
        self
    }

    /// Turn nested mappings carrying a `link` to a title or name into
    /// [`MovieRef`](crate::value::MovieRef)/[`PersonRef`](crate::value::PersonRef)
    /// objects.
    pub fn contains_objects(mut self, enabled: bool) -> Self {
        self.contains_objects = enabled;
        self
    }

    /// Collect the titles and names the page links to under `references`.
    pub fn get_refs(mut self, enabled: bool) -> Self {
        self.get_refs = enabled;
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn postprocess<F>(mut self, f: F) -> Self
    where
        F: Fn(Map) -> Map + Send + Sync + 'static,
    {
        self.postprocess = Some(Arc::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind_name(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Parse one page. Blank or unusable markup gives an empty mapping.
    pub fn parse(&self, markup: &str) -> Map {
        if markup.trim().is_empty() {
            debug!(parser = %self.name, "empty input");
            return Map::new();
        }

        let markup = preprocess(markup, &self.preprocessors);
        let doc = Document::parse(&markup);
        let root = doc.root();

        let mut data = match evaluator::evaluate(&self.rules, root) {
            Some(Value::Map(data)) => data,
            Some(other) => {
                debug!(parser = %self.name, found = other.kind_name(), "root rules did not produce a mapping");
                Map::new()
            }
            None => Map::new(),
        };

        if self.contains_objects {
            data = data
                .into_iter()
                .map(|(key, value)| (key, materialize(value)))
                .collect();
        }

        if self.get_refs {
            if let Some(references) = collect_references(root) {
                data.insert("references".to_string(), Value::Map(references));
            }
        }

        if let Some(postprocess) = &self.postprocess {
            data = postprocess(data);
        }

        debug!(parser = %self.name, keys = data.len(), "page parsed");
        data
    }

    pub fn parse_json(&self, markup: &str) -> serde_json::Value {
        Value::Map(self.parse(markup)).to_json()
    }
}

impl fmt::Debug for PageParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageParser")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("preprocessors", &self.preprocessors.len())
            .field("contains_objects", &self.contains_objects)
            .field("get_refs", &self.get_refs)
            .field("postprocess", &self.postprocess.is_some())
            .finish()
    }
}

fn materialize(value: Value) -> Value {
    match value {
        Value::List(items) => Value::List(items.into_iter().map(materialize).collect()),
        Value::Map(map) => {
            let map: Map = map
                .into_iter()
                .map(|(key, value)| (key, materialize(value)))
                .collect();
            into_object(map)
        }
        other => other,
    }
}

fn into_object(mut map: Map) -> Value {
    let reference = map
        .get("link")
        .and_then(Value::as_str)
        .and_then(analyze_reference);
    let has = |map: &Map, key: &str| map.get(key).and_then(Value::as_str).is_some();

    match reference {
        Some(Reference::Title(id)) if has(&map, "title") => {
            map.shift_remove("link");
            let title = take(&mut map, "title");
            Value::Movie(build_movie(&title, Some(id), map))
        }
        Some(Reference::Name(id)) if has(&map, "name") => {
            map.shift_remove("link");
            let name = take(&mut map, "name");
            let mut person = build_person(&name, Some(id));
            person.data.extend(map.into_iter().filter(|(_, v)| !v.is_blank()));
            Value::Person(person)
        }
        _ => Value::Map(map),
    }
}

/// `{titles: {text: id}, names: {text: id}}` for every link on the page that
/// points to a title or a person; `None` when there are none.
fn collect_references(root: Node<'_>) -> Option<Map> {
    let anchors = root
        .descendants()
        .into_iter()
        .filter(|node| node.kind() == NodeKind::Element && node.name() == "a");

    let mut titles = Map::new();
    let mut names = Map::new();
    for anchor in anchors {
        let Some(reference) = anchor.attr("href").and_then(analyze_reference) else {
            continue;
        };
        let text = normalize(&anchor.string_value());
        if text.is_empty() {
            continue;
        }
        let (target, id) = match reference {
            Reference::Title(id) => (&mut titles, id),
            Reference::Name(id) => (&mut names, id),
        };
        target.entry(text).or_insert(Value::Str(id));
    }

    let mut references = Map::new();
    if !titles.is_empty() {
        references.insert("titles".to_string(), Value::Map(titles));
    }
    if !names.is_empty() {
        references.insert("names".to_string(), Value::Map(names));
    }
    if references.is_empty() { None } else { Some(references) }
}
