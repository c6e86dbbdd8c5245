//! Rule tables for the person pages, and the registry that names them.

mod awards;
mod bio;
mod filmography;
mod genres;
mod maindetails;
mod otherworks;

use indexmap::IndexMap;

use crate::error::RuleError;
use crate::parser::PageParser;
use crate::rules::{Path, Rule};
use crate::transforms;
use crate::value::Map;

/// Parsers by dispatch name, e.g. `"bio_parser"`.
#[derive(Debug, Clone)]
pub struct ParserRegistry {
    parsers: IndexMap<String, PageParser>,
}

impl ParserRegistry {
    /// Build every person-page parser. A malformed table is reported here,
    /// before any page is parsed.
    pub fn new() -> Result<Self, RuleError> {
        let mut registry = ParserRegistry {
            parsers: IndexMap::new(),
        };
        registry.register(maindetails::parser()?);
        registry.register(bio::parser()?);
        registry.register(filmography::parser()?);
        registry.register(otherworks::parser()?);
        registry.register(awards::parser()?);
        registry.register(genres::parser("person_genres_parser", "genres")?);
        registry.register(genres::parser("person_keywords_parser", "keywords")?);
        Ok(registry)
    }

    /// Add or replace a parser under its own name.
    pub fn register(&mut self, parser: PageParser) {
        self.parsers.insert(parser.name().to_string(), parser);
    }

    pub fn get(&self, name: &str) -> Option<&PageParser> {
        self.parsers.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parsers.keys().map(String::as_str)
    }

    /// Parse with the named parser; `None` if there is no such parser.
    pub fn parse(&self, name: &str, markup: &str) -> Option<Map> {
        self.get(name).map(|parser| parser.parse(markup))
    }
}

fn text(key: &str, query: &str) -> Result<Rule, RuleError> {
    Rule::new(key, Path::new(query)?)
}

fn stripped(key: &str, query: &str) -> Result<Rule, RuleError> {
    Rule::new(key, Path::new(query)?.with_transform(transforms::strip()))
}
