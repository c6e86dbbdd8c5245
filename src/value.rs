//! Extraction results
//!
//! Everything a parser returns is a [`Value`]: plain strings and integers,
//! ordered sequences and mappings, or a movie/person reference built from an
//! extracted identifier. Values serialize to plain JSON.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::TransformError;

/// Ordered mapping. Keys keep the position of their first insertion.
pub type Map = IndexMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    Int(i64),
    List(Vec<Value>),
    Map(Map),
    Movie(MovieRef),
    Person(PersonRef),
}

/// Reference to a title, as built by [`build_movie`](crate::imdb::build_movie).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieRef {
    #[serde(rename = "movieID")]
    pub movie_id: Option<String>,
    pub title: String,
    /// `year`, `kind`, `status`, `rolesNoChar`, ... when known.
    #[serde(flatten)]
    pub data: Map,
}

/// Reference to a person, as built by [`build_person`](crate::imdb::build_person).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonRef {
    #[serde(rename = "personID")]
    pub person_id: Option<String>,
    pub name: String,
    #[serde(flatten)]
    pub data: Map,
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Int(_) => "integer",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Movie(_) => "movie",
            Value::Person(_) => "person",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Empty strings and empty mappings count as "nothing extracted".
    /// Sequences never do: an empty sequence is a result.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Str(s) => s.is_empty(),
            Value::Map(map) => map.is_empty(),
            _ => false,
        }
    }

    pub fn into_string(self) -> Result<String, TransformError> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(TransformError::UnexpectedShape {
                expected: "string",
                found: other.kind_name(),
            }),
        }
    }

    pub fn into_map(self) -> Result<Map, TransformError> {
        match self {
            Value::Map(map) => Ok(map),
            other => Err(TransformError::UnexpectedShape {
                expected: "map",
                found: other.kind_name(),
            }),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Map(map)
    }
}

impl From<MovieRef> for Value {
    fn from(movie: MovieRef) -> Self {
        Value::Movie(movie)
    }
}

impl From<PersonRef> for Value {
    fn from(person: PersonRef) -> Self {
        Value::Person(person)
    }
}
