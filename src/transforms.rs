//! Reusable transforms for rule tables.

use std::sync::Arc;

use crate::error::TransformError;
use crate::imdb::{analyze_imdbid, analyze_name, build_movie, build_person};
use crate::rules::Transform;
use crate::value::{Map, Value};

/// Lift a string function into a transform over string values.
pub fn string_fn<F>(f: F) -> Transform
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    Arc::new(move |value: Value| -> Result<Value, TransformError> {
        Ok(Value::Str(f(&value.into_string()?)))
    })
}

pub fn strip() -> Transform {
    string_fn(|s| s.trim().to_string())
}

pub fn lower() -> Transform {
    string_fn(|s| s.to_lowercase())
}

/// Collapse runs of whitespace and trim.
pub fn normalize_space() -> Transform {
    string_fn(normalize)
}

pub fn normalize(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a string into a sequence of its trimmed, non-empty parts.
pub fn split(sep: &'static str) -> Transform {
    Arc::new(move |value: Value| -> Result<Value, TransformError> {
        let text = value.into_string()?;
        Ok(Value::List(
            text.split(sep)
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(Value::from)
                .collect(),
        ))
    })
}

pub fn split_lines() -> Transform {
    split("\n")
}

/// Parse a trimmed string as an integer.
pub fn int() -> Transform {
    Arc::new(|value: Value| -> Result<Value, TransformError> {
        let text = value.into_string()?;
        text.trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| TransformError::Invalid(format!("not an integer: '{}'", text.trim())))
    })
}

/// Pick one field out of an assembled mapping; a missing field reads as "".
pub fn field(name: &'static str) -> Transform {
    Arc::new(move |value: Value| -> Result<Value, TransformError> {
        let mut map = value.into_map()?;
        Ok(map.shift_remove(name).unwrap_or_else(|| Value::from("")))
    })
}

/// Run `first`, then `second` on its output.
pub fn chain(first: Transform, second: Transform) -> Transform {
    Arc::new(move |value: Value| -> Result<Value, TransformError> {
        second(first(value)?)
    })
}

/// The identifier in an href, or no value.
pub fn imdbid() -> Transform {
    Arc::new(|value: Value| -> Result<Value, TransformError> {
        analyze_imdbid(&value.into_string()?)
            .map(Value::Str)
            .ok_or(TransformError::NoValue)
    })
}

/// A display name split into `name` and `imdbIndex`.
pub fn name() -> Transform {
    Arc::new(|value: Value| -> Result<Value, TransformError> {
        Ok(Value::Map(analyze_name(&value.into_string()?)))
    })
}

/// `{title, link, ...}` into a movie reference; other fields are kept.
pub fn movie() -> Transform {
    Arc::new(|value: Value| -> Result<Value, TransformError> {
        let mut map = value.into_map()?;
        let title = take(&mut map, "title");
        let movie_id = analyze_imdbid(&take(&mut map, "link"));
        Ok(Value::Movie(build_movie(&title, movie_id, map)))
    })
}

/// `{name, link}` into a person reference.
pub fn person() -> Transform {
    Arc::new(|value: Value| -> Result<Value, TransformError> {
        let mut map = value.into_map()?;
        let name = take(&mut map, "name");
        let person_id = analyze_imdbid(&take(&mut map, "link"));
        Ok(Value::Person(build_person(&name, person_id)))
    })
}

/// Remove a string field, `""` when absent.
pub fn take(map: &mut Map, key: &str) -> String {
    map.shift_remove(key)
        .and_then(|value| value.into_string().ok())
        .unwrap_or_default()
}

/// String field of an assembled mapping, `""` when absent or not a string.
pub fn text<'m>(map: &'m Map, key: &str) -> &'m str {
    map.get(key).and_then(Value::as_str).unwrap_or("")
}
