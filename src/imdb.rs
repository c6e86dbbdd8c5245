//! Identifier and name helpers shared by the page parsers.
//!
//! All of these are total: malformed input gives `None` or a best-effort
//! object, never an error.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::value::{Map, MovieRef, PersonRef, Value};

static IMDB_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(nm|tt|ch|co)([0-9]{7,})\b").expect("valid identifier pattern"));

static NAME_INDEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.*?)\s*\(([IVXLCDM]+)\)\s*$").expect("valid name index pattern")
});

static TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.*?)\s*\((\d{4}|\?{4})(?:/([IVXLCDM]+))?\)\s*(?:\((TV|V|VG)\))?\s*$")
        .expect("valid title pattern")
});

/// A cross reference found in a hyperlink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Title(String),
    Name(String),
}

/// Canonical identifier (the digits) found in an href or id string.
pub fn analyze_imdbid(href: &str) -> Option<String> {
    IMDB_ID
        .captures(href)
        .and_then(|caps| caps.get(2))
        .map(|digits| digits.as_str().to_string())
}

/// Like [`analyze_imdbid`], keeping track of what the identifier points to.
/// Only title and name identifiers are references.
pub fn analyze_reference(href: &str) -> Option<Reference> {
    let caps = IMDB_ID.captures(href)?;
    let id = caps.get(2)?.as_str().to_string();
    match caps.get(1)?.as_str() {
        "tt" => Some(Reference::Title(id)),
        "nm" => Some(Reference::Name(id)),
        _ => None,
    }
}

/// Split a display name into `name` and, when present, the roman-numeral
/// `imdbIndex` that disambiguates homonyms: `"John Smith (II)"`.
pub fn analyze_name(raw: &str) -> Map {
    let raw = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut result = Map::new();
    match NAME_INDEX.captures(&raw) {
        Some(caps) if !caps[1].is_empty() => {
            result.insert("name".into(), Value::from(&caps[1]));
            result.insert("imdbIndex".into(), Value::from(&caps[2]));
        }
        _ => {
            result.insert("name".into(), Value::Str(raw));
        }
    }
    result
}

fn kind_of(marker: Option<&str>) -> &'static str {
    match marker {
        Some("TV") => "tv movie",
        Some("V") => "video movie",
        Some("VG") => "video game",
        _ => "movie",
    }
}

/// Build a movie reference from display text such as `"Title (2001) (TV)"`.
///
/// Year and kind are read from the title when present. Non-blank entries of
/// `extra` are kept; a purely numeric `year` becomes an integer.
pub fn build_movie(title: &str, movie_id: Option<String>, extra: Map) -> MovieRef {
    let title = title.trim();
    let mut data = Map::new();

    let title = match TITLE.captures(title) {
        Some(caps) if !caps[1].is_empty() => {
            if let Ok(year) = caps[2].parse::<i64>() {
                data.insert("year".into(), Value::Int(year));
            }
            if let Some(index) = caps.get(3) {
                data.insert("imdbIndex".into(), Value::from(index.as_str()));
            }
            data.insert(
                "kind".into(),
                Value::from(kind_of(caps.get(4).map(|m| m.as_str()))),
            );
            caps[1].to_string()
        }
        _ => title.to_string(),
    };

    for (key, value) in extra {
        if value.is_blank() {
            continue;
        }
        let value = match (key.as_str(), value) {
            ("year", Value::Str(year)) => match year.trim().parse::<i64>() {
                Ok(year) => Value::Int(year),
                Err(_) => Value::Str(year.trim().to_string()),
            },
            (_, value) => value,
        };
        data.insert(key, value);
    }

    MovieRef {
        movie_id,
        title,
        data,
    }
}

pub fn build_person(name: &str, person_id: Option<String>) -> PersonRef {
    let mut data = analyze_name(name);
    let name = data
        .shift_remove("name")
        .and_then(|name| name.into_string().ok())
        .unwrap_or_default();
    PersonRef {
        person_id,
        name,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_imdbid() {
        assert_eq!(
            analyze_imdbid("https://www.imdb.com/name/nm0000154/"),
            Some("0000154".to_string())
        );
        assert_eq!(
            analyze_imdbid("/title/tt0112573/?ref_=nm_flmg"),
            Some("0112573".to_string())
        );
        assert_eq!(analyze_imdbid("/search/name?birth_place=x"), None);
        assert_eq!(analyze_imdbid("/title/tt12/"), None);
    }

    #[test]
    fn test_analyze_reference() {
        assert_eq!(
            analyze_reference("/name/nm0000154/"),
            Some(Reference::Name("0000154".into()))
        );
        assert_eq!(
            analyze_reference("/title/tt0112573/"),
            Some(Reference::Title("0112573".into()))
        );
        assert_eq!(analyze_reference("/company/co0012345/"), None);
    }

    #[test]
    fn test_analyze_name() {
        let name = analyze_name("  Mel   Gibson ");
        assert_eq!(name.get("name"), Some(&Value::from("Mel Gibson")));
        assert!(name.get("imdbIndex").is_none());

        let name = analyze_name("John Smith (II)");
        assert_eq!(name.get("name"), Some(&Value::from("John Smith")));
        assert_eq!(name.get("imdbIndex"), Some(&Value::from("II")));
    }

    #[test]
    fn test_build_movie_from_title_text() {
        let movie = build_movie("Braveheart (1995) (TV)", Some("0112573".into()), Map::new());
        assert_eq!(movie.title, "Braveheart");
        assert_eq!(movie.data.get("year"), Some(&Value::Int(1995)));
        assert_eq!(movie.data.get("kind"), Some(&Value::from("tv movie")));
    }

    #[test]
    fn test_build_movie_extra_fields() {
        let mut extra = Map::new();
        extra.insert("year".into(), Value::from(" 2001 "));
        extra.insert("status".into(), Value::from(""));
        extra.insert("rolesNoChar".into(), Value::from("Himself"));
        let movie = build_movie("One", None, extra);
        assert_eq!(movie.title, "One");
        assert_eq!(movie.data.get("year"), Some(&Value::Int(2001)));
        assert!(movie.data.get("status").is_none());
        assert_eq!(movie.data.get("rolesNoChar"), Some(&Value::from("Himself")));
    }

    #[test]
    fn test_build_person() {
        let person = build_person("Jane Doe (III)", Some("0000001".into()));
        assert_eq!(person.name, "Jane Doe");
        assert_eq!(person.data.get("imdbIndex"), Some(&Value::from("III")));
    }
}
