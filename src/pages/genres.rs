//! The person "by genre" and "by keyword" pages. Both share one table; the
//! headings found on the page become the keys of the result.

use crate::error::RuleError;
use crate::imdb::{analyze_imdbid, build_movie};
use crate::parser::PageParser;
use crate::rules::{Key, Path, Rule, RuleSet};
use crate::transforms::take;
use crate::value::{Map, Value};

use super::text;

pub(super) fn parser(name: &str, kind: &str) -> Result<PageParser, RuleError> {
    let movies = RuleSet::new(vec![
        text("link", "./@href")?,
        text("title", "./text()")?,
        text("info", "./following-sibling::text()")?,
    ])?
    .foreach("../../following-sibling::ol[1]/li//a[1]")?
    .transform(|value| {
        let mut item = value.into_map()?;
        let info = take(&mut item, "info");
        let title = format!(
            "{}{}",
            take(&mut item, "title"),
            info.split('[').next().unwrap_or("")
        );
        let movie_id = analyze_imdbid(&take(&mut item, "link"));
        Ok(Value::Movie(build_movie(&title, movie_id, Map::new())))
    });

    let sections = RuleSet::new(vec![Rule::new(Key::Path(Path::new("./text()")?), movies)?])?
        .foreach("//b/a[@name]/following-sibling::a[1]")?;

    let rules = RuleSet::new(vec![Rule::new("sections", sections)?])?;

    let wrap_as = kind.to_string();
    Ok(PageParser::new(name, rules)
        .kind(kind)
        .contains_objects(true)
        .postprocess(move |data| wrap(data, &wrap_as)))
}

/// `{kind: {heading: [movies]}}`, or nothing when the page had no headings.
fn wrap(mut data: Map, kind: &str) -> Map {
    let mut merged = Map::new();
    if let Some(Value::List(sections)) = data.shift_remove("sections") {
        for section in sections {
            if let Value::Map(section) = section {
                merged.extend(section);
            }
        }
    }
    if merged.is_empty() {
        return Map::new();
    }
    data.insert(kind.to_string(), Value::Map(merged));
    data
}
