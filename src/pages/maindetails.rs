//! The person "maindetails" page.

use crate::document::Substitution;
use crate::error::{RuleError, TransformError};
use crate::parser::PageParser;
use crate::rules::{Path, Rule, RuleSet};
use crate::transforms;
use crate::value::{Map, Value};

use super::text;

pub(super) fn parser() -> Result<PageParser, RuleError> {
    let birth = RuleSet::new(vec![
        text("birth date", r#".//time[@itemprop="birthDate"]/@datetime"#)?,
        text(
            "birth place",
            r#".//a[starts-with(@href, "/search/name?birth_place=")]/text()"#,
        )?,
    ])?
    .section(r#"//div[h4="Born:"]"#)?;

    let death = RuleSet::new(vec![
        text("death date", r#".//time[@itemprop="deathDate"]/@datetime"#)?,
        text(
            "death place",
            r#".//a[starts-with(@href, "/search/name?death_place=")]/text()"#,
        )?,
        Rule::new(
            "death notes",
            Path::new(r#".//div[contains(@class, "ipc-html-content-inner-div")]/text()"#)?
                .sep("\n")
                .transform(death_notes),
        )?,
    ])?
    .section(r#"//div[h4="Died:"]"#)?;

    let in_development = RuleSet::new(vec![
        text("link", "./a/@href")?,
        text("title", "./a/text()")?,
    ])?
    .foreach(r#"//div[starts-with(@class,"devitem")]"#)?
    .with_transform(transforms::movie());

    let rules = RuleSet::new(vec![
        Rule::new(
            "name",
            Path::new(r#"//h1[@data-testid="hero__pageTitle"]//text()"#)?
                .with_transform(transforms::name()),
        )?,
        Rule::new("birth info", birth)?,
        Rule::new("death info", death)?,
        text(
            "headshot",
            r#"(//section[contains(@class, "ipc-page-section")])[1]//div[contains(@class, "ipc-poster")]/img[@class="ipc-image"]/@src"#,
        )?,
        Rule::new(
            "akas",
            Path::new(r#"//div[h4="Alternate Names:"]/text()"#)?.with_transform(transforms::split("  ")),
        )?,
        Rule::new("in development", in_development)?,
        Rule::new(
            "imdbID",
            Path::new(r#"//meta[@property="og:url"]/@content"#)?.with_transform(transforms::imdbid()),
        )?,
    ])?;

    Ok(PageParser::new("maindetails_parser", rules)
        .preprocessor(Substitution::literal(r#"<div class="clear"/> </div>"#, ""))
        .preprocessor(Substitution::literal("<br/>", "<br />"))
        .contains_objects(true)
        .postprocess(postprocess))
}

/// The first text line that opens with a parenthesis.
fn death_notes(value: Value) -> Result<Value, TransformError> {
    value
        .into_string()?
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with('('))
        .map(Value::from)
        .ok_or(TransformError::NoValue)
}

/// Lift the name fields and the birth/death details to the top level.
fn postprocess(data: Map) -> Map {
    let mut flat = Map::new();
    for (key, value) in data {
        match value {
            Value::Map(fields) if matches!(key.as_str(), "name" | "birth info" | "death info") => {
                flat.extend(fields);
            }
            value => {
                flat.insert(key, value);
            }
        }
    }
    for date in ["birth date", "death date"] {
        if flat.get(date).is_some_and(Value::is_blank) {
            flat.shift_remove(date);
        }
    }
    flat
}
