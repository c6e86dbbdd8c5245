//! The person awards page: one row per nomination.

use crate::error::{RuleError, TransformError};
use crate::imdb::{analyze_imdbid, build_movie};
use crate::parser::PageParser;
use crate::rules::{Rule, RuleSet};
use crate::transforms::{self, take};
use crate::value::{Map, Value};

use super::text;

pub(super) fn parser() -> Result<PageParser, RuleError> {
    let movie = RuleSet::new(vec![
        text("title", "./text()")?,
        text("link", "./@href")?,
        text(
            "year",
            r#"./following-sibling::span[@class="title_year"][1]/text()"#,
        )?,
    ])?
    .transform(|value| {
        let mut fields = value.into_map()?;
        let title = take(&mut fields, "title");
        let movie_id = analyze_imdbid(&take(&mut fields, "link"));
        let year = take(&mut fields, "year");

        let mut extra = Map::new();
        extra.insert(
            "year".to_string(),
            Value::from(year.trim().trim_matches(|c| c == '(' || c == ')')),
        );
        Ok(Value::Movie(build_movie(&title, movie_id, extra)))
    });

    let shared_with = RuleSet::new(vec![
        text("name", "./text()")?,
        text("link", "./@href")?,
    ])?
    .with_transform(transforms::person());

    let row = RuleSet::new(vec![
        text("year", r#"./td[@class="award_year"]/a/text()"#)?,
        text("result", r#"./td[@class="award_outcome"]/b/text()"#)?,
        text("prize", r#".//span[@class="award_category"]/text()"#)?,
        Rule::new("movies", movie)?.foreach(r#"./td[@class="award_description"]/a"#)?,
        Rule::new("shared with", shared_with)?.foreach(
            r#"./td[@class="award_description"]/div[@class="shared_with"]/following-sibling::ul//a"#,
        )?,
        text("category", r#"./td[@class="award_description"]/text()"#)?,
        text("award", "ancestor::table[1]/preceding-sibling::h3[1]/text()")?,
    ])?
    .foreach(r#"//table[@class="awards"]//tr"#)?
    .transform(award);

    let rules = RuleSet::new(vec![Rule::new("awards", row)?])?;
    Ok(PageParser::new("person_awards_parser", rules).get_refs(true))
}

/// Tidy one row. A year that is not a number drops the row.
fn award(value: Value) -> Result<Value, TransformError> {
    let mut row = value.into_map()?;
    let mut award = Map::new();

    let year = take(&mut row, "year");
    if !year.trim().is_empty() {
        let year = year
            .trim()
            .parse::<i64>()
            .map_err(|_| TransformError::Invalid(format!("award year {:?}", year)))?;
        award.insert("year".to_string(), Value::Int(year));
    }
    for key in ["result", "prize", "category"] {
        let field = take(&mut row, key);
        if !field.trim().is_empty() {
            award.insert(key.to_string(), Value::from(field.trim()));
        }
    }
    if let Some(Value::List(movies)) = row.shift_remove("movies") {
        if !movies.is_empty() {
            award.insert("movies".to_string(), Value::List(movies));
        }
    }
    let name = take(&mut row, "award");
    if !name.trim().is_empty() {
        award.insert("award".to_string(), Value::from(name.trim()));
    }
    if let Some(Value::List(people)) = row.shift_remove("shared with") {
        if !people.is_empty() {
            award.insert("shared with".to_string(), Value::List(people));
        }
    }
    Ok(Value::Map(award))
}
