//! The person biography page.

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{RuleError, TransformError};
use crate::parser::PageParser;
use crate::rules::{Path, Rule, RuleSet};
use crate::transforms::{self, normalize, text as field};
use crate::value::{Map, Value};

use super::{stripped, text};

const CONTENT: &str = r#"div[contains(@class, "ipc-metadata-list-item__content-container")]//div[contains(@class, "ipc-html-content-inner-div")]/text()"#;
const INNER: &str = r#".//div[contains(@class, "ipc-html-content-inner-div")]/text()"#;

pub(super) fn parser() -> Result<PageParser, RuleError> {
    let birth = RuleSet::new(vec![
        text(
            "monthday",
            r#".//a[starts-with(@href, "/search/name/?birth_monthday=")]/text()"#,
        )?,
        text("year", r#".//a[starts-with(@href, "/search/name/?birth_year=")]/text()"#)?,
        text(
            "birth place",
            r#".//a[starts-with(@href, "/search/name/?birth_place=")]/text()"#,
        )?,
    ])?
    .section(r#"//ul[contains(@class, "ipc-metadata-list")]/li[@id="born"]"#)?;

    let death = RuleSet::new(vec![
        text("monthday", r#".//a[contains(@href, "monthday")]/text()"#)?,
        text(
            "year",
            r#".//a[starts-with(@href, "/search/name/?death_date=")][2]/text()"#,
        )?,
        text(
            "death place",
            r#".//a[starts-with(@href, "/search/name/?death_place=")]/text()"#,
        )?,
        Rule::new(
            "death notes",
            Path::new(r#".//div[contains(@class, "ipc-html-content-inner-div")]/text()"#)?
                .transform(parenthesized),
        )?,
    ])?
    .section(r#"//ul[contains(@class, "ipc-metadata-list")]/li[@id="died"]"#)?;

    let nick_names = RuleSet::new(vec![stripped("nickname", ".//text()")?])?
        .foreach(r#"//li[@id="nicknames"]//ul[contains(@class, "ipc-inline-list")]/li/span"#)?
        .with_transform(transforms::field("nickname"));

    let mini_biography = RuleSet::new(vec![
        text("bio", ".//text()")?,
        text("by", r#".//a[@name="ba"]//text()"#)?,
    ])?
    .foreach(r#"//div[@data-testid="sub-section-mini_bio"]"#)?
    .transform(|value| {
        let item = value.into_map()?;
        let bio = field(&item, "bio")
            .split("- IMDb Mini Biography By:")
            .next()
            .unwrap_or("")
            .trim();
        let by = match field(&item, "by").trim() {
            "" => "Anonymous",
            by => by,
        };
        Ok(Value::Str(format!("{}::{}", bio, by)))
    });

    let spouse = RuleSet::new(vec![
        text("name", "./td[1]//text()")?,
        text("info", "./td[2]//text()")?,
    ])?
    .foreach(r#"//a[@name="spouse"]/following::table[1]//tr"#)?
    .transform(|value| {
        let item = value.into_map()?;
        let name = item
            .get("name")
            .and_then(Value::as_str)
            .ok_or(TransformError::NoValue)?;
        let line = format!("{}::{}", name.trim(), normalize(field(&item, "info")));
        Ok(Value::Str(line.trim_matches(':').to_string()))
    });

    let trade_mark = listed(
        "trademark",
        r#"//div[@data-testid="sub-section-trademark"]//li[contains(@id, "trademark_")]"#,
    )?;
    let trivia = listed(
        "trivia_item",
        r#"//div[@data-testid="sub-section-trivia"]//li[contains(@id, "trivia_")]"#,
    )?;
    let quotes = listed(
        "quote",
        r#"//div[@data-testid="sub-section-quotes"]//li[contains(@id, "quote_")]"#,
    )?
    .with_transform(transforms::chain(
        transforms::field("quote"),
        transforms::string_fn(|quote| quote.replace('\n', " ")),
    ));

    let salary_history = RuleSet::new(vec![
        stripped("title", ".//a/text()")?,
        stripped("info", "string(.//a/following-sibling::text()[1])")?,
    ])?
    .foreach(r#"//div[@data-testid="sub-section-salary"]//li"#)?
    .transform(|value| {
        let item = value.into_map()?;
        Ok(Value::Str(format!(
            "{} {}",
            field(&item, "title").trim(),
            field(&item, "info").trim().replace(" - ", "::")
        )))
    });

    let rules = RuleSet::new(vec![
        text(
            "headshot",
            r#"//div[contains(@class, "ipc-poster")]//img[contains(@class, "ipc-image")]/@src"#,
        )?,
        stripped("birth name", &format!(r#"//li[@id="name"]/{}"#, CONTENT))?,
        Rule::new("nick names", nick_names)?,
        Rule::new("birth info", birth)?,
        Rule::new("death info", death)?,
        // older layout; wins when both are present
        stripped(
            "birth name",
            r#"//table[@id="overviewTable"]//td[text()="Birth Name"]/following-sibling::td[1]/text()"#,
        )?,
        stripped("height", &format!(r#"//li[@id="height"]/{}"#, CONTENT))?,
        Rule::new("mini biography", mini_biography)?,
        Rule::new("spouse", spouse)?,
        Rule::new("trade mark", trade_mark)?,
        Rule::new("trivia", trivia)?,
        Rule::new("quotes", quotes)?,
        Rule::new("salary history", salary_history)?,
    ])?;

    Ok(PageParser::new("bio_parser", rules)
        .get_refs(true)
        .postprocess(postprocess))
}

/// A repeated list item reduced to the stripped text of its content block.
fn listed(key: &'static str, foreach: &str) -> Result<RuleSet, RuleError> {
    Ok(RuleSet::new(vec![stripped(key, INNER)?])?
        .foreach(foreach)?
        .with_transform(transforms::field(key)))
}

/// Text between the first `(` and the last `)`.
fn parenthesized(value: Value) -> Result<Value, TransformError> {
    let notes = value.into_string()?;
    match (notes.find('('), notes.rfind(')')) {
        (Some(begin), Some(end)) if begin < end => Ok(Value::from(notes[begin + 1..end].trim())),
        _ => Ok(Value::from("")),
    }
}

/// `"May 17"` as `"05-17"`.
fn month_day(text: &str) -> Option<String> {
    // 2000 is a leap year, so February 29 parses
    NaiveDate::parse_from_str(&format!("{} 2000", text.trim()), "%B %d %Y")
        .ok()
        .map(|date| date.format("%m-%d").to_string())
}

/// Assemble `birth date`/`death date` from month-day and year and lift the
/// remaining details to the top level.
fn postprocess(mut data: Map) -> Map {
    for event in ["birth", "death"] {
        let mut info = match data.shift_remove(&format!("{} info", event)) {
            Some(Value::Map(info)) => info,
            _ => Map::new(),
        };

        let monthday = match info.shift_remove("monthday") {
            Some(Value::Str(text)) => month_day(&text).unwrap_or_else(|| {
                debug!(event, monthday = %text, "unrecognized month and day");
                String::new()
            }),
            _ => String::new(),
        };
        let year = match info.shift_remove("year") {
            Some(Value::Str(year)) => year.trim().to_string(),
            _ => String::new(),
        };
        let date = match (year.is_empty(), monthday.is_empty()) {
            (false, false) => format!("{}-{}", year, monthday),
            (false, true) => year,
            (true, false) => monthday,
            (true, true) => String::new(),
        };
        if !date.is_empty() {
            data.insert(format!("{} date", event), Value::Str(date));
        }

        for (key, value) in info {
            let value = match (key.as_str(), value) {
                ("death notes", Value::Str(notes)) => Value::Str(notes.trim().to_string()),
                (_, value) => value,
            };
            data.insert(key, value);
        }
    }

    if let Some(Value::Str(nick)) = data.get("nick names").cloned() {
        data.insert("nick names".to_string(), Value::List(vec![Value::Str(nick)]));
    }
    data
}
