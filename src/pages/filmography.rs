//! The person filmography, grouped by job.

use crate::error::{RuleError, TransformError};
use crate::imdb::{analyze_imdbid, build_movie};
use crate::parser::PageParser;
use crate::rules::{Key, Path, Rule, RuleSet};
use crate::transforms::take;
use crate::value::{Map, Value};

use super::{stripped, text};

pub(super) fn parser() -> Result<PageParser, RuleError> {
    let films = RuleSet::new(vec![
        text("link", ".//b/a/@href")?,
        text("title", ".//b/a/text()")?,
        text(
            "notes",
            r#".//div[@class="ipc-metadata-list-summary-item__c"]//ul[contains(@class, "ipc-metadata-list-summary-item__stl")]//label/text()"#,
        )?,
        stripped("year", r#".//span[@class="year_column"]//text()"#)?,
        text("status", r#"./a[@class="in_production"]/text()"#)?,
        stripped("rolesNoChar", ".//br/following-sibling::text()")?,
    ])?
    .foreach(r#"./following-sibling::div[1]/div[contains(@class, "filmo-row")]"#)?
    .transform(film);

    let jobs = RuleSet::new(vec![Rule::new(Key::Path(Path::new(".//a/text()")?), films)?])?
        .foreach(r#"//div[contains(@id, "filmo-head-")]"#)?;

    let rules = RuleSet::new(vec![Rule::new("filmography", jobs)?])?;

    Ok(PageParser::new("filmo_parser", rules)
        .get_refs(true)
        .postprocess(postprocess))
}

fn film(value: Value) -> Result<Value, TransformError> {
    let mut row = value.into_map()?;
    let title = take(&mut row, "title");
    let movie_id = analyze_imdbid(&take(&mut row, "link"));

    let mut extra = Map::new();
    for (from, to) in [
        ("year", "year"),
        ("rolesNoChar", "rolesNoChar"),
        ("notes", "additionalNotes"),
        ("status", "status"),
    ] {
        if let Some(value) = row.shift_remove(from) {
            extra.insert(to.to_string(), value);
        }
    }
    Ok(Value::Movie(build_movie(&title, movie_id, extra)))
}

/// One mapping from job to films instead of one mapping per job heading.
fn postprocess(mut data: Map) -> Map {
    let Some(slot) = data.get_mut("filmography") else {
        return data;
    };
    let jobs = match std::mem::replace(slot, Value::List(Vec::new())) {
        Value::List(jobs) => jobs,
        other => {
            *slot = other;
            return data;
        }
    };

    let mut merged = Map::new();
    for job in jobs {
        if let Value::Map(job) = job {
            merged.extend(job);
        }
    }
    if !merged.is_empty() {
        *slot = Value::Map(merged);
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
        <html><body>
        <div id="filmography">
            <div id="filmo-head-actor" class="head"><a href="#actor">Actor</a> (3 credits)</div>
            <div class="filmo-category-section">
                <div class="filmo-row odd"><span class="year_column">&nbsp;2016</span>
                    <b><a href="/title/tt2119532/">Hacksaw Ridge</a></b><br/>Himself</div>
                <div class="filmo-row even"><span class="year_column">1995</span>
                    <b><a href="/title/tt0112573/">Braveheart</a></b></div>
                <div class="filmo-row odd"><b><a href="/title/tt9999999/">Untitled</a></b>
                    <a class="in_production">announced</a></div>
            </div>
            <div id="filmo-head-director" class="head"><a href="#director">Director</a></div>
            <div class="filmo-category-section">
                <div class="filmo-row odd"><span class="year_column">2016</span>
                    <b><a href="/title/tt2119532/">Hacksaw Ridge</a></b></div>
                <div class="filmo-row even"><span class="year_column">1995</span>
                    <b><a href="/title/tt0112573/">Braveheart</a></b></div>
            </div>
        </div>
        </body></html>
    "##;

    fn movie(value: &Value) -> &crate::value::MovieRef {
        match value {
            Value::Movie(movie) => movie,
            other => panic!("expected a movie, got {:?}", other),
        }
    }

    #[test]
    fn test_filmography_by_job() {
        let data = parser().unwrap().parse(PAGE);
        let filmography = data["filmography"].as_map().unwrap();
        assert_eq!(filmography.keys().collect::<Vec<_>>(), vec!["actor", "director"]);

        let acting = filmography["actor"].as_list().unwrap();
        assert_eq!(acting.len(), 3);
        let first = movie(&acting[0]);
        assert_eq!(first.title, "Hacksaw Ridge");
        assert_eq!(first.movie_id.as_deref(), Some("2119532"));
        assert_eq!(first.data.get("year"), Some(&Value::Int(2016)));
        assert_eq!(first.data.get("rolesNoChar"), Some(&Value::from("Himself")));
        assert_eq!(
            movie(&acting[2]).data.get("status"),
            Some(&Value::from("announced"))
        );

        assert_eq!(filmography["director"].as_list().unwrap().len(), 2);
    }

    #[test]
    fn test_references() {
        let data = parser().unwrap().parse(PAGE);
        let titles = data["references"].as_map().unwrap()["titles"].as_map().unwrap();
        assert_eq!(titles["Braveheart"], Value::from("0112573"));
    }

    #[test]
    fn test_postprocess_merges_jobs_in_place() {
        let job = |name: &str, title: &str| {
            let mut job = Map::new();
            job.insert(name.to_string(), Value::List(vec![title.into()]));
            Value::Map(job)
        };
        let mut data = Map::new();
        data.insert(
            "filmography".into(),
            Value::List(vec![job("actor", "One"), job("writer", "Two")]),
        );
        data.insert("references".into(), Value::Map(Map::new()));

        let data = postprocess(data);
        assert_eq!(data.keys().collect::<Vec<_>>(), vec!["filmography", "references"]);
        let filmography = data["filmography"].as_map().unwrap();
        assert_eq!(filmography["actor"], Value::List(vec!["One".into()]));
        assert_eq!(filmography["writer"], Value::List(vec!["Two".into()]));
    }

    #[test]
    fn test_page_without_filmography() {
        let data = parser().unwrap().parse("<html><body><p>nothing</p></body></html>");
        assert_eq!(data["filmography"], Value::List(vec![]));
    }
}
