//! The person "other works" page.

use crate::error::RuleError;
use crate::parser::PageParser;
use crate::rules::{Rule, RuleSet};
use crate::transforms;

use super::stripped;

pub(super) fn parser() -> Result<PageParser, RuleError> {
    let works = RuleSet::new(vec![stripped(
        "work",
        r#".//div[contains(@class, "ipc-html-content-inner-div")]/text()"#,
    )?])?
    .foreach(r#"//li[contains(@class, "ipc-metadata-list__item") and @data-testid="list-item"]"#)?
    .with_transform(transforms::field("work"));

    let rules = RuleSet::new(vec![Rule::new("other works", works)?])?;
    Ok(PageParser::new("otherworks_parser", rules).get_refs(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_other_works() {
        let page = r#"
            <ul>
                <li class="ipc-metadata-list__item" data-testid="list-item">
                    <div class="ipc-html-content-inner-div"> Stage: Appeared in <a href="/title/tt0000042/">Waiting for Godot</a> </div>
                </li>
                <li class="ipc-metadata-list__item" data-testid="other">
                    <div class="ipc-html-content-inner-div">ignored</div>
                </li>
                <li class="ipc-metadata-list__item" data-testid="list-item">
                    <div class="ipc-html-content-inner-div">Music video: "Song" (1990).</div>
                </li>
            </ul>
        "#;
        let data = parser().unwrap().parse(page);
        assert_eq!(
            data["other works"],
            Value::List(vec![
                "Stage: Appeared in".into(),
                "Music video: \"Song\" (1990).".into()
            ])
        );
        let titles = data["references"].as_map().unwrap()["titles"].as_map().unwrap();
        assert_eq!(titles["Waiting for Godot"], Value::from("0000042"));
    }
}
