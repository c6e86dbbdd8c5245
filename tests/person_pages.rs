use imdb_parser::evaluator::evaluate;
use imdb_parser::{Document, ParserRegistry, Path, Rule, RuleSet, Value};
use rstest::{fixture, rstest};

#[fixture]
fn registry() -> ParserRegistry {
    ParserRegistry::new().unwrap()
}

const FILMOGRAPHY: &str = r##"
    <div id="filmo-head-actor"><a href="#actor">Actor</a></div>
    <div>
        <div class="filmo-row odd"><b><a href="/title/tt0000001/">One</a></b></div>
        <div class="filmo-row even"><b><a href="/title/tt0000002/">Two</a></b></div>
        <div class="filmo-row odd"><b><a href="/title/tt0000003/">Three</a></b></div>
    </div>
    <div id="filmo-head-producer"><a href="#producer">Producer</a></div>
    <div>
        <div class="filmo-row odd"><b><a href="/title/tt0000004/">Four</a></b></div>
        <div class="filmo-row even"><b><a href="/title/tt0000005/">Five</a></b></div>
    </div>
"##;

#[rstest]
fn test_birth_date_from_born_section(registry: ParserRegistry) {
    let page = r#"
        <html><body>
        <div><h4>Born:</h4><time itemprop="birthDate" datetime="1960-05-17">May 17, 1960</time></div>
        </body></html>
    "#;
    let data = registry.parse("maindetails_parser", page).unwrap();
    assert_eq!(data["birth date"], Value::from("1960-05-17"));
}

#[rstest]
fn test_no_died_section(registry: ParserRegistry) {
    let page = r#"
        <html><body>
        <div><h4>Born:</h4><time itemprop="birthDate" datetime="1960-05-17"></time></div>
        </body></html>
    "#;
    let data = registry.parse("maindetails_parser", page).unwrap();
    for key in ["death date", "death place", "death notes"] {
        assert!(!data.contains_key(key), "{}", key);
    }
}

#[rstest]
fn test_filmography_grouped_by_job(registry: ParserRegistry) {
    let data = registry.parse("filmo_parser", FILMOGRAPHY).unwrap();
    let filmography = data["filmography"].as_map().unwrap();
    assert_eq!(filmography.len(), 2);
    assert_eq!(filmography["actor"].as_list().unwrap().len(), 3);
    assert_eq!(filmography["producer"].as_list().unwrap().len(), 2);
}

#[rstest]
fn test_nick_names_are_a_sequence(registry: ParserRegistry) {
    let page = r#"
        <ul class="ipc-metadata-list"><li id="nicknames">
            <ul class="ipc-inline-list">
                <li><span>The Kid</span></li>
                <li><span>Slim</span></li>
            </ul>
        </li></ul>
    "#;
    let data = registry.parse("bio_parser", page).unwrap();
    assert_eq!(
        data["nick names"],
        Value::List(vec!["The Kid".into(), "Slim".into()])
    );
}

#[rstest]
#[case("maindetails_parser")]
#[case("bio_parser")]
#[case("filmo_parser")]
#[case("otherworks_parser")]
#[case("person_awards_parser")]
#[case("person_genres_parser")]
#[case("person_keywords_parser")]
fn test_empty_input(registry: ParserRegistry, #[case] name: &str) {
    assert!(registry.parse(name, "").unwrap().is_empty());
    assert!(registry.parse(name, "   \n").unwrap().is_empty());
}

#[rstest]
#[case("<html")]
#[case("<<<>>>")]
#[case("</div></div>")]
fn test_broken_markup_does_not_fail(registry: ParserRegistry, #[case] markup: &str) {
    for name in registry.names() {
        let data = registry.parse(name, markup).unwrap();
        assert!(!data.contains_key("birth date"));
    }
}

#[rstest]
#[case("filmo_parser", FILMOGRAPHY)]
#[case("bio_parser", "<ul class=\"ipc-metadata-list\"><li id=\"height\">1.8 m</li></ul>")]
fn test_parse_is_idempotent(registry: ParserRegistry, #[case] name: &str, #[case] page: &str) {
    let first = registry.parse(name, page).unwrap();
    let second = registry.parse(name, page).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_later_rule_wins() {
    let doc = Document::parse("<p class='a'>first</p><p class='b'>second</p>");
    let set = RuleSet::new(vec![
        Rule::new("text", Path::new("//p[@class='a']/text()").unwrap()).unwrap(),
        Rule::new("other", Path::new("//p[@class='b']/@class").unwrap()).unwrap(),
        Rule::new("text", Path::new("//p[@class='b']/text()").unwrap()).unwrap(),
    ])
    .unwrap();

    let data = evaluate(&set, doc.root()).unwrap();
    let data = data.as_map().unwrap();
    assert_eq!(data["text"], Value::from("second"));
    // the key keeps the position where it first appeared
    assert_eq!(data.keys().collect::<Vec<_>>(), vec!["text", "other"]);
}

#[rstest]
#[case("<ul></ul>", 0)]
#[case("<ul><li>a</li></ul>", 1)]
#[case("<ul><li>a</li><li>b</li><li></li></ul>", 3)]
fn test_foreach_yields_one_item_per_node(#[case] markup: &str, #[case] expected: usize) {
    let doc = Document::parse(markup);
    let set = RuleSet::new(vec![Rule::new("item", Path::new("./text()").unwrap()).unwrap()])
        .unwrap()
        .foreach("//li")
        .unwrap();
    match evaluate(&set, doc.root()) {
        Some(Value::List(items)) => assert_eq!(items.len(), expected),
        other => panic!("expected a list, got {:?}", other),
    }
}

#[test]
fn test_section_does_not_see_outside_content() {
    let doc = Document::parse(
        r#"<div id="outside"><span class="v">outside</span></div>
           <div id="inside"><b>no value here</b></div>"#,
    );
    let set = RuleSet::new(vec![
        Rule::new("value", Path::new(".//span[@class='v']/text()").unwrap()).unwrap(),
    ])
    .unwrap()
    .section("//div[@id='inside']")
    .unwrap();

    let data = evaluate(&set, doc.root()).unwrap();
    assert!(data.as_map().unwrap().is_empty());
}
