//! Behavioural tests for tag classification.

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::{cell::RefCell, fs, path::PathBuf};

use poimap_core::{Classifier, ClassifierConfig, RuleIndex, RuleTable, Tags};

const PHARMACY_TABLE: &str = r#"[{ "class": "pharmacy", "matches": [[["amenity", "pharmacy"]]] }]"#;
const BAKERY_TABLE: &str = r#"[
    { "class": "bakery", "matches": [[["shop", "bakery"]]] },
    { "class": "bread_bakery", "matches": [[["shop", "bakery"], ["cuisine", "bread"]]] }
]"#;

#[fixture]
fn classifier() -> RefCell<Option<Classifier>> {
    RefCell::new(None)
}

#[fixture]
fn element_tags() -> RefCell<Option<Tags>> {
    RefCell::new(None)
}

#[fixture]
fn outcome() -> RefCell<Option<Option<String>>> {
    RefCell::new(None)
}

fn install_table(target: &RefCell<Option<Classifier>>, json: &str) {
    let table = RuleTable::from_json_str(json).expect("valid rule table");
    let index = RuleIndex::build(&table).expect("index builds");
    *target.borrow_mut() = Some(Classifier::new(index, ClassifierConfig::default()));
}

fn set_tags<const N: usize>(target: &RefCell<Option<Tags>>, pairs: [(&str, &str); N]) {
    *target.borrow_mut() = Some(Tags::from(pairs));
}

fn expect_outcome(result: &RefCell<Option<Option<String>>>) -> Option<String> {
    result
        .borrow()
        .as_ref()
        .expect("classification was attempted")
        .clone()
}

#[given("a rule table with a pharmacy category")]
fn pharmacy_table(#[from(classifier)] target: &RefCell<Option<Classifier>>) {
    install_table(target, PHARMACY_TABLE);
}

#[given("a rule table with a generic and a specific bakery rule")]
fn bakery_table(#[from(classifier)] target: &RefCell<Option<Classifier>>) {
    install_table(target, BAKERY_TABLE);
}

#[given("tags for a named pharmacy that is also tagged as a chemist")]
fn named_pharmacy(#[from(element_tags)] tags: &RefCell<Option<Tags>>) {
    set_tags(
        tags,
        [("name", "ACME"), ("amenity", "pharmacy"), ("shop", "chemist")],
    );
}

#[given("tags for an unnamed pharmacy")]
fn unnamed_pharmacy(#[from(element_tags)] tags: &RefCell<Option<Tags>>) {
    set_tags(tags, [("amenity", "pharmacy")]);
}

#[given("tags for a named restaurant")]
fn named_restaurant(#[from(element_tags)] tags: &RefCell<Option<Tags>>) {
    set_tags(tags, [("name", "X"), ("amenity", "restaurant")]);
}

#[given("tags for a named building")]
fn named_building(#[from(element_tags)] tags: &RefCell<Option<Tags>>) {
    set_tags(tags, [("name", "X"), ("building", "yes")]);
}

#[given("tags for a named bread bakery")]
fn named_bread_bakery(#[from(element_tags)] tags: &RefCell<Option<Tags>>) {
    set_tags(
        tags,
        [("name", "Loaf"), ("shop", "bakery"), ("cuisine", "bread")],
    );
}

#[when("I classify the tags")]
fn classify_tags(
    #[from(classifier)] target: &RefCell<Option<Classifier>>,
    #[from(element_tags)] tags: &RefCell<Option<Tags>>,
    #[from(outcome)] result: &RefCell<Option<Option<String>>>,
) {
    let class = {
        let classifier = target.borrow();
        let classifier = classifier.as_ref().expect("classifier prepared");
        let tags = tags.borrow();
        let tags = tags.as_ref().expect("tags prepared");
        classifier
            .classify(tags)
            .map(|classification| classification.class().to_owned())
    };
    *result.borrow_mut() = Some(class);
}

#[then("the pharmacy category is returned")]
fn pharmacy_returned(#[from(outcome)] result: &RefCell<Option<Option<String>>>) {
    assert_eq!(expect_outcome(result).as_deref(), Some("pharmacy"));
}

#[then("the misc category is returned")]
fn misc_returned(#[from(outcome)] result: &RefCell<Option<Option<String>>>) {
    assert_eq!(expect_outcome(result).as_deref(), Some("misc"));
}

#[then("the bread bakery category is returned")]
fn bread_bakery_returned(#[from(outcome)] result: &RefCell<Option<Option<String>>>) {
    assert_eq!(expect_outcome(result).as_deref(), Some("bread_bakery"));
}

#[then("no category is returned")]
fn nothing_returned(#[from(outcome)] result: &RefCell<Option<Option<String>>>) {
    assert_eq!(expect_outcome(result), None);
}

#[test]
fn scenario_indices_follow_feature_order() {
    let feature =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/features/classification.feature");
    let contents = fs::read_to_string(&feature).unwrap_or_else(|err| {
        panic!("failed to read feature file {feature:?}: {err}");
    });
    let titles: Vec<&str> = contents
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Scenario: "))
        .collect();
    assert_eq!(
        titles,
        [
            "a named pharmacy is classified by its rule",
            "an unnamed element is not a POI",
            "an unmatched amenity falls back to misc",
            "a building without POI keys is ignored",
            "the more specific bakery rule wins",
        ],
        "scenario order changed in feature file"
    );
}

#[scenario(path = "tests/features/classification.feature", index = 0)]
fn named_pharmacy_is_classified(
    classifier: RefCell<Option<Classifier>>,
    element_tags: RefCell<Option<Tags>>,
    outcome: RefCell<Option<Option<String>>>,
) {
    let _ = (classifier, element_tags, outcome);
}

#[scenario(path = "tests/features/classification.feature", index = 1)]
fn unnamed_element_is_ignored(
    classifier: RefCell<Option<Classifier>>,
    element_tags: RefCell<Option<Tags>>,
    outcome: RefCell<Option<Option<String>>>,
) {
    let _ = (classifier, element_tags, outcome);
}

#[scenario(path = "tests/features/classification.feature", index = 2)]
fn unmatched_amenity_is_misc(
    classifier: RefCell<Option<Classifier>>,
    element_tags: RefCell<Option<Tags>>,
    outcome: RefCell<Option<Option<String>>>,
) {
    let _ = (classifier, element_tags, outcome);
}

#[scenario(path = "tests/features/classification.feature", index = 3)]
fn building_is_ignored(
    classifier: RefCell<Option<Classifier>>,
    element_tags: RefCell<Option<Tags>>,
    outcome: RefCell<Option<Option<String>>>,
) {
    let _ = (classifier, element_tags, outcome);
}

#[scenario(path = "tests/features/classification.feature", index = 4)]
fn specific_bakery_rule_wins(
    classifier: RefCell<Option<Classifier>>,
    element_tags: RefCell<Option<Tags>>,
    outcome: RefCell<Option<Option<String>>>,
) {
    let _ = (classifier, element_tags, outcome);
}
