//! Ingestion with non-default import keys and fallback keys.

use poimap_core::{Classifier, ClassifierConfig, RuleIndex, RuleTable};
use poimap_data::{ImportFilter, ingest_osm_pbf};
use rstest::rstest;

mod support;

use support::{builtin_classifier, decode_fixture};

fn classes(classifier: &Classifier, filter: &ImportFilter) -> Vec<(String, String)> {
    let fixture = decode_fixture("poi_tags");
    let report = ingest_osm_pbf(fixture.as_ref(), classifier, filter).expect("ingest fixture");
    report
        .records
        .into_iter()
        .map(|record| (record.id.to_string(), record.class))
        .collect()
}

fn owned(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(id, class)| ((*id).to_owned(), (*class).to_owned()))
        .collect()
}

#[rstest]
fn narrower_import_keys_limit_candidates() {
    let filter = ImportFilter::new(["amenity"]);
    assert_eq!(
        classes(&builtin_classifier(), &filter),
        owned(&[("node/1", "pharmacy"), ("node/3", "misc")])
    );
}

#[rstest]
fn office_becomes_misc_when_it_is_a_fallback_key() {
    let table = RuleTable::builtin().expect("builtin table");
    let index = RuleIndex::build(&table).expect("builtin index");
    let config = ClassifierConfig {
        fallback_keys: ["amenity", "office"].into_iter().map(str::to_owned).collect(),
    };
    let classifier = Classifier::new(index, config);

    let found = classes(&classifier, &ImportFilter::default());
    assert!(found.contains(&("node/7".to_owned(), "misc".to_owned())));
    assert!(found.contains(&("node/3".to_owned(), "misc".to_owned())));
}

#[rstest]
fn custom_rule_table_drives_classification() {
    let table = RuleTable::from_json_str(
        r#"[{ "class": "green_space", "matches": [[["leisure", "park"]]] }]"#,
    )
    .expect("valid table");
    let index = RuleIndex::build(&table).expect("index builds");
    let classifier = Classifier::new(
        index,
        ClassifierConfig {
            fallback_keys: Default::default(),
        },
    );

    assert_eq!(
        classes(&classifier, &ImportFilter::default()),
        owned(&[("way/100", "green_space")])
    );
}
