mod common;

use std::collections::HashSet;

use common::{flags, text_table};
use listing_prep::{
    data::Value,
    explode::{ExplodeSpec, RulePreset, TOKEN_DELIMITER, explode, extract_vocabulary},
};
use proptest::prelude::*;

fn amenities_spec() -> ExplodeSpec {
    ExplodeSpec::for_preset("amenities", RulePreset::Amenities)
}

#[test]
fn braces_and_quotes_become_three_indicator_columns() {
    let mut table = text_table("amenities", &[Some(r#"{TV,"Wireless Internet",Kitchen}"#)]);
    let outcome = explode(&mut table, &amenities_spec()).expect("explode");

    assert_eq!(outcome.vocabulary, vec!["TV", "Wireless_Internet", "Kitchen"]);
    assert_eq!(
        outcome.indicator_columns,
        vec!["amenity_TV", "amenity_Wireless_Internet", "amenity_Kitchen"]
    );
    for name in &outcome.indicator_columns {
        assert_eq!(flags(&table, name), vec![true]);
    }
    assert_eq!(
        table.column("amenities").unwrap().values,
        vec![Some(Value::String("TV,Wireless_Internet,Kitchen".into()))]
    );
}

#[test]
fn twenty_four_hour_token_is_prefixed() {
    let mut table = text_table(
        "amenities",
        &[Some(r#"{"24-hour check-in",Kitchen}"#), Some("{24}")],
    );
    let outcome = explode(&mut table, &amenities_spec()).expect("explode");
    assert_eq!(
        outcome.vocabulary,
        vec!["x24-hour_check-in", "Kitchen", "x24"]
    );
    assert!(table.has_column("amenity_x24-hour_check-in"));
    assert!(!table.has_column("amenity_24"));
}

#[test]
fn substring_policy_flags_hdtv_rows_for_tv() {
    let mut table = text_table("amenities", &[Some("{TV}"), Some("{HDTV}"), Some("{Kitchen}")]);
    explode(&mut table, &amenities_spec()).expect("explode");
    assert_eq!(flags(&table, "amenity_TV"), vec![true, true, false]);
    assert_eq!(flags(&table, "amenity_HDTV"), vec![false, true, false]);
}

#[test]
fn empty_and_missing_cells_add_no_columns() {
    let mut table = text_table("amenities", &[None, Some(""), Some("{}"), None]);
    let before = table.column_count();
    let outcome = explode(&mut table, &amenities_spec()).expect("explode");
    assert!(outcome.vocabulary.is_empty());
    assert_eq!(table.column_count(), before);
    assert_eq!(table.row_count(), 4);
}

#[test]
fn zero_row_table_yields_empty_vocabulary() {
    let mut table = text_table("amenities", &[]);
    let outcome = explode(&mut table, &amenities_spec()).expect("explode");
    assert!(outcome.indicator_columns.is_empty());
    assert_eq!(table.column_count(), 1);
}

#[test]
fn missing_cells_get_false_indicators() {
    let mut table = text_table("amenities", &[Some("{TV,Heating}"), None]);
    explode(&mut table, &amenities_spec()).expect("explode");
    assert_eq!(flags(&table, "amenity_Heating"), vec![true, false]);
    assert_eq!(table.column("amenities").unwrap().values[1], None);
}

#[test]
fn unknown_column_is_an_error() {
    let mut table = text_table("amenities", &[Some("{TV}")]);
    let spec = ExplodeSpec::for_preset("features", RulePreset::Amenities);
    assert!(explode(&mut table, &spec).is_err());
}

#[test]
fn second_application_keeps_vocabulary_and_names() {
    let mut table = text_table(
        "amenities",
        &[
            Some(r#"{"24-Hour Check-in","Wireless Internet"}"#),
            Some(r#"{"translation missing: en.hosting_amenity_50",TV}"#),
        ],
    );
    let first = explode(&mut table, &amenities_spec()).expect("first explode");
    let width = table.column_count();
    let second = explode(&mut table, &amenities_spec()).expect("second explode");

    let first_vocab: HashSet<_> = first.vocabulary.iter().collect();
    let second_vocab: HashSet<_> = second.vocabulary.iter().collect();
    assert!(second_vocab.is_superset(&first_vocab));
    assert_eq!(second.replaced_columns, second.vocabulary.len());
    assert_eq!(table.column_count(), width);
}

#[test]
fn host_verifications_use_their_own_prefix() {
    let mut table = text_table(
        "host_verifications",
        &[Some("['email', 'phone']"), Some("['phone', 'jumio']")],
    );
    let spec = ExplodeSpec::for_preset("host_verifications", RulePreset::HostVerifications);
    let outcome = explode(&mut table, &spec).expect("explode");
    assert_eq!(
        outcome.indicator_columns,
        vec![
            "host_verification_email",
            "host_verification_phone",
            "host_verification_jumio"
        ]
    );
    assert_eq!(flags(&table, "host_verification_phone"), vec![true, true]);
}

#[test]
fn extract_vocabulary_collapses_duplicates() {
    let rows = vec!["a,b".to_string(), "b,c,a".to_string()];
    assert_eq!(extract_vocabulary(&rows, TOKEN_DELIMITER), vec!["a", "b", "c"]);
}

fn raw_cell() -> impl Strategy<Value = Option<String>> {
    let token = prop::sample::select(vec![
        "TV",
        "HDTV",
        "Kitchen",
        "Wireless Internet",
        "Washer / Dryer",
        "24-Hour Check-in",
    ]);
    prop::option::of(
        prop::collection::vec(token, 0..5)
            .prop_map(|tokens| format!("{{{}}}", tokens.iter().map(|t| format!("\"{t}\"")).collect::<Vec<_>>().join(","))),
    )
}

proptest! {
    #[test]
    fn explode_preserves_rows_and_generates_unique_names(
        cells in prop::collection::vec(raw_cell(), 0..12)
    ) {
        let refs: Vec<Option<&str>> = cells.iter().map(|c| c.as_deref()).collect();
        let mut table = text_table("amenities", &refs);
        let outcome = explode(&mut table, &amenities_spec()).unwrap();

        prop_assert_eq!(table.row_count(), cells.len());
        prop_assert_eq!(table.column_count(), 1 + outcome.vocabulary.len());
        let names: HashSet<_> = outcome.indicator_columns.iter().collect();
        prop_assert_eq!(names.len(), outcome.vocabulary.len());
    }

    #[test]
    fn double_explode_never_fails_or_shrinks_vocabulary(
        cells in prop::collection::vec(raw_cell(), 0..12)
    ) {
        let refs: Vec<Option<&str>> = cells.iter().map(|c| c.as_deref()).collect();
        let mut table = text_table("amenities", &refs);
        let first = explode(&mut table, &amenities_spec()).unwrap();
        let second = explode(&mut table, &amenities_spec()).unwrap();
        let first_vocab: HashSet<_> = first.vocabulary.into_iter().collect();
        let second_vocab: HashSet<_> = second.vocabulary.into_iter().collect();
        prop_assert!(second_vocab.is_superset(&first_vocab));
    }
}
