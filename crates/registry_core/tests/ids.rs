use pretty_assertions::assert_eq;
use registry_core::{dedupe_rows, extract_id, has_content, normalize_id, Record, RecordKind, SeenIds};

fn record(pairs: &[(&str, &str)]) -> Record {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn ids_come_from_known_query_parameters() {
    assert_eq!(extract_id("Dog_Detail?DogID=12345").as_deref(), Some("12345"));
    assert_eq!(extract_id("/DB/People_Detail?pid=77&x=1").as_deref(), Some("77"));
    assert_eq!(extract_id("Litter_Detail?LID=9#top").as_deref(), Some("9"));
    assert_eq!(extract_id("detail.aspx?id=3&DogID=4").as_deref(), Some("3"));
}

#[test]
fn non_numeric_or_missing_ids_are_ignored() {
    assert_eq!(extract_id("Dog_Detail?DogID=abc"), None);
    assert_eq!(extract_id("Dog_Detail"), None);
    assert_eq!(extract_id("Dog_Detail?DogID="), None);
    assert_eq!(extract_id("Dog_Detail?Name=Rex&DID=8").as_deref(), Some("8"));
}

#[test]
fn normalize_strips_float_artifacts() {
    assert_eq!(normalize_id(" 1234.0 ").as_deref(), Some("1234"));
    assert_eq!(normalize_id("1234").as_deref(), Some("1234"));
    assert_eq!(normalize_id("12.5"), None);
    assert_eq!(normalize_id(""), None);
}

#[test]
fn kinds_are_guessed_from_link_paths() {
    assert_eq!(RecordKind::from_link("Dog_Detail?DogID=1"), Some(RecordKind::Dog));
    assert_eq!(RecordKind::from_link("/DB/People_Detail?PID=1"), Some(RecordKind::Person));
    assert_eq!(RecordKind::from_link("Litter_Detail?LitterID=1"), Some(RecordKind::Litter));
    assert_eq!(RecordKind::from_link("Default.aspx?dog=1"), None);
}

#[test]
fn seen_ids_are_tracked_per_kind() {
    let mut seen = SeenIds::new();
    assert!(seen.insert(RecordKind::Dog, "1"));
    assert!(!seen.insert(RecordKind::Dog, "1"));
    assert!(seen.insert(RecordKind::Person, "1"));
    assert!(seen.contains(RecordKind::Dog, "1"));
    assert!(!seen.contains(RecordKind::Litter, "1"));
    assert_eq!(seen.count(RecordKind::Dog), 1);
}

#[test]
fn duplicate_rows_collapse_in_order() {
    let a = record(&[("name", "Fido")]);
    let b = record(&[("name", "Rex")]);
    let rows = dedupe_rows(vec![a.clone(), b.clone(), a.clone()]);
    assert_eq!(rows, vec![a, b]);
}

#[test]
fn blank_records_have_no_content() {
    assert!(!has_content(&record(&[("name", "  "), ("city", "")])));
    assert!(has_content(&record(&[("name", " "), ("city", "Denver")])));
}
