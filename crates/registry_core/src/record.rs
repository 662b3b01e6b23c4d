use std::collections::{BTreeMap, HashSet};

/// One extracted record: normalized field name to raw string value.
///
/// The field set is whatever the live page exposes, so this stays an open map.
pub type Record = BTreeMap<String, String>;

/// True when at least one value carries something other than whitespace.
pub fn has_content(record: &Record) -> bool {
    record.values().any(|value| !value.trim().is_empty())
}

/// Drops exact duplicate rows, keeping the first occurrence and the input order.
pub fn dedupe_rows(rows: Vec<Record>) -> Vec<Record> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(row.clone()))
        .collect()
}
