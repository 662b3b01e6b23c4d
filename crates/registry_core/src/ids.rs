use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Query parameters that carry a record identifier, in lookup order.
pub const ID_PARAMS: [&str; 6] = ["id", "DogID", "DID", "PID", "LitterID", "LID"];

/// The three record families the registry exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    Dog,
    Person,
    Litter,
}

impl RecordKind {
    /// Query parameter the detail page expects.
    pub fn detail_param(self) -> &'static str {
        match self {
            RecordKind::Dog => "DogID",
            RecordKind::Person => "PID",
            RecordKind::Litter => "LitterID",
        }
    }

    /// Column that stores the identifier on a detail record.
    pub fn id_field(self) -> &'static str {
        match self {
            RecordKind::Dog => "bg_dog_id",
            RecordKind::Person => "bg_person_id",
            RecordKind::Litter => "bg_litter_id",
        }
    }

    /// Guesses the kind from a link target such as `Dog_Detail?DogID=12`.
    pub fn from_link(link: &str) -> Option<Self> {
        let lower = link.to_ascii_lowercase();
        let path = lower.split('?').next().unwrap_or(&lower);
        if path.contains("dog") {
            Some(RecordKind::Dog)
        } else if path.contains("people") || path.contains("person") {
            Some(RecordKind::Person)
        } else if path.contains("litter") {
            Some(RecordKind::Litter)
        } else {
            None
        }
    }
}

/// Pulls the raw digit identifier out of a link's query string.
///
/// Parameter names are matched case-insensitively in [`ID_PARAMS`] order.
/// Values that are not purely digits are ignored.
pub fn extract_id(link: &str) -> Option<String> {
    let query = link.split_once('?').map(|(_, query)| query)?;
    let query = query.split('#').next().unwrap_or(query);
    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.trim().to_string()))
        .collect();

    ID_PARAMS.iter().find_map(|param| {
        pairs
            .iter()
            .find(|(key, value)| key.eq_ignore_ascii_case(param) && is_digits(value))
            .map(|(_, value)| value.clone())
    })
}

/// Cleans an identifier that went through a numeric round-trip (`"1234.0"`).
pub fn normalize_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    is_digits(trimmed).then(|| trimmed.to_string())
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Identifiers already visited, per record kind.
#[derive(Debug, Clone, Default)]
pub struct SeenIds {
    seen: HashMap<RecordKind, HashSet<String>>,
}

impl SeenIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `id`; returns false when it was already present.
    pub fn insert(&mut self, kind: RecordKind, id: &str) -> bool {
        self.seen.entry(kind).or_default().insert(id.to_string())
    }

    pub fn contains(&self, kind: RecordKind, id: &str) -> bool {
        self.seen.get(&kind).is_some_and(|ids| ids.contains(id))
    }

    pub fn count(&self, kind: RecordKind) -> usize {
        self.seen.get(&kind).map_or(0, HashSet::len)
    }
}
