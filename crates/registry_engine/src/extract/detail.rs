use registry_core::Record;
use scraper::{ElementRef, Html};

use super::dom;
use super::normalize::normalize_key;

/// Substrings that mark a health clearance label.
pub const HEALTH_KEYWORDS: [&str; 8] = [
    "hip", "elbow", "eye", "heart", "thyroid", "ofa", "pennhip", "cerf",
];

const PEDIGREE_LABELS: [&str; 4] = ["sire", "dam", "grandsire", "granddam"];

/// Role label prefix and the key it is stored under.
const ROLE_LABELS: [(&str, &str); 3] = [
    ("breeder", "breeder"),
    ("owner", "owner"),
    ("co-owner", "co_owner"),
];

/// Class fragments of label elements in label/value layouts (`gridlbl` on dog pages).
const LABEL_MARKERS: [&str; 4] = ["label", "field-name", "fieldname", "gridlbl"];

/// Values the site prints for "nothing here".
const PLACEHOLDER_VALUES: [&str; 3] = ["n/a", "none", "-"];

/// One self-contained way of reading label/value pairs off a detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailStrategy {
    /// `<dt>` / `<dd>` pairs.
    DefinitionList,
    /// Rows whose first cell is a label and second cell the value.
    TwoColumnTable,
    /// A class-marked label element followed by its value sibling.
    ClassMarkedPair,
}

/// Running order; a later strategy overwrites keys set by an earlier one.
pub const DETAIL_STRATEGIES: [DetailStrategy; 3] = [
    DetailStrategy::DefinitionList,
    DetailStrategy::TwoColumnTable,
    DetailStrategy::ClassMarkedPair,
];

impl DetailStrategy {
    pub fn extract(self, html: &Html) -> Record {
        match self {
            DetailStrategy::DefinitionList => definition_list_pairs(html),
            DetailStrategy::TwoColumnTable => two_column_pairs(html),
            DetailStrategy::ClassMarkedPair => class_marked_pairs(html),
        }
    }
}

/// Key/value record of a detail page.
///
/// Runs [`DETAIL_STRATEGIES`] in order, last writer wins, then layers the
/// health, pedigree and role heuristics on top.
pub fn extract_detail_record(html: &Html) -> Record {
    let mut record = Record::new();
    for strategy in DETAIL_STRATEGIES {
        record.extend(strategy.extract(html));
    }
    record.extend(health_fields(html));
    record.extend(pedigree_fields(html));
    record.extend(role_fields(html));
    record
}

fn definition_list_pairs(html: &Html) -> Record {
    let mut record = Record::new();
    for dl in html.select(&dom::DL) {
        let terms = dl.select(&dom::DT);
        let descriptions = dl.select(&dom::DD);
        for (term, description) in terms.zip(descriptions) {
            let key = normalize_key(&dom::clean_text(term));
            if key.is_empty() {
                continue;
            }
            insert_with_link(&mut record, &key, description);
        }
    }
    record
}

pub(crate) fn two_column_pairs(html: &Html) -> Record {
    let mut record = Record::new();
    for row in html.select(&dom::TR) {
        let cells = dom::child_cells(row, &["td", "th"]);
        let [label, value, ..] = cells.as_slice() else {
            continue;
        };
        let key = normalize_key(&dom::clean_text(*label));
        if key.is_empty() || dom::clean_text(*value).is_empty() {
            continue;
        }
        insert_with_link(&mut record, &key, *value);
    }
    record
}

fn class_marked_pairs(html: &Html) -> Record {
    let mut record = Record::new();
    let labels = dom::elements(html.root_element()).filter(|el| {
        matches!(el.value().name(), "span" | "label" | "div" | "td")
            && dom::class_matches(*el, &LABEL_MARKERS)
    });
    for label in labels {
        let key = normalize_key(&dom::clean_text(label));
        let Some(value) = dom::next_element_sibling(label) else {
            continue;
        };
        let text = dom::clean_text(value);
        if key.is_empty() || text.is_empty() || is_placeholder(&text) {
            continue;
        }
        insert_with_link(&mut record, &key, value);
    }
    record
}

fn health_fields(html: &Html) -> Record {
    let mut record = Record::new();
    for keyword in HEALTH_KEYWORDS {
        let value = dom::find_label(html, |text| text.contains(keyword))
            .and_then(dom::parent_element)
            .and_then(dom::next_element_sibling)
            .map(dom::clean_text)
            .filter(|value| !value.is_empty());
        if let Some(value) = value {
            record.insert(format!("health_{keyword}"), value);
        }
    }
    record
}

fn pedigree_fields(html: &Html) -> Record {
    let mut record = Record::new();
    for label in PEDIGREE_LABELS {
        read_labeled(html, label, label, &mut record);
    }
    record
}

fn role_fields(html: &Html) -> Record {
    let mut record = Record::new();
    for (label, key) in ROLE_LABELS {
        read_labeled(html, label, key, &mut record);
    }
    record
}

/// Finds text starting with `label` and reads the value after its element:
/// a link in the next sibling, else the sibling's text, else the next link on
/// the page.
pub(crate) fn read_labeled(html: &Html, label: &str, key: &str, record: &mut Record) -> bool {
    let Some(node) = dom::find_label(html, |text| text.starts_with(label)) else {
        return false;
    };
    let Some(parent) = dom::parent_element(node) else {
        return false;
    };

    if let Some(sibling) = dom::next_element_sibling(parent) {
        if dom::first_link(sibling).is_some() || !dom::clean_text(sibling).is_empty() {
            insert_with_link(record, key, sibling);
            return true;
        }
    }

    let following_link = dom::following_elements(html, *parent)
        .find(|el| el.value().name() == "a" && dom::href(*el).is_some());
    match following_link {
        Some(link) => {
            insert_with_link(record, key, link);
            true
        }
        None => false,
    }
}

/// Stores the element's text under `key`, and its first link under `{key}_link`.
pub(crate) fn insert_with_link(record: &mut Record, key: &str, el: ElementRef<'_>) {
    let link = dom::first_link(el);
    let text = match link {
        Some(link) if dom::clean_text(el).is_empty() => dom::clean_text(link),
        _ => dom::clean_text(el),
    };
    if let Some(href) = link.and_then(dom::href) {
        record.insert(format!("{key}_link"), href.to_string());
    }
    record.insert(key.to_string(), text);
}

pub(crate) fn is_placeholder(value: &str) -> bool {
    PLACEHOLDER_VALUES
        .iter()
        .any(|placeholder| value.eq_ignore_ascii_case(placeholder))
}
