//! Page-specific readers built on the generic strategies in `detail`.

use std::sync::LazyLock;

use regex::Regex;
use registry_core::{extract_id, Record};
use scraper::{ElementRef, Html};

use super::detail::{extract_detail_record, insert_with_link, is_placeholder, two_column_pairs};
use super::dom;

/// Most puppies read off one litter page.
const MAX_PUPPIES: usize = 20;

/// Header fragments that identify the certifications table.
const CERTIFICATION_HEADERS: [&str; 3] = ["finding", "cert", "tested"];
/// Hip grades, best first.
const HIP_GRADES: [&str; 7] = [
    "excellent",
    "good",
    "fair",
    "borderline",
    "mild",
    "moderate",
    "severe",
];
/// DM results, worst first.
const DM_RESULTS: [&str; 4] = ["affected", "carrier", "clear", "parentage"];

/// Person fields and the label prefixes they appear under, tried in order.
const PERSON_LABELS: [(&str, &[&str]); 13] = [
    ("name", &["name", "full name"]),
    ("first_name", &["first name", "first"]),
    ("last_name", &["last name", "last", "surname"]),
    ("kennel_name", &["kennel", "kennel name"]),
    ("address", &["address", "street"]),
    ("city", &["city"]),
    ("state", &["state", "state/province", "province"]),
    ("country", &["country"]),
    ("zip", &["zip", "postal code", "zip code"]),
    ("phone", &["phone", "telephone", "tel"]),
    ("email", &["email", "e-mail"]),
    ("website", &["website", "web", "url"]),
    ("member", &["member", "membership"]),
];

static RE_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\w.-]+@[\w.-]+\.\w+").expect("invalid regex: email")
});
static RE_PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}").expect("invalid regex: phone")
});
static RE_WEBSITE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://[\w.-]+\.\w+").expect("invalid regex: website")
});

/// A titled link, such as one puppy of a litter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedLink {
    pub name: String,
    pub link: String,
}

/// One row of a dog's health certifications table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Certification {
    pub org: String,
    pub test_type: String,
    pub cert_number: String,
    pub findings: String,
    pub test_date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HealthTest {
    Hip,
    Elbow,
    Heart,
    Eye,
    Dm,
    Dna,
}

impl HealthTest {
    fn classify(test_type: &str) -> Option<Self> {
        let test = test_type.to_lowercase();
        let mentions = |needles: &[&str]| needles.iter().any(|needle| test.contains(needle));
        if mentions(&["hip"]) {
            Some(Self::Hip)
        } else if mentions(&["elbow"]) {
            Some(Self::Elbow)
        } else if mentions(&["heart", "cardiac"]) {
            Some(Self::Heart)
        } else if mentions(&["eye", "cerf", "caer"]) {
            Some(Self::Eye)
        } else if mentions(&["dm", "degenerative", "myelopathy", "sod1"]) {
            Some(Self::Dm)
        } else if mentions(&["dna", "parentage"]) {
            Some(Self::Dna)
        } else {
            None
        }
    }
}

/// A usable certification result, with its cert number folded into `display`.
struct Reading {
    test: HealthTest,
    findings: String,
    display: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LitterDetail {
    pub record: Record,
    pub puppies: Vec<NamedLink>,
}

/// Dog detail page: every key/value strategy and heuristic, the `dogname`
/// header as `registered_name`, and ids behind value links as `{field}_id`.
pub fn extract_dog_record(html: &Html) -> Record {
    let mut record = extract_detail_record(html);
    let dog_name = dom::elements(html.root_element())
        .find(|el| {
            let marked = |attr: &str| {
                el.value()
                    .attr(attr)
                    .is_some_and(|value| value.to_ascii_lowercase().contains("dogname"))
            };
            marked("class") || marked("id")
        })
        .map(dom::clean_text)
        .filter(|name| !name.is_empty());
    if let Some(name) = dog_name {
        record.insert("registered_name".to_string(), name);
    }
    record.extend(certification_fields(&extract_certifications(html)));
    add_link_ids(&mut record);
    record
}

/// Rows of the first innermost table whose headers mention findings, certs or
/// tests.
///
/// Columns are read by position: org, test, cert number, findings, date.
/// Rows with fewer than four cells, no test or no findings are skipped.
pub fn extract_certifications(html: &Html) -> Vec<Certification> {
    let mut innermost = html
        .select(&dom::TABLE)
        .filter(|table| !dom::elements(*table).skip(1).any(|el| el.value().name() == "table"));
    let Some(table) = innermost.find(|table| {
        certification_headers(*table)
            .iter()
            .any(|header| CERTIFICATION_HEADERS.iter().any(|marker| header.contains(marker)))
    }) else {
        return Vec::new();
    };

    dom::own_rows(table)
        .into_iter()
        .filter_map(|row| {
            let cells: Vec<String> = dom::child_cells(row, &["td"])
                .into_iter()
                .map(dom::clean_text)
                .collect();
            let [org, test_type, cert_number, findings, rest @ ..] = cells.as_slice() else {
                return None;
            };
            let header_row = test_type.eq_ignore_ascii_case("tested");
            if test_type.is_empty() || findings.is_empty() || header_row {
                return None;
            }
            Some(Certification {
                org: org.clone(),
                test_type: test_type.clone(),
                cert_number: cert_number.clone(),
                findings: findings.clone(),
                test_date: rest.first().cloned().unwrap_or_default(),
            })
        })
        .collect()
}

/// Lowercased `<th>` texts of the table's own rows, or the first row's cells
/// when there are none. Headers of nested tables never count for the outer one.
fn certification_headers(table: ElementRef<'_>) -> Vec<String> {
    let rows = dom::own_rows(table);
    let mut cells: Vec<ElementRef<'_>> = rows
        .iter()
        .flat_map(|row| dom::child_cells(*row, &["th"]))
        .collect();
    if cells.is_empty() {
        cells = rows
            .first()
            .map(|row| dom::child_cells(*row, &["td"]))
            .unwrap_or_default();
    }
    cells
        .into_iter()
        .map(|cell| dom::clean_text(cell).to_lowercase())
        .collect()
}

/// Health summary fields from certification rows.
///
/// Hips keep the best grade, DM lists every result worst first, heart and
/// eye keep the latest row, elbows and DNA the first.
fn certification_fields(certifications: &[Certification]) -> Record {
    let readings: Vec<Reading> = certifications
        .iter()
        .filter_map(|cert| {
            let findings = cert.findings.trim();
            if findings.is_empty() || is_placeholder(findings) {
                return None;
            }
            let test = HealthTest::classify(&cert.test_type)?;
            let number = cert.cert_number.trim();
            let unnumbered = number.is_empty() || number == "-" || number.eq_ignore_ascii_case("n/a");
            let display = if unnumbered {
                findings.to_string()
            } else {
                format!("{findings} ({number})")
            };
            Some(Reading {
                test,
                findings: findings.to_lowercase(),
                display,
            })
        })
        .collect();

    let mut record = Record::new();
    let mut insert = |key: &str, reading: Option<&&Reading>| {
        if let Some(reading) = reading {
            record.insert(key.to_string(), reading.display.clone());
        }
    };

    let mut hips = readings_of(&readings, HealthTest::Hip);
    hips.sort_by_key(|reading| rank(&reading.findings, &HIP_GRADES));
    insert("hip_rating", hips.first());
    insert("elbow_rating", readings_of(&readings, HealthTest::Elbow).first());
    insert("heart_status", readings_of(&readings, HealthTest::Heart).last());
    insert("eye_status", readings_of(&readings, HealthTest::Eye).last());
    insert("dna_status", readings_of(&readings, HealthTest::Dna).first());

    let mut dm = readings_of(&readings, HealthTest::Dm);
    if !dm.is_empty() {
        dm.sort_by_key(|reading| rank(&reading.findings, &DM_RESULTS));
        let joined: Vec<&str> = dm.iter().map(|reading| reading.display.as_str()).collect();
        record.insert("dm_status".to_string(), joined.join(" | "));
    }
    record
}

fn readings_of(readings: &[Reading], test: HealthTest) -> Vec<&Reading> {
    readings.iter().filter(|reading| reading.test == test).collect()
}

/// Position of the first entry of `order` found in `findings`; unmatched sorts last.
fn rank(findings: &str, order: &[&str]) -> usize {
    order
        .iter()
        .position(|entry| findings.contains(entry))
        .unwrap_or(order.len())
}

/// Person (breeder/owner) detail page.
///
/// Label aliases only fill fields the table rows left empty; the contact
/// patterns are a last resort over the whole page text.
pub fn extract_person_record(html: &Html) -> Record {
    let mut record = two_column_pairs(html);

    for (key, labels) in PERSON_LABELS {
        if record.contains_key(key) {
            continue;
        }
        for label in labels {
            if labeled_sibling(html, label, key, &mut record) {
                break;
            }
        }
    }

    let text = dom::page_text(html);
    let contacts: [(&str, &Regex); 3] = [
        ("email", &*RE_EMAIL),
        ("phone", &*RE_PHONE),
        ("website", &*RE_WEBSITE),
    ];
    for (key, pattern) in contacts {
        if record.contains_key(key) {
            continue;
        }
        if let Some(found) = pattern.find(&text) {
            record.insert(key.to_string(), found.as_str().to_string());
        }
    }

    if !record.contains_key("kennel_name") {
        let kennel = dom::find_label(html, |text| text.contains("kennel"))
            .and_then(dom::parent_element)
            .and_then(dom::next_element_sibling)
            .map(dom::clean_text)
            .filter(|value| !value.is_empty());
        if let Some(kennel) = kennel {
            record.insert("kennel_name".to_string(), kennel);
        }
    }

    add_link_ids(&mut record);
    record
}

/// Litter detail page: table rows plus the puppies listed after a
/// "Puppies"/"Offspring" heading.
pub fn extract_litter_detail(html: &Html) -> LitterDetail {
    let mut record = two_column_pairs(html);
    add_link_ids(&mut record);

    let puppies = puppy_links(html);
    if !puppies.is_empty() {
        record.insert("puppy_count".to_string(), puppies.len().to_string());
    }
    LitterDetail { record, puppies }
}

fn puppy_links(html: &Html) -> Vec<NamedLink> {
    let Some(heading) = dom::find_label(html, |text| {
        text.contains("puppies") || text.contains("offspring")
    }) else {
        return Vec::new();
    };
    let Some(parent) = dom::parent_element(heading) else {
        return Vec::new();
    };
    dom::following_elements(html, *parent)
        .filter(|el| el.value().name() == "a")
        .filter_map(|a| {
            let href = dom::href(a)?;
            href.to_ascii_lowercase().contains("dog").then(|| NamedLink {
                name: dom::clean_text(a),
                link: href.to_string(),
            })
        })
        .take(MAX_PUPPIES)
        .collect()
}

/// Value of the element after the one holding text that starts with `label`.
fn labeled_sibling(html: &Html, label: &str, key: &str, record: &mut Record) -> bool {
    let sibling = dom::find_label(html, |text| text.starts_with(label))
        .and_then(dom::parent_element)
        .and_then(dom::next_element_sibling);
    match sibling {
        Some(sibling) if !dom::clean_text(sibling).is_empty() => {
            insert_with_link(record, key, sibling);
            true
        }
        _ => false,
    }
}

/// Adds `{field}_id` for every `{field}_link` that points at a record.
fn add_link_ids(record: &mut Record) {
    let ids: Vec<(String, String)> = record
        .iter()
        .filter_map(|(key, link)| {
            let field = key.strip_suffix("_link")?;
            let id = extract_id(link)?;
            Some((format!("{field}_id"), id))
        })
        .collect();
    for (key, id) in ids {
        record.entry(key).or_insert(id);
    }
}
