use serde::{Deserialize, Serialize};

use crate::SearchTarget;

pub const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub const US_STATES: [&str; 51] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ",
    "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT",
    "VA", "WA", "WV", "WI", "WY", "DC",
];

pub const CANADIAN_PROVINCES: [&str; 13] = [
    "AB", "BC", "MB", "NB", "NL", "NS", "NT", "NU", "ON", "PE", "QC", "SK", "YT",
];

const STATE_FIELD: &str = "ctl00$MainContent$ddl_StateProv";
const LAST_NAME_FIELD: &str = "ctl00$MainContent$tb_LastName";
const LAST_NAME_MODE_FIELD: &str = "ctl00$MainContent$rbl_LN_BeginContain";
const BEGINS_WITH: &str = "B";
const DOG_BREEDER_FIELD: &str = "ctl00$MainContent$tb_Breeder";
const KENNEL_FIELD: &str = "ctl00$MainContent$tb_Kennel";
const YEAR_FIELD: &str = "ctl00$MainContent$ddl_Year";
const LITTER_BREEDER_FIELD: &str = "ctl00$MainContent$tb_BreederName";
const SUBMIT_FIELD: &str = "ctl00$MainContent$btn_SubmitSearch";
const SUBMIT_VALUE: &str = "Submit Search";

/// One search the registry's WebForms pages understand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchQuery {
    PeopleByState(String),
    /// Last names beginning with the given text.
    PeopleByLastName(String),
    DogsByBreeder(String),
    DogsByKennel(String),
    LittersByYear(u16),
    LittersByBreeder(String),
}

impl SearchQuery {
    pub fn target(&self) -> SearchTarget {
        match self {
            SearchQuery::PeopleByState(_) | SearchQuery::PeopleByLastName(_) => {
                SearchTarget::People
            }
            SearchQuery::DogsByBreeder(_) | SearchQuery::DogsByKennel(_) => SearchTarget::Dogs,
            SearchQuery::LittersByYear(_) | SearchQuery::LittersByBreeder(_) => {
                SearchTarget::Litters
            }
        }
    }

    /// Form controls to post, without the view-state fields.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = match self {
            // The state dropdown values are padded to four characters ("CO  ").
            SearchQuery::PeopleByState(state) => {
                vec![field(STATE_FIELD, &format!("{:<4}", state.trim()))]
            }
            SearchQuery::PeopleByLastName(prefix) => vec![
                field(LAST_NAME_FIELD, prefix.trim()),
                field(LAST_NAME_MODE_FIELD, BEGINS_WITH),
            ],
            SearchQuery::DogsByBreeder(name) => vec![field(DOG_BREEDER_FIELD, name.trim())],
            SearchQuery::DogsByKennel(name) => vec![field(KENNEL_FIELD, name.trim())],
            SearchQuery::LittersByYear(year) => vec![field(YEAR_FIELD, &year.to_string())],
            SearchQuery::LittersByBreeder(name) => {
                vec![field(LITTER_BREEDER_FIELD, name.trim())]
            }
        };
        fields.push(field(SUBMIT_FIELD, SUBMIT_VALUE));
        fields
    }

    /// Short human-readable description for logs.
    pub fn describe(&self) -> String {
        match self {
            SearchQuery::PeopleByState(state) => format!("people in {}", state.trim()),
            SearchQuery::PeopleByLastName(prefix) => {
                format!("people with last name '{}*'", prefix.trim())
            }
            SearchQuery::DogsByBreeder(name) => format!("dogs bred by '{}'", name.trim()),
            SearchQuery::DogsByKennel(name) => format!("dogs of kennel '{}'", name.trim()),
            SearchQuery::LittersByYear(year) => format!("litters born {year}"),
            SearchQuery::LittersByBreeder(name) => format!("litters bred by '{}'", name.trim()),
        }
    }

    /// People searches over every US state and Canadian province.
    pub fn people_by_region() -> Vec<SearchQuery> {
        US_STATES
            .iter()
            .chain(CANADIAN_PROVINCES.iter())
            .map(|code| SearchQuery::PeopleByState((*code).to_string()))
            .collect()
    }

    /// People searches over each last-name initial in `letters`.
    pub fn people_by_initial(letters: &str) -> Vec<SearchQuery> {
        letters
            .chars()
            .filter(|c| c.is_alphabetic())
            .map(|c| SearchQuery::PeopleByLastName(c.to_string()))
            .collect()
    }
}

fn field(name: &str, value: &str) -> (String, String) {
    (name.to_string(), value.to_string())
}
