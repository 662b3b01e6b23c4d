use serde::{Deserialize, Serialize};
use url::Url;

use crate::RecordKind;

/// Which search form a query is submitted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchTarget {
    Dogs,
    People,
    Litters,
}

impl SearchTarget {
    pub fn for_kind(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Dog => SearchTarget::Dogs,
            RecordKind::Person => SearchTarget::People,
            RecordKind::Litter => SearchTarget::Litters,
        }
    }

    /// Kind of record the result grid links to.
    pub fn record_kind(self) -> RecordKind {
        match self {
            SearchTarget::Dogs => RecordKind::Dog,
            SearchTarget::People => RecordKind::Person,
            SearchTarget::Litters => RecordKind::Litter,
        }
    }
}

/// Where the registry lives and how politely to talk to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    pub dog_search_path: String,
    pub people_search_path: String,
    pub litter_search_path: String,
    pub dog_detail_path: String,
    pub person_detail_path: String,
    pub litter_detail_path: String,
    /// Fixed pause before every request after the first.
    pub request_delay_ms: u64,
    /// Extra attempts after a transport failure.
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// Upper bound on result pages followed per search.
    pub max_pages: u32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://bernergarde.org".to_string(),
            dog_search_path: "/DB/Dog_Search".to_string(),
            people_search_path: "/DB/People_Search".to_string(),
            litter_search_path: "/DB/Litter_Search".to_string(),
            dog_detail_path: "/DB/Dog_Detail".to_string(),
            person_detail_path: "/DB/People_Detail".to_string(),
            litter_detail_path: "/DB/Litter_Detail".to_string(),
            request_delay_ms: 2_000,
            max_retries: 3,
            retry_delay_ms: 5_000,
            max_pages: 200,
        }
    }
}

impl SiteConfig {
    /// Absolute URL of the search form for `target`.
    pub fn search_url(&self, target: SearchTarget) -> String {
        let path = match target {
            SearchTarget::Dogs => &self.dog_search_path,
            SearchTarget::People => &self.people_search_path,
            SearchTarget::Litters => &self.litter_search_path,
        };
        self.join(path)
    }

    /// Absolute URL of the detail page for the record `id` of `kind`.
    pub fn detail_url(&self, kind: RecordKind, id: &str) -> String {
        let path = match kind {
            RecordKind::Dog => &self.dog_detail_path,
            RecordKind::Person => &self.person_detail_path,
            RecordKind::Litter => &self.litter_detail_path,
        };
        format!("{}?{}={}", self.join(path), kind.detail_param(), id)
    }

    /// Resolves `reference` (absolute, root-relative or relative) the way a
    /// link on one of the search pages would be.
    ///
    /// Falls back to plain concatenation when the base URL itself does not parse.
    pub fn absolute_url(&self, reference: &str) -> String {
        let trimmed = reference.trim();
        if let Ok(url) = Url::parse(trimmed) {
            return url.into();
        }
        let page = self.search_url(SearchTarget::Dogs);
        match Url::parse(&page).and_then(|base| base.join(trimmed)) {
            Ok(url) => url.into(),
            Err(_) => format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                trimmed.trim_start_matches('/')
            ),
        }
    }

    fn join(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
