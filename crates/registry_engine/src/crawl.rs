//! Search and detail traversal over one session.
//!
//! The session itself never retries; this is where pacing, retries and
//! stale-session recovery live.

use std::collections::HashSet;
use std::time::Duration;

use registry_core::{
    dedupe_rows, extract_id, normalize_id, Record, RecordKind, SearchQuery, SearchTarget, SeenIds,
    SiteConfig,
};
use registry_logging::{registry_debug, registry_info, registry_warn};
use url::Url;

use crate::extract::{
    extract_dog_record, extract_grid_records, extract_image_refs, extract_litter_detail,
    extract_pagination, extract_person_record,
};
use crate::links::{next_page_request, NextPage};
use crate::{Document, FailureKind, FormSession, TransportError};

/// Anything that can serve registry pages the way [`FormSession`] does.
#[async_trait::async_trait(?Send)]
pub trait PageSource {
    async fn fetch(
        &mut self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<Document, TransportError>;

    async fn submit(
        &mut self,
        url: &str,
        fields: &[(String, String)],
        extra_headers: &[(String, String)],
    ) -> Result<Document, TransportError>;

    fn reset(&mut self) -> Result<(), TransportError>;
}

#[async_trait::async_trait(?Send)]
impl PageSource for FormSession {
    async fn fetch(
        &mut self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<Document, TransportError> {
        FormSession::fetch(self, url, params).await
    }

    async fn submit(
        &mut self,
        url: &str,
        fields: &[(String, String)],
        extra_headers: &[(String, String)],
    ) -> Result<Document, TransportError> {
        FormSession::submit(self, url, fields, extra_headers).await
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        FormSession::reset(self)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("session went stale: asked for {requested}, got {landed}")]
    StaleSession { requested: String, landed: String },
}

/// True when the server bounced us: a redirect page, or a different path
/// than the one requested.
pub fn looks_stale(requested: &Url, document: &Document) -> bool {
    let redirected = document
        .title()
        .is_some_and(|title| title.to_lowercase().contains("redirect"));
    redirected || !requested.path().eq_ignore_ascii_case(document.url().path())
}

/// Drives a [`PageSource`] through searches, result pages and detail pages.
pub struct Crawler<S> {
    source: S,
    site: SiteConfig,
    seen: SeenIds,
    requests: u64,
}

impl<S: PageSource> Crawler<S> {
    pub fn new(source: S, site: SiteConfig) -> Self {
        Self {
            source,
            site,
            seen: SeenIds::new(),
            requests: 0,
        }
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    pub fn seen(&self) -> &SeenIds {
        &self.seen
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Runs one search and returns every result row across its pages,
    /// exact duplicates removed.
    ///
    /// Transport failures restart the whole search after the retry delay;
    /// a stale session is reset once and the search started over.
    pub async fn search(&mut self, query: &SearchQuery) -> Result<Vec<Record>, CrawlError> {
        registry_info!("Searching {}", query.describe());
        let mut recovery = Recovery::default();
        loop {
            match self.search_once(query).await {
                Ok(rows) => {
                    let rows = dedupe_rows(rows);
                    registry_info!("{}: {} rows", query.describe(), rows.len());
                    return Ok(rows);
                }
                Err(err) => self.recover(err, &mut recovery).await?,
            }
        }
    }

    /// Reads every results page starting at `first`, following the pager.
    ///
    /// Stops at the page cap, on a missing or unusable next link, or when
    /// the same link comes back for the same page number.
    pub async fn collect_pages(&mut self, first: Document) -> Result<Vec<Record>, CrawlError> {
        let mut rows = Vec::new();
        let mut followed = HashSet::new();
        let mut page = first;
        let mut pages = 0u32;

        loop {
            pages += 1;
            let batch = extract_grid_records(page.html());
            let cursor = extract_pagination(page.html());
            registry_info!(
                "Page {} of {} at {}: {} rows",
                cursor.current_page,
                cursor.total_pages,
                page.url(),
                batch.len()
            );
            rows.extend(batch);

            if pages >= self.site.max_pages {
                registry_warn!("Stopping after {} pages", pages);
                break;
            }
            let Some(link) = cursor.next_page_link.filter(|_| cursor.has_next) else {
                break;
            };
            if !followed.insert((link.clone(), cursor.current_page)) {
                registry_warn!("Pager repeated {} on page {}; stopping", link, cursor.current_page);
                break;
            }
            let Some(request) = next_page_request(&link, page.url()) else {
                registry_debug!("Next link {} is not followable", link);
                break;
            };

            page = match request {
                NextPage::Get(url) => self.get(&url).await?,
                NextPage::PostBack { url, postback } => {
                    self.post(&url, &postback.fields()).await?
                }
            };
        }
        Ok(rows)
    }

    /// Detail record behind a result link, tagged with its `bg_*_id`.
    ///
    /// Returns `None` when the link's id was already fetched.
    pub async fn detail(
        &mut self,
        kind: RecordKind,
        link: &str,
    ) -> Result<Option<Record>, CrawlError> {
        let id = extract_id(link).and_then(|id| normalize_id(&id));
        if let Some(id) = id.as_deref() {
            if self.seen.contains(kind, id) {
                registry_debug!("Skipping already fetched {:?} {}", kind, id);
                return Ok(None);
            }
        }

        let url = parse_site_url(&self.site.absolute_url(link))?;
        let mut recovery = Recovery::default();
        let document = loop {
            match self.detail_once(kind, &url, recovery.reset_done).await {
                Ok(document) => break document,
                Err(err) => self.recover(err, &mut recovery).await?,
            }
        };

        let mut record = detail_record(kind, &document);
        if let Some(id) = id {
            self.seen.insert(kind, &id);
            record.insert(kind.id_field().to_string(), id);
        }
        Ok(Some(record))
    }

    pub async fn detail_by_id(
        &mut self,
        kind: RecordKind,
        id: &str,
    ) -> Result<Option<Record>, CrawlError> {
        let link = self.site.detail_url(kind, id.trim());
        self.detail(kind, &link).await
    }

    async fn search_once(&mut self, query: &SearchQuery) -> Result<Vec<Record>, CrawlError> {
        let url = parse_site_url(&self.site.search_url(query.target()))?;
        self.get(&url).await?;
        let results = self.post(&url, &query.form_fields()).await?;
        self.collect_pages(results).await
    }

    async fn detail_once(
        &mut self,
        kind: RecordKind,
        url: &Url,
        prime: bool,
    ) -> Result<Document, CrawlError> {
        if prime {
            let start = parse_site_url(&self.site.search_url(SearchTarget::for_kind(kind)))?;
            self.get(&start).await?;
        }
        self.get(url).await
    }

    async fn get(&mut self, url: &Url) -> Result<Document, CrawlError> {
        self.pace().await;
        let document = self.source.fetch(url.as_str(), &[]).await?;
        ensure_fresh(url, document)
    }

    async fn post(&mut self, url: &Url, fields: &[(String, String)]) -> Result<Document, CrawlError> {
        self.pace().await;
        let document = self.source.submit(url.as_str(), fields, &[]).await?;
        ensure_fresh(url, document)
    }

    /// Fixed delay before every request except the first.
    async fn pace(&mut self) {
        if self.requests > 0 && self.site.request_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.site.request_delay_ms)).await;
        }
        self.requests += 1;
    }

    /// Decides whether a failed attempt gets another go, and prepares it.
    async fn recover(&mut self, err: CrawlError, recovery: &mut Recovery) -> Result<(), CrawlError> {
        match err {
            CrawlError::StaleSession { .. } if !recovery.reset_done => {
                registry_warn!("{}; resetting session", err);
                self.source.reset()?;
                recovery.reset_done = true;
                Ok(())
            }
            CrawlError::Transport(ref transport)
                if retryable(transport) && recovery.retries < self.site.max_retries =>
            {
                recovery.retries += 1;
                registry_warn!(
                    "{}; retry {} of {} in {} ms",
                    err,
                    recovery.retries,
                    self.site.max_retries,
                    self.site.retry_delay_ms
                );
                tokio::time::sleep(Duration::from_millis(self.site.retry_delay_ms)).await;
                Ok(())
            }
            err => Err(err),
        }
    }
}

#[derive(Debug, Default)]
struct Recovery {
    retries: u32,
    reset_done: bool,
}

fn retryable(err: &TransportError) -> bool {
    !matches!(
        err.kind,
        FailureKind::InvalidUrl | FailureKind::InvalidHeader
    )
}

fn ensure_fresh(requested: &Url, document: Document) -> Result<Document, CrawlError> {
    if looks_stale(requested, &document) {
        return Err(CrawlError::StaleSession {
            requested: requested.to_string(),
            landed: document.url().to_string(),
        });
    }
    Ok(document)
}

fn parse_site_url(url: &str) -> Result<Url, CrawlError> {
    Url::parse(url).map_err(|err| {
        CrawlError::Transport(TransportError::new(FailureKind::InvalidUrl, err.to_string()))
    })
}

fn detail_record(kind: RecordKind, document: &Document) -> Record {
    let html = document.html();
    match kind {
        RecordKind::Dog => {
            let mut record = extract_dog_record(html);
            let images: Vec<String> = extract_image_refs(html)
                .into_iter()
                .map(|image| image.url)
                .collect();
            if !images.is_empty() {
                record.insert("image_urls".to_string(), images.join(";"));
            }
            record
        }
        RecordKind::Person => extract_person_record(html),
        RecordKind::Litter => {
            let litter = extract_litter_detail(html);
            let mut record = litter.record;
            let puppy_ids: Vec<String> = litter
                .puppies
                .iter()
                .filter_map(|puppy| extract_id(&puppy.link))
                .collect();
            if !puppy_ids.is_empty() {
                record.insert("puppy_ids".to_string(), puppy_ids.join(";"));
            }
            record
        }
    }
}
