//! Registry engine: session handling, page decoding, record extraction and
//! crawl orchestration.
mod crawl;
mod decode;
mod extract;
mod form_state;
mod links;
mod session;
mod types;

pub use crawl::{looks_stale, CrawlError, Crawler, PageSource};
pub use decode::{decode_html, DecodedHtml};
pub use extract::{
    extract_certifications, extract_detail_record, extract_dog_record, extract_grid_records,
    extract_image_refs, extract_litter_detail, extract_pagination, extract_person_record,
    normalize_key, table_records, Certification, DetailStrategy, ImageKind, ImageRef,
    LitterDetail, NamedLink, DETAIL_STRATEGIES, HEALTH_KEYWORDS,
};
pub use form_state::{
    FormTokens, EVENT_VALIDATION, TOKEN_FIELDS, VIEW_STATE, VIEW_STATE_GENERATOR,
};
pub use links::{
    next_page_request, parse_postback, resolve_link, NextPage, PostBack, EVENT_ARGUMENT,
    EVENT_TARGET,
};
pub use registry_core::Record;
pub use session::{FormSession, SessionSettings, FORM_CONTENT_TYPE};
pub use types::{Document, FailureKind, PaginationCursor, TransportError};
