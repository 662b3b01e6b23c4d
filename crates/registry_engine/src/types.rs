use std::fmt;

use scraper::Html;
use url::Url;

use crate::extract::dom;

/// A fetched page: where it ended up and its parsed tree.
#[derive(Debug, Clone)]
pub struct Document {
    url: Url,
    html: Html,
}

impl Document {
    pub fn parse(url: Url, source: &str) -> Self {
        Self {
            url,
            html: Html::parse_document(source),
        }
    }

    /// Final URL after redirects.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Trimmed `<title>` text, if the page has a non-empty one.
    pub fn title(&self) -> Option<String> {
        self.html
            .select(&dom::TITLE)
            .next()
            .map(dom::clean_text)
            .filter(|title| !title.is_empty())
    }
}

/// Pagination state read off one results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationCursor {
    pub current_page: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub next_page_link: Option<String>,
}

impl Default for PaginationCursor {
    fn default() -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
            has_next: false,
            next_page_link: None,
        }
    }
}

/// Hard failure talking to the server.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: FailureKind,
    pub message: String,
}

impl TransportError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    InvalidHeader,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::InvalidHeader => write!(f, "invalid header"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
