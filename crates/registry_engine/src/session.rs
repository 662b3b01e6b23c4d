use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use registry_logging::{abbreviate, registry_debug, registry_info, registry_warn};
use reqwest::cookie::Jar;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE,
    UPGRADE_INSECURE_REQUESTS,
};
use url::Url;

use crate::decode::decode_html;
use crate::form_state::FormTokens;
use crate::{Document, FailureKind, TransportError};

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
            user_agent: "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0"
                .to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                .to_string(),
            accept_language: "en-US,en;q=0.5".to_string(),
        }
    }
}

/// One continuous browser-like session against a WebForms site.
///
/// Owns the cookie jar and the current token triple. Every successful
/// [`fetch`](Self::fetch) or [`submit`](Self::submit) refreshes the triple from
/// the returned page; failures leave it untouched. Calls take `&mut self`, so a
/// session is driven strictly one request at a time.
pub struct FormSession {
    settings: SessionSettings,
    client: reqwest::Client,
    tokens: FormTokens,
}

impl FormSession {
    pub fn new(settings: SessionSettings) -> Result<Self, TransportError> {
        let client = build_client(&settings)?;
        Ok(Self {
            settings,
            client,
            tokens: FormTokens::new(),
        })
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn tokens(&self) -> &FormTokens {
        &self.tokens
    }

    /// GET `url` with optional query `params` appended.
    pub async fn fetch(
        &mut self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<Document, TransportError> {
        let mut target = parse_url(url)?;
        if !params.is_empty() {
            target.query_pairs_mut().extend_pairs(params);
        }
        registry_debug!("GET {}", target);

        let result = match self.client.get(target.clone()).send().await {
            Ok(response) => self.read_document(response).await,
            Err(err) => Err(map_reqwest_error(err)),
        };
        let document = result.map_err(|err| report("GET", &target, err))?;
        self.capture_tokens(&document);
        Ok(document)
    }

    /// POST `fields` plus the held tokens as a urlencoded form.
    ///
    /// `extra_headers` replace same-named defaults, including `Content-Type`.
    pub async fn submit(
        &mut self,
        url: &str,
        fields: &[(String, String)],
        extra_headers: &[(String, String)],
    ) -> Result<Document, TransportError> {
        let target = parse_url(url)?;
        let headers = form_headers(extra_headers)?;
        let merged = self.tokens.apply(fields);
        registry_debug!(
            "POST {} with {} fields (view state {})",
            target,
            merged.len(),
            abbreviate(self.tokens.view_state().unwrap_or("none"), 24)
        );
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&merged)
            .finish();

        let sent = self
            .client
            .post(target.clone())
            .headers(headers)
            .body(body)
            .send()
            .await;
        let result = match sent {
            Ok(response) => self.read_document(response).await,
            Err(err) => Err(map_reqwest_error(err)),
        };
        let document = result.map_err(|err| report("POST", &target, err))?;
        self.capture_tokens(&document);
        Ok(document)
    }

    /// Drops cookies and tokens by starting over with a fresh client.
    ///
    /// On error the previous identity is kept.
    pub fn reset(&mut self) -> Result<(), TransportError> {
        self.client = build_client(&self.settings)?;
        self.tokens.clear();
        registry_info!("Session reset");
        Ok(())
    }

    fn capture_tokens(&mut self, document: &Document) {
        let found = self.tokens.absorb(document.html());
        registry_debug!("Captured {} of 3 form tokens from {}", found, document.url());
    }

    async fn read_document(
        &self,
        response: reqwest::Response,
    ) -> Result<Document, TransportError> {
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let max_bytes = self.settings.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, content_len));
            }
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        if let Some(ct) = content_type.as_deref() {
            if !self.is_content_type_allowed(ct) {
                return Err(TransportError::new(
                    FailureKind::UnsupportedContentType {
                        content_type: ct.to_string(),
                    },
                    "unsupported content type",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, next_len));
            }
            bytes.extend_from_slice(&chunk);
        }

        let decoded = decode_html(&bytes, content_type.as_deref());
        if decoded.had_errors {
            registry_warn!(
                "Body of {} had invalid {} sequences; replaced",
                final_url,
                decoded.encoding_label
            );
        }
        Ok(Document::parse(final_url, &decoded.html))
    }

    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let ct = content_type.split(';').next().unwrap_or(content_type).trim();
        self.settings
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }
}

fn build_client(settings: &SessionSettings) -> Result<reqwest::Client, TransportError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, header_value(&settings.accept)?);
    headers.insert(ACCEPT_LANGUAGE, header_value(&settings.accept_language)?);
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

    reqwest::Client::builder()
        .user_agent(settings.user_agent.as_str())
        .default_headers(headers)
        .cookie_provider(Arc::new(Jar::default()))
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
        .build()
        .map_err(|err| TransportError::new(FailureKind::Network, err.to_string()))
}

fn form_headers(extra_headers: &[(String, String)]) -> Result<HeaderMap, TransportError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
    for (name, value) in extra_headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| TransportError::new(FailureKind::InvalidHeader, err.to_string()))?;
        headers.insert(name, header_value(value)?);
    }
    Ok(headers)
}

fn header_value(value: &str) -> Result<HeaderValue, TransportError> {
    HeaderValue::from_str(value)
        .map_err(|err| TransportError::new(FailureKind::InvalidHeader, err.to_string()))
}

fn parse_url(url: &str) -> Result<Url, TransportError> {
    Url::parse(url).map_err(|err| TransportError::new(FailureKind::InvalidUrl, err.to_string()))
}

fn too_large(max_bytes: u64, actual: u64) -> TransportError {
    TransportError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "response too large",
    )
}

fn report(method: &str, url: &Url, err: TransportError) -> TransportError {
    registry_warn!("{} {} failed: {}", method, url, err);
    err
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return TransportError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    TransportError::new(FailureKind::Network, err.to_string())
}
