//! Link targets found in registry pages: plain hrefs and WebForms postbacks.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

pub const EVENT_TARGET: &str = "__EVENTTARGET";
pub const EVENT_ARGUMENT: &str = "__EVENTARGUMENT";

static RE_POSTBACK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"__doPostBack\(\s*['"]([^'"]*)['"]\s*,\s*['"]([^'"]*)['"]\s*\)"#)
        .expect("invalid regex: postback")
});

/// Resolves an href against the page it was found on.
///
/// Only http(s) targets are returned; `javascript:`, `mailto:` and bare
/// fragments yield `None`.
pub fn resolve_link(reference: &str, base: &Url) -> Option<Url> {
    let trimmed = reference.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let url = base.join(trimmed).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// A `javascript:__doPostBack('target','argument')` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostBack {
    pub target: String,
    pub argument: String,
}

impl PostBack {
    /// Form fields that trigger this postback when submitted.
    pub fn fields(&self) -> Vec<(String, String)> {
        vec![
            (EVENT_TARGET.to_string(), self.target.clone()),
            (EVENT_ARGUMENT.to_string(), self.argument.clone()),
        ]
    }
}

pub fn parse_postback(href: &str) -> Option<PostBack> {
    let captures = RE_POSTBACK.captures(href)?;
    Some(PostBack {
        target: captures[1].to_string(),
        argument: captures[2].to_string(),
    })
}

/// How to reach the page a pager link points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    Get(Url),
    /// Submit the postback fields to the page the link was on.
    PostBack { url: Url, postback: PostBack },
}

pub fn next_page_request(link: &str, current: &Url) -> Option<NextPage> {
    if let Some(postback) = parse_postback(link) {
        return Some(NextPage::PostBack {
            url: current.clone(),
            postback,
        });
    }
    resolve_link(link, current).map(NextPage::Get)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postback_arguments_are_captured() {
        let postback =
            parse_postback("javascript:__doPostBack('ctl00$MainContent$gv','Page$3')").unwrap();
        assert_eq!(postback.target, "ctl00$MainContent$gv");
        assert_eq!(postback.argument, "Page$3");
    }

    #[test]
    fn javascript_links_do_not_resolve() {
        let base = Url::parse("https://example.org/DB/Dog_Search").unwrap();
        assert_eq!(resolve_link("javascript:void(0)", &base), None);
        assert_eq!(resolve_link("#top", &base), None);
        assert_eq!(
            resolve_link("Dog_Search?page=2", &base).map(String::from),
            Some("https://example.org/DB/Dog_Search?page=2".to_string())
        );
    }
}
