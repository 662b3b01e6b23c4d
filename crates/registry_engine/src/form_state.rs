//! The WebForms continuation token triple.
//!
//! Every page of the registry carries three hidden inputs that the server
//! expects back on the next postback. [`FormTokens`] holds the latest value of
//! each and merges them into outgoing form bodies.

use scraper::Html;

use crate::extract::dom;

pub const VIEW_STATE: &str = "__VIEWSTATE";
pub const VIEW_STATE_GENERATOR: &str = "__VIEWSTATEGENERATOR";
pub const EVENT_VALIDATION: &str = "__EVENTVALIDATION";

pub const TOKEN_FIELDS: [&str; 3] = [VIEW_STATE, VIEW_STATE_GENERATOR, EVENT_VALIDATION];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormTokens {
    view_state: Option<String>,
    generator: Option<String>,
    event_validation: Option<String>,
}

impl FormTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view_state(&self) -> Option<&str> {
        self.view_state.as_deref()
    }

    pub fn generator(&self) -> Option<&str> {
        self.generator.as_deref()
    }

    pub fn event_validation(&self) -> Option<&str> {
        self.event_validation.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        match name {
            VIEW_STATE => self.view_state(),
            VIEW_STATE_GENERATOR => self.generator(),
            EVENT_VALIDATION => self.event_validation(),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.view_state.is_none() && self.generator.is_none() && self.event_validation.is_none()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Overwrites each token the page defines; tokens the page omits keep their value.
    ///
    /// Only `type="hidden"` inputs count, and the first one of each name wins.
    /// An input without a `value` attribute counts as present with an empty value.
    /// Returns how many of the three fields the page defined.
    pub fn absorb(&mut self, html: &Html) -> usize {
        let mut seen: Vec<&str> = Vec::with_capacity(TOKEN_FIELDS.len());
        let hidden = html.select(&dom::NAMED_INPUT).filter(|input| {
            input
                .value()
                .attr("type")
                .is_some_and(|kind| kind.trim().eq_ignore_ascii_case("hidden"))
        });
        for input in hidden {
            let Some(name) = input.value().attr("name") else {
                continue;
            };
            if seen.contains(&name) {
                continue;
            }
            let slot = match name {
                VIEW_STATE => &mut self.view_state,
                VIEW_STATE_GENERATOR => &mut self.generator,
                EVENT_VALIDATION => &mut self.event_validation,
                _ => continue,
            };
            *slot = Some(input.value().attr("value").unwrap_or_default().to_string());
            seen.push(name);
        }
        seen.len()
    }

    /// Token pairs to replay; empty values are not sent.
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        TOKEN_FIELDS
            .iter()
            .filter_map(|name| {
                self.get(name)
                    .filter(|value| !value.is_empty())
                    .map(|value| (*name, value))
            })
            .collect()
    }

    /// Caller fields with the held tokens applied on top.
    ///
    /// A caller field sharing a token's name is replaced in place; remaining
    /// tokens are appended in [`TOKEN_FIELDS`] order.
    pub fn apply(&self, fields: &[(String, String)]) -> Vec<(String, String)> {
        let tokens = self.pairs();
        let mut merged: Vec<(String, String)> = fields
            .iter()
            .map(|(name, value)| {
                let value = tokens
                    .iter()
                    .find(|(token, _)| token == name)
                    .map_or_else(|| value.clone(), |(_, token_value)| token_value.to_string());
                (name.clone(), value)
            })
            .collect();
        for (name, value) in tokens {
            if !merged.iter().any(|(existing, _)| existing == name) {
                merged.push((name.to_string(), value.to_string()));
            }
        }
        merged
    }
}
