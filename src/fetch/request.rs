//! Resubmission request building.
//!
//! A resubmission replays the captured browser request: the same URL, the
//! captured headers (cookies and authorization included), and the form body.

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;

use crate::config::{is_skipped_replay_header, MARKER_HEADER_NAME, MARKER_HEADER_VALUE, NO_CACHE_HEADERS};
use crate::models::{HeaderEntry, RetryObject};

/// A request to (re)submit.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub method: Method,
    pub headers: Vec<HeaderEntry>,
    pub form: Vec<(String, String)>,
}

impl FetchRequest {
    /// Builds the POST that replays a queued booking.
    pub fn from_retry_object(item: &RetryObject) -> Self {
        FetchRequest {
            url: item.request_url.clone(),
            method: Method::POST,
            headers: item.headers_cache.clone(),
            form: item.form_pairs(),
        }
    }

    /// Tags the request so the capture layer does not treat it as a new booking.
    pub fn mark_self_originated(mut self) -> Self {
        self.headers
            .retain(|h| !h.name.eq_ignore_ascii_case(MARKER_HEADER_NAME));
        self.headers
            .push(HeaderEntry::new(MARKER_HEADER_NAME, MARKER_HEADER_VALUE));
        self
    }

    /// Applies headers and body to a `reqwest::RequestBuilder`.
    ///
    /// Captured headers that cannot be represented are skipped with a debug log,
    /// as are framing and cache headers; the no-cache set is always added.
    pub(crate) fn apply_to_request_builder(
        &self,
        mut builder: reqwest::RequestBuilder,
    ) -> reqwest::RequestBuilder {
        for entry in &self.headers {
            if is_skipped_replay_header(&entry.name) {
                continue;
            }
            match (
                HeaderName::from_bytes(entry.name.as_bytes()),
                HeaderValue::from_str(&entry.value),
            ) {
                (Ok(name), Ok(value)) => builder = builder.header(name, value),
                _ => log::debug!("Skipping unrepresentable captured header {}", entry.name),
            }
        }
        for (name, value) in NO_CACHE_HEADERS {
            builder = builder.header(*name, *value);
        }
        if !self.form.is_empty() {
            builder = builder.form(&self.form);
        }
        builder
    }
}
