//! Fetch failure categorization.
//!
//! Maps HTTP statuses, response bodies and `reqwest` errors onto
//! [`FetchErrorKind`] and decides which failures are worth another attempt.

use super::types::FetchErrorKind;
use crate::config::RETRYABLE_STATUSES;
use crate::fetch::is_html_error_page;

/// Returns true when the status is on the transport retry allow-list
/// (502, 503, 504, 408, 429).
pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Categorizes a non-success HTTP response.
///
/// An HTML error page wins over the status code; otherwise 5xx is a server
/// error and everything else a client error.
pub fn classify_http_failure(status: u16, body: &str) -> FetchErrorKind {
    if is_html_error_page(body) {
        FetchErrorKind::HtmlError
    } else if status >= 500 {
        FetchErrorKind::ServerError
    } else {
        FetchErrorKind::ClientError
    }
}

/// Short description of a transport-level `reqwest::Error`, for status messages.
pub fn describe_reqwest_error(error: &reqwest::Error) -> &'static str {
    if error.is_timeout() {
        "request timed out"
    } else if error.is_connect() {
        "connection failed"
    } else if error.is_body() {
        "response body could not be read"
    } else if error.is_decode() {
        "response body could not be decoded"
    } else if error.is_redirect() {
        "too many redirects"
    } else if error.is_builder() {
        "request could not be built"
    } else if error.is_request() {
        "request could not be sent"
    } else {
        "network error"
    }
}
