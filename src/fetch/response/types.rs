//! Fetch result types.

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::error_handling::{is_retryable_status, FetchErrorKind};

/// A successful (2xx) response whose body has already been read.
///
/// The body is held as text, so callers may inspect it any number of times.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl FetchedResponse {
    pub fn text(&self) -> &str {
        &self.body
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// A failed resubmission, after the last attempt.
#[derive(Debug, Clone, Error)]
#[error("{kind} on attempt {attempt}: {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    /// HTTP status, when a response was received
    pub status: Option<u16>,
    pub message: String,
    /// Display form of the underlying transport error
    pub original_error: Option<String>,
    /// 1-based attempt that produced this error
    pub attempt: u32,
    /// Response text, when a response was received
    pub body: Option<String>,
}

impl FetchError {
    pub(crate) fn network(error: &reqwest::Error, attempt: u32) -> Self {
        FetchError {
            kind: FetchErrorKind::Network,
            status: None,
            message: crate::error_handling::describe_reqwest_error(error).to_string(),
            original_error: Some(error.to_string()),
            attempt,
            body: None,
        }
    }

    pub(crate) fn http(kind: FetchErrorKind, status: u16, body: String, attempt: u32) -> Self {
        FetchError {
            kind,
            status: Some(status),
            message: format!("HTTP {status}"),
            original_error: None,
            attempt,
            body: Some(body),
        }
    }

    /// Network failures and allow-listed statuses get another attempt.
    pub fn is_retryable(&self) -> bool {
        match self.status {
            None => self.kind == FetchErrorKind::Network,
            Some(status) => is_retryable_status(status),
        }
    }
}
