//! Request cache entries captured from the browser.
//!
//! A body and a headers entry sharing a request id form one submittable request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::form::FormSnapshot;

/// One request header as captured by the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub name: String,
    pub value: String,
}

impl HeaderEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Cache entries carry a per-cache write counter.
///
/// The highest `sequence` is the most recently written entry, even when two
/// captures land in the same millisecond.
pub trait SequencedEntry {
    fn sequence(&self) -> u64;

    fn request_id(&self) -> &str;
}

/// Captured outgoing POST body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedBody {
    pub request_id: String,
    pub url: String,
    pub body: FormSnapshot,
    pub captured_at: i64,
    #[serde(default)]
    pub sequence: u64,
}

/// Captured outgoing request headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedHeaders {
    pub request_id: String,
    pub url: String,
    pub headers: Vec<HeaderEntry>,
    pub captured_at: i64,
    #[serde(default)]
    pub sequence: u64,
}

impl SequencedEntry for CachedBody {
    fn sequence(&self) -> u64 {
        self.sequence
    }

    fn request_id(&self) -> &str {
        &self.request_id
    }
}

impl SequencedEntry for CachedHeaders {
    fn sequence(&self) -> u64 {
        self.sequence
    }

    fn request_id(&self) -> &str {
        &self.request_id
    }
}

/// `requestCacheBody` document: request id to captured body.
pub type BodyCache = BTreeMap<String, CachedBody>;

/// `requestCacheHeaders` document: request id to captured headers.
pub type HeaderCache = BTreeMap<String, CachedHeaders>;

/// Most recently written entry of a cache.
pub fn latest<T: SequencedEntry>(cache: &BTreeMap<String, T>) -> Option<&T> {
    cache.values().max_by_key(|entry| entry.sequence())
}

/// Sequence number for the next write into `cache`.
pub fn next_sequence<T: SequencedEntry>(cache: &BTreeMap<String, T>) -> u64 {
    cache
        .values()
        .map(SequencedEntry::sequence)
        .max()
        .map_or(1, |max| max + 1)
}
