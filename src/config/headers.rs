//! HTTP header name constants.
//!
//! This module defines the marker header that tags self-originated resubmissions,
//! the no-cache headers sent on every attempt, and the captured headers that are
//! never replayed.

/// Marker header name attached to programmatic resubmissions
pub const MARKER_HEADER_NAME: &str = "x-extension-request";
/// Marker header value attached to programmatic resubmissions
pub const MARKER_HEADER_VALUE: &str = "true";

/// Headers sent on every resubmission attempt to defeat intermediary caches.
pub const NO_CACHE_HEADERS: &[(&str, &str)] = &[
    ("cache-control", "no-cache, no-store, must-revalidate"),
    ("pragma", "no-cache"),
    ("expires", "0"),
];

/// Captured headers that must not be replayed verbatim.
///
/// reqwest computes framing headers itself; connection-level headers belong to
/// the original browser connection. Cache headers are replaced by
/// [`NO_CACHE_HEADERS`].
pub const SKIPPED_REPLAY_HEADERS: &[&str] = &[
    "host",
    "content-length",
    "content-type",
    "connection",
    "keep-alive",
    "transfer-encoding",
    "upgrade",
    "te",
    "cache-control",
    "pragma",
    "expires",
];

/// Returns true when `name` (any case) must not be replayed.
pub fn is_skipped_replay_header(name: &str) -> bool {
    SKIPPED_REPLAY_HEADERS
        .iter()
        .any(|skipped| skipped.eq_ignore_ascii_case(name))
}
