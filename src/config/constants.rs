//! Configuration constants.
//!
//! This module defines all configuration constants used throughout the application,
//! including retry defaults, scheduler intervals, and persisted document keys.

pub const DB_PATH: &str = "./booking_retry.db";

/// Default URL match pattern for the booking-submission endpoint.
///
/// Uses browser match-pattern syntax: `*` matches any run of characters.
pub const DEFAULT_BOOKING_URL_PATTERN: &str = "*://*/TVApp/EditTvAppSubmit/*";

/// Default User-Agent string for resubmission requests.
///
/// Captured headers usually carry the browser's own User-Agent, which takes
/// precedence over this value when present.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// TCP connection timeout in seconds
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 5;

// Retry strategy (FetchEngine)
/// Delay in milliseconds before the first retry
pub const RETRY_BASE_DELAY_MS: u64 = 1000;
/// Maximum delay between retries in milliseconds
pub const RETRY_MAX_DELAY_MS: u64 = 10_000;
/// Maximum number of attempts (including initial attempt)
pub const RETRY_MAX_ATTEMPTS: u32 = 3;
/// Upper bound accepted by config validation for `max_attempts`
pub const RETRY_MAX_ATTEMPTS_LIMIT: u32 = 10;

/// HTTP statuses that are worth another attempt at the transport layer.
///
/// Anything else is returned to the caller on the first failure.
pub const RETRYABLE_STATUSES: &[u16] = &[502, 503, 504, 408, 429];

// Scheduler
/// Lower bound of the randomized tick interval in milliseconds
pub const DEFAULT_INTERVAL_MIN_MS: u64 = 20_000;
/// Upper bound of the randomized tick interval in milliseconds
pub const DEFAULT_INTERVAL_MAX_MS: u64 = 40_000;

// Error log
/// Number of entries kept under the `errorLog` key
pub const ERROR_LOG_CAPACITY: usize = 100;

// HTTP status codes (for clarity and consistency)
pub const HTTP_STATUS_UNAUTHORIZED: u16 = 401;
pub const HTTP_STATUS_FORBIDDEN: u16 = 403;

// Persisted document keys
/// Map of request id to captured form body
pub const KEY_REQUEST_CACHE_BODY: &str = "requestCacheBody";
/// Map of request id to captured request headers
pub const KEY_REQUEST_CACHE_HEADERS: &str = "requestCacheHeaders";
/// Ordered sequence of retry objects
pub const KEY_RETRY_QUEUE: &str = "retryQueue";
/// Boolean flag: the upstream session is no longer authorized
pub const KEY_UNAUTHORIZED: &str = "unauthorized";
/// Grid snapshot of the booking page table
pub const KEY_TABLE_DATA: &str = "tableData";
/// Bounded list of final fetch failures
pub const KEY_ERROR_LOG: &str = "errorLog";
