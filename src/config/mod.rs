//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, retry defaults, store keys, etc.)
//! - HTTP header name constants (marker header, no-cache headers)
//! - Configuration types and validation

mod constants;
mod headers;
mod types;

// Re-export all constants
pub use constants::*;
pub use headers::*;
pub use types::{Config, ConfigValidationError, LogFormat, LogLevel};
