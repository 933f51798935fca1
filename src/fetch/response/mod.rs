//! HTTP response types and HTML error-page detection.

mod html;
mod types;

pub use html::{html_error_code, is_html_error_page};
pub use types::{FetchError, FetchedResponse};
