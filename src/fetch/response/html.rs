//! HTML error-page detection.
//!
//! Gateways and application servers answer failures with HTML pages instead of
//! the JSON the booking endpoint normally returns. A page counts as an error
//! page when its `<title>` or an `<h1>` carries a 3-digit status code, or when its
//! text has `Status:` / `Error` followed by a code.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

const TITLE_SELECTOR_STR: &str = "title";
const H1_SELECTOR_STR: &str = "h1";

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(TITLE_SELECTOR_STR).expect("Failed to parse title selector - this is a bug")
});

static H1_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(H1_SELECTOR_STR).expect("Failed to parse h1 selector - this is a bug")
});

fn compile_regex_unsafe(pattern: &str, context: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| {
        panic!(
            "Failed to compile regex pattern '{}' in {}: {}. This is a programming error.",
            pattern, context, e
        )
    })
}

static STATUS_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(r"\b([1-5]\d{2})\b", "STATUS_CODE_RE"));

static LABELLED_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(r"(?:Status:|Error)\s*:?\s*([1-5]\d{2})\b", "LABELLED_CODE_RE")
});

static HTML_MARKUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(r"(?i)<\s*(?:!doctype\s+html|html|head|body|title|h1)\b", "HTML_MARKUP_RE")
});

fn first_code(text: &str, re: &Regex) -> Option<u16> {
    re.captures(text)
        .and_then(|cap| cap.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Extracts the status code advertised by an HTML error page.
///
/// Returns `None` for bodies that are not HTML or carry no recognizable code.
pub fn html_error_code(body: &str) -> Option<u16> {
    if !HTML_MARKUP_RE.is_match(body) {
        return None;
    }

    let document = Html::parse_document(body);
    for selector in [&*TITLE_SELECTOR, &*H1_SELECTOR] {
        for element in document.select(selector) {
            let text: String = element.text().collect();
            if let Some(code) = first_code(text.trim(), &STATUS_CODE_RE) {
                log::debug!("HTML error page advertises {code} in <{}>", element.value().name());
                return Some(code);
            }
        }
    }

    first_code(body, &LABELLED_CODE_RE)
}

/// Returns true when `body` looks like an HTML error page.
pub fn is_html_error_page(body: &str) -> bool {
    html_error_code(body).is_some()
}
