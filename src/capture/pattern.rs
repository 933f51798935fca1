//! Browser match patterns.

use regex::Regex;

/// A URL match pattern such as `*://*/TVApp/EditTvAppSubmit/*`.
///
/// `*` matches any run of characters, everything else matches literally, and
/// the pattern must cover the whole URL.
#[derive(Debug, Clone)]
pub struct UrlPattern {
    source: String,
    regex: Regex,
}

impl UrlPattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let body = regex::escape(pattern.trim()).replace(r"\*", ".*");
        let regex = Regex::new(&format!("^{body}$"))?;
        Ok(UrlPattern {
            source: pattern.trim().to_string(),
            regex,
        })
    }

    pub fn matches(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}
