//! Regex-based URL extraction.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use url::Url;

use sbguard_core::traits::UrlExtractor;

/// Scheme URLs (`http`, `https`, `ftp`) and scheme-less `www.` hosts.
static URL_CANDIDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:(?:https?|ftp)://|www\.)[^\s<>"'`{}|\\^\[\]()]+"#)
        .expect("Invalid regex pattern for URL candidates")
});

/// Characters that end a sentence rather than a URL.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '"', '>'];

/// Finds URLs in free text.
///
/// Every candidate must parse as a URL with a host; the original spelling is
/// what ends up in the result set, since verdicts match exact strings.
#[derive(Clone, Copy, Debug, Default)]
pub struct RegexUrlExtractor;

impl RegexUrlExtractor {
    /// Creates an extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extracts URLs from a single string.
    pub fn extract_from_text(&self, text: &str) -> BTreeSet<String> {
        URL_CANDIDATE
            .find_iter(text)
            .filter_map(|m| clean_candidate(m.as_str()))
            .collect()
    }
}

impl UrlExtractor for RegexUrlExtractor {
    fn extract_urls(&self, text_parts: &[String]) -> BTreeSet<String> {
        let urls = self.extract_from_text(&text_parts.join(" "));
        debug!(parts = text_parts.len(), urls = urls.len(), "Extracted URLs");
        urls
    }
}

fn clean_candidate(raw: &str) -> Option<String> {
    let candidate = raw.trim_end_matches(TRAILING_PUNCTUATION);

    let parseable = if candidate.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("www.")) {
        format!("http://{candidate}")
    } else {
        candidate.to_string()
    };

    match Url::parse(&parseable) {
        Ok(url) if url.host_str().is_some_and(|h| h.contains('.')) => Some(candidate.to_string()),
        _ => None,
    }
}
