// src/extract/normalize.rs
// =============================================================================
// Turns raw scanner candidates into absolute URLs, and derives the two keys
// the crawler cares about:
//
// - frontier key: the URL without its query string. Two URLs that differ only
//   in their query are the same page as far as crawling is concerned.
// - action key: the full URL (query included), but only when the query has a
//   non-empty `action` parameter. These are the results we report.
//
// Candidates come from free-text scanning, so lots of them are junk. A
// candidate that doesn't parse is just dropped; it is not an error.
// =============================================================================

use std::borrow::Cow;
use std::fmt::Write;
use url::Url;

use crate::config::CrawlConfig;

/// Query parameter that marks a URL as a reportable action
const ACTION_PARAM: &str = "action";

#[derive(Debug, Clone)]
pub struct Normalizer {
    /// e.g. "https://"
    prefix: String,
    hostname: String,
}

impl Normalizer {
    pub fn new(scheme: &str, hostname: &str) -> Self {
        Self {
            prefix: format!("{}://", scheme),
            hostname: hostname.to_string(),
        }
    }

    pub fn from_config(config: &CrawlConfig) -> Self {
        Self::new(&config.scheme, &config.hostname)
    }

    /// Returns the absolute URL for `raw`, or None if it is not a URL on
    /// our host.
    pub fn normalize(&self, raw: &str) -> Option<Url> {
        let candidate = if raw.starts_with(&self.prefix) {
            Cow::Borrowed(raw)
        } else {
            Cow::Owned(format!("{}{}", self.prefix, raw))
        };

        let url = Url::parse(&candidate).ok()?;

        // "host.example.org" also contains "host"; never leave the site
        if url.host_str() != Some(self.hostname.as_str()) {
            return None;
        }

        Some(url)
    }

    /// Same as `normalize`, for the raw bytes the scanner hands out.
    ///
    /// Bytes that are not valid UTF-8 (Latin-1 paths, for instance) are
    /// percent-escaped rather than dropping the whole link.
    pub fn normalize_span(&self, span: &[u8]) -> Option<Url> {
        self.normalize(&escape_invalid_utf8(span))
    }
}

fn escape_invalid_utf8(span: &[u8]) -> Cow<'_, str> {
    if let Ok(valid) = std::str::from_utf8(span) {
        return Cow::Borrowed(valid);
    }

    let mut escaped = String::with_capacity(span.len() + 8);
    let mut rest = span;
    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                escaped.push_str(valid);
                break;
            }
            Err(e) => {
                let (valid, invalid) = rest.split_at(e.valid_up_to());
                escaped.push_str(std::str::from_utf8(valid).unwrap_or_default());

                let bad = e.error_len().unwrap_or(invalid.len());
                for byte in &invalid[..bad] {
                    // Writing to a String cannot fail
                    let _ = write!(escaped, "%{:02X}", byte);
                }
                rest = &invalid[bad..];
            }
        }
    }
    Cow::Owned(escaped)
}

/// The full URL if its first `action` parameter has a non-empty value.
pub fn action_key_of(url: &Url) -> Option<String> {
    let (_, value) = url.query_pairs().find(|(name, _)| name == ACTION_PARAM)?;
    if value.is_empty() {
        return None;
    }
    Some(url.to_string())
}

/// The URL as a string with the query component removed.
pub fn frontier_key_of(url: &Url) -> String {
    let mut stripped = url.clone();
    stripped.set_query(None);
    stripped.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::new("https", "rancher.local")
    }

    #[test]
    fn test_prepends_scheme() {
        let url = normalizer().normalize("rancher.local/v3/clusters").unwrap();
        assert_eq!(url.as_str(), "https://rancher.local/v3/clusters");
    }

    #[test]
    fn test_keeps_existing_scheme() {
        let url = normalizer().normalize("https://rancher.local/v3").unwrap();
        assert_eq!(url.as_str(), "https://rancher.local/v3");
    }

    #[test]
    fn test_keeps_port() {
        let url = normalizer().normalize("rancher.local:8443/v3").unwrap();
        assert_eq!(url.port(), Some(8443));
    }

    #[test]
    fn test_malformed_candidate_is_dropped() {
        assert!(normalizer().normalize("rancher.local:99999999/v3").is_none());
        assert!(normalizer().normalize_span(b"rancher.local:\xFF/v3").is_none());
    }

    #[test]
    fn test_invalid_utf8_is_percent_escaped() {
        let url = normalizer()
            .normalize_span(b"rancher.local/caf\xE9?action=x")
            .unwrap();
        assert_eq!(url.as_str(), "https://rancher.local/caf%E9?action=x");
        assert_eq!(
            action_key_of(&url).as_deref(),
            Some("https://rancher.local/caf%E9?action=x")
        );

        let url = normalizer().normalize_span(b"rancher.local/\xFF\xFE/x").unwrap();
        assert_eq!(url.path(), "/%FF%FE/x");
    }

    #[test]
    fn test_other_host_is_dropped() {
        assert!(normalizer().normalize("rancher.local.evil.org/x").is_none());
        assert!(normalizer().normalize("rancher.local@evil.org/x").is_none());
    }

    #[test]
    fn test_action_key() {
        let n = normalizer();
        let with_action = n.normalize("rancher.local/v3/nodes/1?action=drain").unwrap();
        assert_eq!(
            action_key_of(&with_action).as_deref(),
            Some("https://rancher.local/v3/nodes/1?action=drain")
        );

        let empty = n.normalize("rancher.local/v3/nodes/1?action=").unwrap();
        assert_eq!(action_key_of(&empty), None);

        let other = n.normalize("rancher.local/v3/nodes/1?limit=5").unwrap();
        assert_eq!(action_key_of(&other), None);

        let bare = n.normalize("rancher.local/v3/nodes/1").unwrap();
        assert_eq!(action_key_of(&bare), None);
    }

    #[test]
    fn test_frontier_key_ignores_query() {
        let n = normalizer();
        let a = n.normalize("rancher.local/v3/nodes?action=drain").unwrap();
        let b = n.normalize("rancher.local/v3/nodes?limit=5&marker=x").unwrap();
        let c = n.normalize("rancher.local/v3/nodes").unwrap();

        assert_eq!(frontier_key_of(&a), "https://rancher.local/v3/nodes");
        assert_eq!(frontier_key_of(&a), frontier_key_of(&b));
        assert_eq!(frontier_key_of(&b), frontier_key_of(&c));
    }
}
