// src/config.rs
// =============================================================================
// The immutable settings for one crawl run.
//
// A CrawlConfig is built once (from the CLI in main.rs, or directly in tests)
// and then only ever read. Everything a crawl needs to know lives here, so
// two crawls in the same process never share hidden global state.
//
// The hostname is derived from the root URL exactly once and then matched
// byte-for-byte by the link scanner on every page.
// =============================================================================

use std::time::Duration;
use url::Url;

use crate::error::ConfigError;

/// Maximum number of network calls in flight at the same time
pub const DEFAULT_CONCURRENCY: usize = 100;

/// Client-level timeout for each GET
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Largest single link candidate the scanner will buffer (1 GiB)
pub const DEFAULT_MAX_BUFFER: usize = 1024 * 1024 * 1024;

/// URLs ending with this are documentation pages and never fetched
pub const DEFAULT_SKIP_SUFFIX: &str = "readme";

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// The seed URL, already parsed
    pub root: Url,
    /// Host of the root URL without the port, e.g. "rancher.example.com"
    pub hostname: String,
    /// Scheme prepended to extracted links ("https" in production)
    pub scheme: String,
    /// Sent as `Authorization: Bearer <token>`
    pub token: String,
    /// Accept self-signed / invalid TLS certificates
    pub insecure: bool,
    pub max_concurrent_fetches: usize,
    pub request_timeout: Duration,
    pub skip_suffixes: Vec<String>,
    pub max_buffer: usize,
}

impl CrawlConfig {
    /// Builds a config with default knobs from the root URL and token.
    ///
    /// Fails if the root URL does not parse or has no host; this is the only
    /// fatal error in the whole program.
    pub fn from_root(root: &str, token: impl Into<String>) -> Result<Self, ConfigError> {
        let parsed = Url::parse(root).map_err(|source| ConfigError::InvalidRootUrl {
            url: root.to_string(),
            source,
        })?;

        let hostname = parsed
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| ConfigError::MissingHost(root.to_string()))?
            .to_string();

        Ok(Self {
            scheme: parsed.scheme().to_string(),
            root: parsed,
            hostname,
            token: token.into(),
            insecure: false,
            max_concurrent_fetches: DEFAULT_CONCURRENCY,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            skip_suffixes: vec![DEFAULT_SKIP_SUFFIX.to_string()],
            max_buffer: DEFAULT_MAX_BUFFER,
        })
    }

    pub fn with_concurrency(mut self, max: usize) -> Self {
        // A cap of zero would deadlock the first fetch
        self.max_concurrent_fetches = max.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn with_skip_suffixes(mut self, suffixes: Vec<String>) -> Self {
        self.skip_suffixes = suffixes;
        self
    }

    pub fn with_max_buffer(mut self, bytes: usize) -> Self {
        self.max_buffer = bytes;
        self
    }

    /// True for documentation-only URLs the fetcher must skip.
    pub fn is_documentation(&self, url: &str) -> bool {
        self.skip_suffixes
            .iter()
            .any(|suffix| !suffix.is_empty() && url.ends_with(suffix.as_str()))
    }
}
