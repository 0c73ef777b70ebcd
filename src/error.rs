// src/error.rs
// =============================================================================
// Error types for the crawler.
//
// There are three families of errors, and they are handled very differently:
// - ConfigError: the root URL is unusable. This is the only error that
//   reaches main() and stops the program.
// - FetchError: one GET went wrong (bad request, network, timeout, status).
//   The fetcher logs it and that page simply yields no links.
// - ScanError: the link scanner gave up on a body. Links found before the
//   failure are kept.
//
// We use `thiserror` to derive Display/Error implementations so each variant
// gets a readable message without hand-written boilerplate.
// =============================================================================

use thiserror::Error;

/// The crawl cannot start.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse server URL '{url}': {source}")]
    InvalidRootUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("server URL '{0}' has no host")]
    MissingHost(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// A single fetch failed. Never fatal for the crawl.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be built or sent (DNS, connect, TLS, ...)
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered, but not with a 2xx status
    #[error("unexpected status {0}")]
    Status(u16),

    /// The client-level timeout elapsed
    #[error("request timed out")]
    Timeout,

    /// The connection broke while streaming the body
    #[error("failed reading body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout
        } else if error.is_body() || error.is_decode() {
            FetchError::Body(error.to_string())
        } else if let Some(status) = error.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Request(error.to_string())
        }
    }
}

/// The link scanner could not continue.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("link candidate exceeds buffer ceiling of {limit} bytes")]
    TokenTooLong { limit: usize },
}
