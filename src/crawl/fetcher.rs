// src/crawl/fetcher.rs
// =============================================================================
// Fetches one page and streams every link found in it to the orchestrator.
//
// How it works:
// 1. Skip documentation pages (URLs ending with a configured suffix)
// 2. Wait for a concurrency permit (the only throttle in the crawler)
// 3. Send one authenticated GET
// 4. Feed the body, chunk by chunk, through the LinkScanner
// 5. Normalize each candidate and send it down the discovery channel
//
// Nothing here is fatal. A failed request, a bad status, a timeout or a body
// that breaks halfway is logged and the page simply contributes whatever it
// produced before the failure.
//
// The network is behind the `Transport` trait so the crawl logic can be
// exercised against an in-memory site in tests.
// =============================================================================

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::CrawlConfig;
use crate::error::{ConfigError, FetchError};
use crate::extract::{LinkScanner, Normalizer};

/// A response body, delivered incrementally
pub type BodyStream = BoxStream<'static, Result<Bytes, FetchError>>;

/// Performs the GET for a single URL.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Resolves once the response headers arrived with a 2xx status.
    async fn get(&self, url: &str) -> Result<BodyStream, FetchError>;
}

/// The real transport: reqwest with a bearer token.
pub struct HttpTransport {
    client: Client,
    bearer: String,
}

impl HttpTransport {
    pub fn new(config: &CrawlConfig) -> Result<Self, ConfigError> {
        // The timeout covers the whole exchange, body included, so a stalled
        // stream can't hold a permit forever.
        let client = Client::builder()
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.insecure)
            .build()?;

        Ok(Self {
            client,
            bearer: format!("Bearer {}", config.token),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<BodyStream, FetchError> {
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, &self.bearer)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.bytes_stream().map_err(FetchError::from).boxed())
    }
}

/// What happened to one fetch, for the crawl summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Documentation page, never sent to the network
    Skipped,
    /// Page fetched and fully scanned
    Visited { discovered: usize },
    /// Something went wrong; `discovered` links were still sent
    Failed { discovered: usize },
}

pub struct Fetcher {
    config: Arc<CrawlConfig>,
    transport: Arc<dyn Transport>,
    permits: Arc<Semaphore>,
    normalizer: Normalizer,
}

impl Fetcher {
    pub fn new(
        config: Arc<CrawlConfig>,
        transport: Arc<dyn Transport>,
        permits: Arc<Semaphore>,
    ) -> Self {
        let normalizer = Normalizer::from_config(&config);
        Self {
            config,
            transport,
            permits,
            normalizer,
        }
    }

    /// Fetches `url` and sends each link found in its body to `discoveries`.
    pub async fn fetch(&self, url: String, discoveries: mpsc::Sender<Url>) -> FetchOutcome {
        if self.config.is_documentation(&url) {
            debug!("Skipping documentation page {}", url);
            return FetchOutcome::Skipped;
        }

        // Held until this function returns, whichever way it returns
        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                warn!("Failed to acquire fetch permit for {}: {}", url, e);
                return FetchOutcome::Failed { discovered: 0 };
            }
        };

        info!("visiting: {}", url);

        let mut body = match self.transport.get(&url).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed request for {}: {}", url, e);
                return FetchOutcome::Failed { discovered: 0 };
            }
        };

        let mut scanner = LinkScanner::new(self.config.hostname.as_bytes(), self.config.max_buffer);
        let mut discovered = 0;

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    warn!("Failed reading body of {}: {}", url, e);
                    return FetchOutcome::Failed { discovered };
                }
            };

            let mut found = Vec::new();
            let scanned = scanner.feed(&chunk, |span| self.collect(span, &mut found));

            if !self.emit(found, &discoveries, &mut discovered).await {
                return FetchOutcome::Visited { discovered };
            }
            if let Err(e) = scanned {
                warn!("Failed reading input from {}: {}", url, e);
                return FetchOutcome::Failed { discovered };
            }
        }

        let mut found = Vec::new();
        scanner.finish(|span| self.collect(span, &mut found));
        self.emit(found, &discoveries, &mut discovered).await;

        debug!("{} links discovered on {}", discovered, url);
        FetchOutcome::Visited { discovered }
    }

    fn collect(&self, span: &[u8], found: &mut Vec<Url>) {
        match self.normalizer.normalize_span(span) {
            Some(link) => found.push(link),
            None => debug!("Discarding candidate {}", String::from_utf8_lossy(span)),
        }
    }

    /// Returns false if the orchestrator is gone and nobody is listening.
    async fn emit(
        &self,
        found: Vec<Url>,
        discoveries: &mpsc::Sender<Url>,
        discovered: &mut usize,
    ) -> bool {
        for link in found {
            if discoveries.send(link).await.is_err() {
                return false;
            }
            *discovered += 1;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher_for(config: CrawlConfig) -> Fetcher {
        let transport = HttpTransport::new(&config).unwrap();
        let permits = Arc::new(Semaphore::new(config.max_concurrent_fetches));
        Fetcher::new(Arc::new(config), Arc::new(transport), permits)
    }

    async fn drain(mut rx: mpsc::Receiver<Url>) -> Vec<String> {
        let mut links = Vec::new();
        while let Some(link) = rx.recv().await {
            links.push(link.to_string());
        }
        links
    }

    #[tokio::test]
    async fn test_fetch_sends_bearer_and_streams_links() {
        let server = MockServer::start().await;
        let base = server.uri();
        let host = base.trim_start_matches("http://").to_string();
        let body = format!(
            r#"{{"links": {{"self": "{base}/v3/a", "nodes": "{host}/v3/nodes?action=drain"}}}}"#
        );

        Mock::given(method("GET"))
            .and(path("/v3"))
            .and(header("Authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher_for(CrawlConfig::from_root(&base, "secret").unwrap());
        let (tx, rx) = mpsc::channel(16);

        let outcome = fetcher.fetch(format!("{base}/v3"), tx).await;

        assert_eq!(outcome, FetchOutcome::Visited { discovered: 2 });
        assert_eq!(
            drain(rx).await,
            vec![
                format!("{base}/v3/a"),
                format!("{base}/v3/nodes?action=drain"),
            ]
        );
    }

    #[tokio::test]
    async fn test_non_success_status_yields_nothing() {
        let server = MockServer::start().await;
        let base = server.uri();

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string(format!("{base}/v3/x ")))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(CrawlConfig::from_root(&base, "").unwrap());
        let (tx, rx) = mpsc::channel(16);

        let outcome = fetcher.fetch(format!("{base}/missing"), tx).await;

        assert_eq!(outcome, FetchOutcome::Failed { discovered: 0 });
        assert!(drain(rx).await.is_empty());
    }

    #[tokio::test]
    async fn test_documentation_page_never_hits_network() {
        let server = MockServer::start().await;
        let base = server.uri();

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let fetcher = fetcher_for(CrawlConfig::from_root(&base, "").unwrap());
        let (tx, rx) = mpsc::channel(16);

        let outcome = fetcher.fetch(format!("{base}/v3/clusters/readme"), tx).await;

        assert_eq!(outcome, FetchOutcome::Skipped);
        assert!(drain(rx).await.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_is_a_failed_fetch() {
        let server = MockServer::start().await;
        let base = server.uri();

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!("{base}/late "))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let config = CrawlConfig::from_root(&base, "")
            .unwrap()
            .with_timeout(Duration::from_millis(200));
        let fetcher = fetcher_for(config);
        let (tx, rx) = mpsc::channel(16);

        let outcome = fetcher.fetch(format!("{base}/slow"), tx).await;

        assert_eq!(outcome, FetchOutcome::Failed { discovered: 0 });
        assert!(drain(rx).await.is_empty());
    }
}
