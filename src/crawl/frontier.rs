// src/crawl/frontier.rs
// =============================================================================
// The crawl orchestrator: owns the frontier and decides what gets fetched.
//
// How it works:
// 1. Mark the root URL as seen and spawn a fetch task for it
// 2. Every fetch task sends the links it finds down one shared channel
// 3. This loop is the only reader of that channel. For each link it:
//    - records the link if it is an action URL
//    - strips the query and, if that page is new, spawns a fetch for it
// 4. When no task is running and the channel is empty, the crawl is done
//
// Because only this loop touches `seen` and the action set, neither needs a
// lock. The fetch tasks never share state with each other; they only send.
//
// Note that an action URL is recorded but its query-stripped page is what
// gets fetched. `/nodes?action=drain` is reported; `/nodes` is visited.
// =============================================================================

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use url::Url;

use super::actions::ActionCollector;
use super::fetcher::{FetchOutcome, Fetcher, HttpTransport, Transport};
use crate::config::CrawlConfig;
use crate::error::ConfigError;
use crate::extract::frontier_key_of;

/// Discoveries buffered between the fetch tasks and the orchestrator
const DISCOVERY_BUFFER: usize = 1024;

/// Result of one complete crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Sorted, distinct action URLs
    pub actions: Vec<String>,
    /// Distinct query-stripped pages dispatched, the root included
    pub pages: usize,
    /// Links sent by fetchers, duplicates included
    pub discovered: usize,
    pub visited: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl CrawlReport {
    fn record(&mut self, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Visited { discovered } => {
                self.visited += 1;
                self.discovered += discovered;
            }
            FetchOutcome::Skipped => self.skipped += 1,
            FetchOutcome::Failed { discovered } => {
                self.failed += 1;
                self.discovered += discovered;
            }
        }
    }
}

/// Dedup state for one crawl run
#[derive(Debug, Default)]
struct Frontier {
    seen: HashSet<String>,
    actions: ActionCollector,
}

impl Frontier {
    /// Inserts `key`; true the first time it is seen.
    fn insert(&mut self, key: String) -> bool {
        self.seen.insert(key)
    }

    /// Handles one discovery. Returns the page to fetch, if it is new.
    fn admit(&mut self, link: &Url) -> Option<String> {
        if self.actions.record(link) {
            debug!("New action {} ({} so far)", link, self.actions.len());
        }

        let key = frontier_key_of(link);
        if self.seen.contains(&key) {
            return None;
        }
        self.seen.insert(key.clone());
        Some(key)
    }
}

/// One crawl run over a single host.
///
/// Each Crawler owns its own permits and channel, so several crawls can run
/// side by side in one process without interfering.
pub struct Crawler {
    config: Arc<CrawlConfig>,
    fetcher: Arc<Fetcher>,
}

impl Crawler {
    /// Crawler that talks HTTP(S) using the settings in `config`.
    pub fn new(config: CrawlConfig) -> Result<Self, ConfigError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: CrawlConfig, transport: Arc<dyn Transport>) -> Self {
        let config = Arc::new(config);
        let permits = Arc::new(Semaphore::new(config.max_concurrent_fetches));
        let fetcher = Arc::new(Fetcher::new(Arc::clone(&config), transport, permits));
        Self { config, fetcher }
    }

    /// Crawls everything reachable from the root URL and returns the report.
    pub async fn run(&self) -> CrawlReport {
        let (tx, mut rx) = mpsc::channel::<Url>(DISCOVERY_BUFFER);
        let mut tasks = JoinSet::new();
        let mut frontier = Frontier::default();
        let mut report = CrawlReport::default();

        info!(
            "Starting crawl of {} (host {}, max {} concurrent fetches)",
            self.config.root, self.config.hostname, self.config.max_concurrent_fetches
        );

        frontier.insert(frontier_key_of(&self.config.root));
        self.spawn_fetch(&mut tasks, self.config.root.to_string(), &tx);

        loop {
            tokio::select! {
                // Drain discoveries before looking at finished tasks
                biased;

                Some(link) = rx.recv() => {
                    if let Some(page) = frontier.admit(&link) {
                        self.spawn_fetch(&mut tasks, page, &tx);
                    }
                }

                joined = tasks.join_next() => match joined {
                    Some(Ok(outcome)) => report.record(outcome),
                    Some(Err(e)) => {
                        warn!("Fetch task ended abnormally: {}", e);
                        report.failed += 1;
                    }
                    None => {
                        // Every task has finished, so every send has landed
                        // in the channel. Pick up the stragglers.
                        while let Ok(link) = rx.try_recv() {
                            if let Some(page) = frontier.admit(&link) {
                                self.spawn_fetch(&mut tasks, page, &tx);
                            }
                        }
                        if tasks.is_empty() {
                            break;
                        }
                    }
                },
            }
        }

        report.pages = frontier.seen.len();
        report.actions = frontier.actions.into_sorted();

        info!(
            "Crawl finished: {} pages, {} links, {} visited, {} skipped, {} failed, {} actions",
            report.pages,
            report.discovered,
            report.visited,
            report.skipped,
            report.failed,
            report.actions.len()
        );

        report
    }

    fn spawn_fetch(
        &self,
        tasks: &mut JoinSet<FetchOutcome>,
        url: String,
        tx: &mpsc::Sender<Url>,
    ) {
        let fetcher = Arc::clone(&self.fetcher);
        let tx = tx.clone();
        tasks.spawn(async move { fetcher.fetch(url, tx).await });
    }
}
