// src/crawl/mod.rs
// =============================================================================
// This module handles crawling a single host.
//
// Submodules:
// - fetcher: one authenticated GET, body streamed through the link scanner
// - frontier: the orchestrator loop that dedups links and spawns fetches
// - actions: the set of action URLs reported at the end
//
// Features:
// - Bounded concurrency (a semaphore shared by all fetch tasks)
// - Each query-stripped page is fetched at most once
// - Failed fetches are logged and never stop the crawl
// =============================================================================

mod actions;
mod fetcher;
mod frontier;

// Re-export the crawler entry points
pub use frontier::{CrawlReport, Crawler};
