// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Every input can come from a flag or from the environment, so the tool can
// be dropped into a CI job that already exports RANCHER_SERVER and
// RANCHER_TOKEN without repeating them on the command line.
// =============================================================================

use clap::Parser;
use std::time::Duration;

use crate::config::{
    CrawlConfig, DEFAULT_CONCURRENCY, DEFAULT_MAX_BUFFER, DEFAULT_SKIP_SUFFIX,
    DEFAULT_TIMEOUT_SECS,
};
use crate::error::ConfigError;

#[derive(Parser, Debug)]
#[command(
    name = "action-crawler",
    version,
    about = "Crawl an API server and list every URL that exposes an `action` parameter",
    long_about = "action-crawler starts at a server's root URL, follows every link on the same host \
                  it can find in response bodies, and prints the sorted list of distinct URLs whose \
                  query string carries a non-empty `action` parameter."
)]
pub struct Cli {
    /// Root URL to start crawling from (e.g., https://rancher.example.com)
    #[arg(long, env = "RANCHER_SERVER")]
    pub server: String,

    /// Bearer token sent with every request
    #[arg(long, env = "RANCHER_TOKEN", default_value = "", hide_env_values = true)]
    pub token: String,

    /// Accept invalid or self-signed TLS certificates
    #[arg(long, env = "CRAWL_INSECURE")]
    pub insecure: bool,

    /// Maximum number of requests in flight at once
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Skip URLs ending with this suffix (documentation pages). Repeatable.
    #[arg(long = "skip-suffix", default_value = DEFAULT_SKIP_SUFFIX)]
    pub skip_suffixes: Vec<String>,

    /// Longest link candidate, in bytes, the scanner will buffer
    #[arg(long, default_value_t = DEFAULT_MAX_BUFFER)]
    pub max_buffer: usize,

    /// Output results in JSON format instead of a plain list
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Builds the immutable crawl settings from the parsed arguments.
    pub fn to_config(&self) -> Result<CrawlConfig, ConfigError> {
        Ok(CrawlConfig::from_root(&self.server, self.token.clone())?
            .with_insecure(self.insecure)
            .with_concurrency(self.concurrency)
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_skip_suffixes(self.skip_suffixes.clone())
            .with_max_buffer(self.max_buffer))
    }
}
