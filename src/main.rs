// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Install logging (stderr, filtered by RUST_LOG)
// 2. Parse command-line arguments / environment using clap
// 3. Run the crawl
// 4. Print the sorted action list on stdout
// 5. Exit with proper code (0 = crawl completed, 2 = configuration error)
//
// Failed pages never change the exit code: a crawl with network errors still
// completes and prints whatever it found. Diagnostics go to stderr.
// =============================================================================

mod cli;
mod config;
mod crawl;
mod error;
mod extract;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::Cli;
use crawl::{CrawlReport, Crawler};

#[tokio::main]
async fn main() {
    init_tracing();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("action_crawler=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let config = cli.to_config().context("invalid configuration")?;
    let crawler = Crawler::new(config).context("failed to set up crawler")?;

    let report: CrawlReport = crawler.run().await;

    print_results(&report.actions, cli.json)?;
    Ok(0)
}

#[derive(Serialize)]
struct ActionsOutput<'a> {
    actions: &'a [String],
}

// Prints the action list either as plain text or JSON
fn print_results(actions: &[String], json: bool) -> Result<()> {
    println!("{}", render(actions, json)?);
    Ok(())
}

fn render(actions: &[String], json: bool) -> Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(&ActionsOutput { actions })?)
    } else {
        let mut out = String::from("ACTIONS:");
        for action in actions {
            out.push('\n');
            out.push_str(action);
        }
        Ok(out)
    }
}
