//! Agent-Trawl main entry point
//!
//! This is the command-line interface for the Agent-Trawl directory crawler.

use agent_trawl::config::{load_config_with_hash, resolve_start_url, validate, Config};
use agent_trawl::crawler::{run_crawl, FrontierState};
use agent_trawl::output::{write_summary, RunSummary};
use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Agent-Trawl: a polite estate-agent directory crawler
///
/// Agent-Trawl walks the paginated agent search results of a business
/// directory, optionally visits every agent's profile page, and writes
/// deduplicated records to a JSON-lines file or a SQLite database.
#[derive(Parser, Debug)]
#[command(name = "agent-trawl")]
#[command(version = "1.0.0")]
#[command(about = "A polite estate-agent directory crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Override crawler.max-results
    #[arg(long, value_name = "N")]
    max_results: Option<u32>,

    /// Override crawler.max-pages
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Emit listing-card data only, without visiting profile pages
    #[arg(long)]
    no_details: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(max_results) = self.max_results {
            config.crawler.max_results = max_results;
        }
        if let Some(max_pages) = self.max_pages {
            config.crawler.max_pages = max_pages;
        }
        if self.no_details {
            config.crawler.collect_agent_details = false;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the run succeeded
async fn run(cli: Cli) -> anyhow::Result<bool> {
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    cli.apply_overrides(&mut config);

    if cli.dry_run {
        handle_dry_run(&config)?;
        return Ok(true);
    }

    let summary = run_crawl(config).await.context("Failed to record run summary")?;
    if summary.is_success() {
        tracing::info!(
            "Crawl completed successfully: {} agents from {} listing pages",
            summary.agents_scraped,
            summary.pages_processed
        );
    } else if let Some(error) = &summary.error {
        tracing::error!("Crawl failed: {}", error);
    }
    Ok(summary.is_success())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("agent_trawl=info,warn"),
            1 => EnvFilter::new("agent_trawl=debug,info"),
            2 => EnvFilter::new("agent_trawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let start_url = match validate(config).and_then(|()| resolve_start_url(&config.search)) {
        Ok(start_url) => start_url,
        Err(e) => {
            let summary = RunSummary::failed(&FrontierState::default(), &e);
            write_summary(Path::new(&config.output.summary_path), &summary)?;
            return Err(e).context("Configuration is invalid");
        }
    };

    println!("=== Agent-Trawl Dry Run ===\n");

    println!("Search:");
    println!("  Start URL: {}", start_url);
    println!("  Branch type: {}", config.search.branch_type);

    println!("\nCrawler Configuration:");
    println!("  Collect agent details: {}", config.crawler.collect_agent_details);
    println!("  Max results: {}", config.crawler.max_results);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Max concurrency: {}", config.crawler.max_concurrency);
    println!(
        "  Politeness delay: {}ms + up to {}ms jitter",
        config.crawler.request_delay_ms, config.crawler.request_jitter_ms
    );
    println!(
        "  Attempts per request: {} (backoff from {}ms)",
        config.crawler.max_attempts, config.crawler.retry_backoff_ms
    );
    println!("  Batch size: {}", config.crawler.batch_size);

    println!("\nIdentity:");
    println!("  User agents: {}", config.identity.user_agents.len());
    if config.identity.proxies.is_empty() {
        println!("  Proxies: none (direct connection)");
    } else {
        println!("  Proxies: {}", config.identity.proxies.len());
    }

    println!("\nOutput:");
    println!("  Format: {:?}", config.output.format);
    println!("  Dataset: {}", config.output.dataset_path);
    println!("  Summary: {}", config.output.summary_path);

    println!("\n✓ Configuration is valid");

    Ok(())
}
