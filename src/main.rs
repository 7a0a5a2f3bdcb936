//! Shelter-Scrape main entry point
//!
//! This is the command-line interface for the Shelter-Scrape listing scraper.

use anyhow::Context;
use clap::Parser;
use shelter_scrape::arrivals::fetch_board;
use shelter_scrape::config::{load_config_with_hash, Config};
use shelter_scrape::scrape::{build_http_client, run_snapshot, HttpFetcher};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Shelter-Scrape: a paginated listing scraper
///
/// Shelter-Scrape fetches the seed pages of every configured source, plans
/// the remaining result pages from the listing count, fetches them
/// concurrently and writes the merged records into a timestamped snapshot.
#[derive(Parser, Debug)]
#[command(name = "shelter-scrape")]
#[command(version)]
#[command(about = "A paginated listing scraper", long_about = None)]
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

    /// Validate config and show what would be scraped without fetching anything
    #[arg(long, conflicts_with = "arrivals")]
    dry_run: bool,

    /// Print the arrivals board at URL instead of scraping the sources
    #[arg(long, value_name = "URL")]
    arrivals: Option<Url>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        Ok(ExitCode::SUCCESS)
    } else if let Some(url) = cli.arrivals {
        handle_arrivals(&config, &url).await?;
        Ok(ExitCode::SUCCESS)
    } else {
        handle_scrape(config, &config_hash).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shelter_scrape=info,warn"),
            1 => EnvFilter::new("shelter_scrape=debug,info"),
            2 => EnvFilter::new("shelter_scrape=trace,debug"),
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

/// Handles the --dry-run mode: shows the sources and their seeds
fn handle_dry_run(config: &Config) {
    println!("=== Shelter-Scrape Dry Run ===\n");

    println!("Scraper Configuration:");
    println!("  Page size: {}", config.scraper.page_size);
    println!("  Pointer parameter: {}", config.scraper.pointer_param);
    match config.scraper.max_concurrent_fetches {
        Some(limit) => println!("  Max concurrent fetches: {}", limit),
        None => println!("  Max concurrent fetches: unbounded"),
    }
    println!("  Page order: {:?}", config.scraper.page_order);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Archive pages: {}", config.output.archive_pages);
    println!("  Summary: {}", config.output.summary);

    println!("\nSources ({}):", config.sources.len());
    for source in &config.sources {
        println!("  - {} ({} seeds)", source.name, source.seeds.len());
        for seed in &source.seeds {
            println!("    * {}", seed);
        }
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start scraping with {} seed URLs",
        config.sources.iter().map(|s| s.seeds.len()).sum::<usize>()
    );
}

/// Handles the --arrivals mode: prints one arrivals board
async fn handle_arrivals(config: &Config, url: &Url) -> anyhow::Result<()> {
    let client = build_http_client(&config.user_agent)?;
    let fetcher = HttpFetcher::new(client);

    let board = fetch_board(&fetcher, url)
        .await
        .with_context(|| format!("Failed to read arrivals board {}", url))?;

    println!("lastUpdate: {}", board.last_update);
    for flight in &board.flights {
        println!("{}", flight);
    }

    Ok(())
}

/// Handles the main scrape operation
async fn handle_scrape(config: Config, config_hash: &str) -> anyhow::Result<ExitCode> {
    let seed_count: usize = config.sources.iter().map(|s| s.seeds.len()).sum();
    tracing::info!(
        "Sources: {}, total seed URLs: {}",
        config.sources.len(),
        seed_count
    );

    let report = run_snapshot(config, config_hash)
        .await
        .context("Scrape failed")?;

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(source) => {
                println!("== {} ({} records)", outcome.name, source.records.len());
                for record in &source.records {
                    println!("{}", record);
                }
            }
            Err(e) => println!("== {} failed: {}", outcome.name, e),
        }
    }

    tracing::info!("Snapshot written to {}", report.snapshot_dir.display());

    let failed = report.failed_sources();
    if failed > 0 {
        tracing::error!("{} of {} sources failed", failed, report.outcomes.len());
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
