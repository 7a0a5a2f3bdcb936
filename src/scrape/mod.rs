//! Scrape module for paginated listing retrieval
//!
//! This module contains the core scraping logic, including:
//! - HTTP fetching and optional page archival
//! - Record and count-signal extraction
//! - Pagination planning
//! - Per-source concurrent fan-out and merging
//! - Running every source and writing the snapshot

mod coordinator;
mod fetcher;
mod merger;
mod parser;
mod planner;
mod record;
mod shelter;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::{SourceCoordinator, SourceOutcome};
pub use fetcher::{build_http_client, user_agent_string, ArchivingFetcher, HttpFetcher, PageFetcher};
pub use merger::{coalesce_adjacent, dedup_by_identity, merge_batches};
pub use parser::{RecordParser, ShelterParser};
pub use planner::{page_url, plan, PaginationPlan};
pub use record::{Page, ParsedPage, RawRecord, Record};
pub use shelter::{ShelterScraper, SourceReport};

use crate::config::Config;
use crate::output::{write_summary, RunInfo, Snapshot};
use crate::ScrapeError;
use chrono::Local;
use std::path::PathBuf;
use std::sync::Arc;

/// What a finished run produced
#[derive(Debug)]
pub struct RunReport {
    /// The snapshot directory of this run
    pub snapshot_dir: PathBuf,

    /// One outcome per configured source, in declaration order
    pub outcomes: Vec<SourceOutcome>,
}

impl RunReport {
    pub fn failed_sources(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }
}

/// Runs a complete scrape
///
/// This is the main entry point for a run. It will:
/// 1. Create the snapshot directory
/// 2. Build the HTTP client and, if enabled, the archiving wrapper
/// 3. Scrape every source concurrently
/// 4. Write one JSON file per successful source
/// 5. Write the markdown summary
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `config_hash` - Hash of the configuration file, recorded in the summary
///
/// # Returns
///
/// * `Ok(RunReport)` - The run completed; individual sources may still have failed
/// * `Err(ScrapeError)` - The run could not be set up or its output could not be written
pub async fn run_snapshot(config: Config, config_hash: &str) -> Result<RunReport, ScrapeError> {
    let snapshot = Snapshot::create(&PathBuf::from(&config.output.directory), Local::now())?;

    let client = build_http_client(&config.user_agent)?;
    let http: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(client));
    let fetcher: Arc<dyn PageFetcher> = if config.output.archive_pages {
        Arc::new(ArchivingFetcher::new(http, snapshot.dir()))
    } else {
        http
    };
    let parser: Arc<dyn RecordParser> = Arc::new(ShelterParser::new(&config.parser)?);

    tracing::info!("Scraping {} sources", config.sources.len());
    let coordinator = SourceCoordinator::new(fetcher, parser, config.scraper.clone());
    let outcomes = coordinator.run(&config.sources).await;

    for outcome in &outcomes {
        if let Some(report) = outcome.report() {
            snapshot.write_records(&outcome.name, &report.records)?;
        }
    }

    if config.output.summary {
        let info = RunInfo {
            started_at: snapshot.started_at(),
            finished_at: Local::now(),
            config_hash: config_hash.to_string(),
        };
        write_summary(&info, &outcomes, &snapshot.dir().join("summary.md"))?;
    }

    Ok(RunReport {
        snapshot_dir: snapshot.dir().to_path_buf(),
        outcomes,
    })
}
