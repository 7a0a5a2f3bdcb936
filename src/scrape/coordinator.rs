//! Source coordinator - runs every configured source concurrently
//!
//! Each source gets its own `ShelterScraper` on its own task. The coordinator
//! waits for exactly one completion per source and never short-circuits: a
//! failing source does not affect the others.

use crate::config::{ScraperConfig, SourceConfig};
use crate::scrape::fetcher::PageFetcher;
use crate::scrape::parser::RecordParser;
use crate::scrape::shelter::{ShelterScraper, SourceReport};
use crate::state::ScrapeState;
use crate::ScrapeError;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Final state of one source
#[derive(Debug)]
pub struct SourceOutcome {
    pub name: String,
    pub state: ScrapeState,
    pub result: Result<SourceReport, ScrapeError>,
}

impl SourceOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Merged records, or `None` for a failed source
    pub fn report(&self) -> Option<&SourceReport> {
        self.result.as_ref().ok()
    }

    fn failed(name: &str, error: ScrapeError) -> Self {
        Self {
            name: name.to_string(),
            state: ScrapeState::Failed,
            result: Err(error),
        }
    }
}

/// Runs one scraper per source and gathers their outcomes
pub struct SourceCoordinator {
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<dyn RecordParser>,
    settings: ScraperConfig,
}

impl SourceCoordinator {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        parser: Arc<dyn RecordParser>,
        settings: ScraperConfig,
    ) -> Self {
        Self {
            fetcher,
            parser,
            settings,
        }
    }

    /// Scrapes all sources concurrently
    ///
    /// Outcomes are returned in the order the sources were given, one per
    /// source, whether it succeeded or not.
    pub async fn run(&self, sources: &[SourceConfig]) -> Vec<SourceOutcome> {
        let mut outcomes: Vec<Option<SourceOutcome>> = sources.iter().map(|_| None).collect();
        let mut tasks = JoinSet::new();

        for (index, source) in sources.iter().enumerate() {
            let scraper = ShelterScraper::new(
                source,
                Arc::clone(&self.fetcher),
                Arc::clone(&self.parser),
                self.settings.clone(),
            );

            match scraper {
                Ok(mut scraper) => {
                    tasks.spawn(async move {
                        let result = scraper.run().await;
                        let outcome = SourceOutcome {
                            name: scraper.name().to_string(),
                            state: scraper.state(),
                            result,
                        };
                        (index, outcome)
                    });
                }
                Err(e) => {
                    tracing::error!("Source {} could not start: {}", source.name, e);
                    outcomes[index] = Some(SourceOutcome::failed(&source.name, e));
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    match &outcome.result {
                        Ok(report) => tracing::info!(
                            "Source {} done! ({} records)",
                            outcome.name,
                            report.records.len()
                        ),
                        Err(e) => tracing::warn!("Source {} failed: {}", outcome.name, e),
                    }
                    outcomes[index] = Some(outcome);
                }
                Err(e) => tracing::error!("Source task did not complete: {}", e),
            }
        }

        outcomes
            .into_iter()
            .zip(sources)
            .map(|(outcome, source)| {
                outcome.unwrap_or_else(|| {
                    SourceOutcome::failed(
                        &source.name,
                        ScrapeError::Task {
                            name: source.name.clone(),
                            message: "task ended without reporting".to_string(),
                        },
                    )
                })
            })
            .collect()
    }
}
