//! Per-source orchestration
//!
//! A `ShelterScraper` drives one source through its lifecycle:
//!
//! 1. Fetch and parse every seed URL, one after another, in declaration order
//! 2. Plan the additional pages of each seed from that seed's own count signal
//! 3. Launch one task per additional page, all at once (optionally bounded)
//! 4. Collect exactly as many completions as were launched
//! 5. Merge seed batches first, then additional-page batches
//!
//! Any error on a seed or an additional page fails the whole source. Sibling
//! fetches already in flight are not cancelled; they are drained and their
//! results discarded.

use crate::config::{PageOrder, ScraperConfig, SourceConfig};
use crate::scrape::fetcher::PageFetcher;
use crate::scrape::merger::merge_batches;
use crate::scrape::parser::RecordParser;
use crate::scrape::planner::{page_url, PaginationPlan};
use crate::scrape::record::{ParsedPage, Record};
use crate::state::ScrapeState;
use crate::{ConfigError, ParseError, ScrapeError};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// Finished result of one source
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub name: String,

    /// Merged listings, seed pages first
    pub records: Vec<Record>,

    /// Listings that were skipped because they were malformed
    pub skipped: Vec<ParseError>,

    /// Number of pages fetched, seeds included
    pub pages_fetched: usize,
}

/// A seed page after fetching and parsing
#[derive(Debug)]
struct SeedPage {
    url: Url,
    count: Option<usize>,
    parsed: ParsedPage,
}

/// An additional page waiting to be fetched
#[derive(Debug, Clone)]
struct PendingPage {
    seed: usize,
    pointer: usize,
    url: Url,
}

/// Completion signal of one additional-page task
#[derive(Debug)]
struct PageCompletion {
    seed: usize,
    pointer: usize,
    url: Url,
    result: Result<ParsedPage, ScrapeError>,
}

/// An additional page that was fetched and parsed successfully
#[derive(Debug)]
struct FetchedPage {
    seed: usize,
    pointer: usize,
    parsed: ParsedPage,
}

/// Scrapes one source from its seed URLs to a merged record collection
pub struct ShelterScraper {
    name: String,
    seeds: Vec<Url>,
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<dyn RecordParser>,
    settings: ScraperConfig,
    state: ScrapeState,
}

impl ShelterScraper {
    /// Creates a scraper for one configured source
    ///
    /// # Returns
    ///
    /// * `Ok(ShelterScraper)` - Scraper in the `Init` state
    /// * `Err(ScrapeError::Config)` - A seed URL does not parse
    pub fn new(
        source: &SourceConfig,
        fetcher: Arc<dyn PageFetcher>,
        parser: Arc<dyn RecordParser>,
        settings: ScraperConfig,
    ) -> Result<Self, ScrapeError> {
        let seeds = source
            .seeds
            .iter()
            .map(|seed| {
                Url::parse(seed).map_err(|e| {
                    ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: source.name.clone(),
            seeds,
            fetcher,
            parser,
            settings,
            state: ScrapeState::Init,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ScrapeState {
        self.state
    }

    /// Runs the source to `Done` or `Failed`
    pub async fn run(&mut self) -> Result<SourceReport, ScrapeError> {
        let result = self.scrape().await;
        if let Err(e) = &result {
            self.fail();
            tracing::error!("[{}] Source failed: {}", self.name, e);
        }
        result
    }

    async fn scrape(&mut self) -> Result<SourceReport, ScrapeError> {
        let seeds = self.fetch_seeds().await?;
        self.transition(ScrapeState::SeedFetched)?;

        self.transition(ScrapeState::Planning)?;
        let pending = self.plan(&seeds)?;

        self.transition(ScrapeState::FanOut)?;
        let mut tasks = self.fan_out(pending);
        let launched = tasks.len();

        self.transition(ScrapeState::Collecting)?;
        let mut completed = self.collect(&mut tasks, launched).await?;

        self.check_counts(&seeds, &completed);

        if self.settings.page_order == PageOrder::Site {
            completed.sort_by_key(|page| (page.seed, page.pointer));
        }

        let pages_fetched = seeds.len() + completed.len();
        let mut skipped = Vec::new();
        let mut batches = Vec::with_capacity(pages_fetched);
        let parsed_pages = seeds
            .into_iter()
            .map(|seed| seed.parsed)
            .chain(completed.into_iter().map(|page| page.parsed));
        for parsed in parsed_pages {
            skipped.extend(parsed.failures);
            batches.push(parsed.records);
        }

        let records = merge_batches(batches);
        self.transition(ScrapeState::Done)?;

        tracing::info!(
            "[{}] Merged {} records from {} pages ({} skipped)",
            self.name,
            records.len(),
            pages_fetched,
            skipped.len()
        );

        Ok(SourceReport {
            name: self.name.clone(),
            records,
            skipped,
            pages_fetched,
        })
    }

    /// Fetches and parses the seed pages sequentially
    async fn fetch_seeds(&self) -> Result<Vec<SeedPage>, ScrapeError> {
        let mut seeds = Vec::with_capacity(self.seeds.len());

        for url in &self.seeds {
            tracing::info!("[{}] Parsing {}", self.name, url);
            let page = self.fetcher.fetch(url).await?;
            let count = self.parser.count_signal(&page)?;
            let parsed = self.parser.records(&page);

            seeds.push(SeedPage {
                url: url.clone(),
                count,
                parsed,
            });
        }

        Ok(seeds)
    }

    /// Computes the additional pages of every seed
    fn plan(&self, seeds: &[SeedPage]) -> Result<Vec<PendingPage>, ScrapeError> {
        let mut pending = Vec::new();

        for (index, seed) in seeds.iter().enumerate() {
            let plan = PaginationPlan::for_seed(
                &seed.url,
                seed.count,
                seed.parsed.listing_count(),
                self.settings.page_size,
            )?;

            tracing::debug!(
                "[{}] {} announces {:?} listings, {} additional pages",
                self.name,
                seed.url,
                plan.total,
                plan.pointers().len()
            );

            pending.extend(plan.pointers().iter().map(|&pointer| PendingPage {
                seed: index,
                pointer,
                url: page_url(&seed.url, &self.settings.pointer_param, pointer),
            }));
        }

        Ok(pending)
    }

    /// Launches one task per additional page without waiting on any of them
    fn fan_out(&self, pending: Vec<PendingPage>) -> JoinSet<PageCompletion> {
        let limiter = self
            .settings
            .max_concurrent_fetches
            .map(|permits| Arc::new(Semaphore::new(permits)));

        let mut tasks = JoinSet::new();
        for page in pending {
            tasks.spawn(fetch_page(
                Arc::clone(&self.fetcher),
                Arc::clone(&self.parser),
                limiter.clone(),
                page,
            ));
        }
        tasks
    }

    /// Waits for every launched page, failing the source on the first error
    async fn collect(
        &mut self,
        tasks: &mut JoinSet<PageCompletion>,
        launched: usize,
    ) -> Result<Vec<FetchedPage>, ScrapeError> {
        let mut completed = Vec::with_capacity(launched);
        let mut first_error: Option<ScrapeError> = None;
        let mut received = 0;

        while let Some(joined) = tasks.join_next().await {
            received += 1;

            let completion = match joined {
                Ok(completion) => completion,
                Err(e) => {
                    let error = ScrapeError::Task {
                        name: self.name.clone(),
                        message: e.to_string(),
                    };
                    self.record_failure(&mut first_error, error);
                    continue;
                }
            };

            let PageCompletion {
                seed,
                pointer,
                url,
                result,
            } = completion;

            match result {
                Ok(parsed) if first_error.is_none() => completed.push(FetchedPage {
                    seed,
                    pointer,
                    parsed,
                }),
                Ok(_) => tracing::debug!("[{}] Discarding {} after failure", self.name, url),
                Err(e) => self.record_failure(&mut first_error, e),
            }
        }

        debug_assert_eq!(received, launched);
        tracing::debug!("[{}] {} of {} pages reported", self.name, received, launched);

        match first_error {
            Some(e) => Err(e),
            None => Ok(completed),
        }
    }

    fn record_failure(&mut self, first_error: &mut Option<ScrapeError>, error: ScrapeError) {
        if first_error.is_some() {
            tracing::debug!("[{}] Further failure after abort: {}", self.name, error);
            return;
        }
        tracing::error!("[{}] Page failed, aborting source: {}", self.name, error);
        self.fail();
        *first_error = Some(error);
    }

    /// Compares announced totals with what the pages actually listed
    fn check_counts(&self, seeds: &[SeedPage], completed: &[FetchedPage]) {
        for (index, seed) in seeds.iter().enumerate() {
            let Some(total) = seed.count else {
                continue;
            };

            let found = seed.parsed.listing_count()
                + completed
                    .iter()
                    .filter(|page| page.seed == index)
                    .map(|page| page.parsed.listing_count())
                    .sum::<usize>();

            if found != total {
                tracing::warn!(
                    "[{}] {} announced {} listings but {} were found",
                    self.name,
                    seed.url,
                    total,
                    found
                );
            }
        }
    }

    fn transition(&mut self, next: ScrapeState) -> Result<(), ScrapeError> {
        if !self.state.can_transition_to(next) {
            return Err(ScrapeError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::trace!("[{}] {} -> {}", self.name, self.state, next);
        self.state = next;
        Ok(())
    }

    fn fail(&mut self) {
        if !self.state.is_terminal() {
            self.state = ScrapeState::Failed;
        }
    }
}

/// Fetches and parses one additional page
async fn fetch_page(
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<dyn RecordParser>,
    limiter: Option<Arc<Semaphore>>,
    page: PendingPage,
) -> PageCompletion {
    let _permit = match limiter {
        Some(limiter) => limiter.acquire_owned().await.ok(),
        None => None,
    };

    tracing::info!("Parsing {}", page.url);
    let result = fetcher
        .fetch(&page.url)
        .await
        .map(|fetched| parser.records(&fetched))
        .map_err(ScrapeError::from);

    PageCompletion {
        seed: page.seed,
        pointer: page.pointer,
        url: page.url,
        result,
    }
}
