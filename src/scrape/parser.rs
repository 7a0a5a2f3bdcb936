//! Listing parser for extracting records from result pages
//!
//! This module turns the raw bytes of one result page into:
//! - The total listing count, when the page carries a count marker
//! - One raw record per listing block (detail URL, name, note, images)
//!
//! Both operations are pure functions of the page. The selectors and the count
//! pattern are compiled once, when the parser is built from configuration.

use crate::config::ParserConfig;
use crate::scrape::merger::dedup_by_identity;
use crate::scrape::record::{Page, ParsedPage, RawRecord};
use crate::{ConfigError, ParseError, PlanError};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Extracts listings and the count signal from a fetched page
pub trait RecordParser: Send + Sync {
    /// Total listing count announced by the page, if any
    ///
    /// `Ok(None)` is a normal outcome: the listing fits on a single page.
    fn count_signal(&self, page: &Page) -> Result<Option<usize>, PlanError>;

    /// All listings on the page in document order
    ///
    /// A malformed listing becomes an entry in `failures` and does not affect
    /// its siblings.
    fn records(&self, page: &Page) -> ParsedPage;
}

/// `RecordParser` driven by CSS selectors and a count regex
#[derive(Debug)]
pub struct ShelterParser {
    record: Selector,
    link: Selector,
    note: Selector,
    image: Selector,
    base: Selector,
    count: Regex,
}

impl ShelterParser {
    /// Compiles the configured patterns
    ///
    /// # Returns
    ///
    /// * `Ok(ShelterParser)` - All selectors and the count pattern compiled
    /// * `Err(ConfigError::InvalidPattern)` - A selector or the regex is invalid
    pub fn new(config: &ParserConfig) -> Result<Self, ConfigError> {
        let count = Regex::new(&config.count_pattern).map_err(|e| {
            ConfigError::InvalidPattern(format!(
                "count-pattern '{}': {}",
                config.count_pattern, e
            ))
        })?;

        if count.captures_len() < 2 {
            return Err(ConfigError::InvalidPattern(format!(
                "count-pattern '{}' needs a capture group for the count",
                config.count_pattern
            )));
        }

        Ok(Self {
            record: compile_selector("record", &config.record)?,
            link: compile_selector("link", &config.link)?,
            note: compile_selector("note", &config.note)?,
            image: compile_selector("image", &config.image)?,
            base: compile_selector("base", "base[href]")?,
            count,
        })
    }

    fn parse_record(
        &self,
        element: ElementRef<'_>,
        base: &Url,
        page_url: &Url,
        index: usize,
    ) -> Result<RawRecord, ParseError> {
        let missing = |field: &'static str| ParseError::MissingField {
            page_url: page_url.to_string(),
            index,
            field,
        };

        let link = element.select(&self.link).next().ok_or_else(|| missing("link"))?;

        let href = link
            .value()
            .attr("href")
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .ok_or_else(|| missing("url"))?;

        let name = collapse_text(link);
        if name.is_empty() {
            return Err(missing("name"));
        }

        let url = base.join(href).map_err(|_| ParseError::InvalidHref {
            page_url: page_url.to_string(),
            index,
            href: href.to_string(),
        })?;

        let note = element
            .select(&self.note)
            .next()
            .map(collapse_text)
            .filter(|note| !note.is_empty());

        let images = element
            .select(&self.image)
            .filter_map(|img| img.value().attr("src"))
            .map(str::trim)
            .filter(|src| !src.is_empty())
            .filter_map(|src| match base.join(src) {
                Ok(url) => Some(url.to_string()),
                Err(e) => {
                    tracing::debug!("Ignoring image '{}' on {}: {}", src, page_url, e);
                    None
                }
            })
            .collect();

        Ok(RawRecord {
            url: url.to_string(),
            name,
            note,
            images,
        })
    }

    /// Base for relative links: `<base href>` if present, else the site root
    ///
    /// Listing sites built on TYPO3 emit site-root-relative hrefs without a
    /// leading slash, so the page URL itself is the wrong base.
    fn document_base(&self, document: &Html, page_url: &Url) -> Url {
        document
            .select(&self.base)
            .next()
            .and_then(|base| base.value().attr("href"))
            .and_then(|href| page_url.join(href.trim()).ok())
            .or_else(|| page_url.join("/").ok())
            .unwrap_or_else(|| page_url.clone())
    }
}

impl RecordParser for ShelterParser {
    fn count_signal(&self, page: &Page) -> Result<Option<usize>, PlanError> {
        let text = page.text();
        let Some(captures) = self.count.captures(&text) else {
            return Ok(None);
        };

        let raw = captures.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        raw.parse::<usize>()
            .map(Some)
            .map_err(|_| PlanError::InvalidCount {
                page_url: page.url.to_string(),
                raw: raw.to_string(),
            })
    }

    fn records(&self, page: &Page) -> ParsedPage {
        let text = page.text();
        let document = Html::parse_document(&text);
        let base = self.document_base(&document, &page.url);

        let mut parsed = ParsedPage::default();
        for (position, element) in document.select(&self.record).enumerate() {
            match self.parse_record(element, &base, &page.url, position + 1) {
                Ok(record) => parsed.records.push(record),
                Err(e) => {
                    tracing::warn!("Skipping listing: {}", e);
                    parsed.failures.push(e);
                }
            }
        }

        parsed.records = dedup_by_identity(parsed.records);
        parsed
    }
}

fn compile_selector(name: &str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| {
        ConfigError::InvalidPattern(format!("{} selector '{}': {:?}", name, selector, e))
    })
}

/// Element text with runs of whitespace collapsed to single spaces
fn collapse_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
