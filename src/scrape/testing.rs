//! In-memory collaborators for orchestration tests
//!
//! `FakeFetcher` serves canned bodies (optionally delayed, or as HTTP errors)
//! and counts requests. `LineParser` reads a tiny line format:
//!
//! ```text
//! count=25
//! http://example.com/a.html|Anton
//! bad
//! ```

use crate::scrape::fetcher::PageFetcher;
use crate::scrape::parser::RecordParser;
use crate::scrape::record::{Page, ParsedPage, RawRecord};
use crate::{FetchError, ParseError, PlanError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

#[derive(Clone)]
enum Response {
    Body(String),
    Status(u16),
}

#[derive(Default)]
pub struct FakeFetcher {
    responses: HashMap<String, (Response, Duration)>,
    requests: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    log: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, body: impl Into<String>) -> Self {
        self.responses
            .insert(url.to_string(), (Response::Body(body.into()), Duration::ZERO));
        self
    }

    pub fn slow_page(mut self, url: &str, body: impl Into<String>, delay_ms: u64) -> Self {
        self.responses.insert(
            url.to_string(),
            (Response::Body(body.into()), Duration::from_millis(delay_ms)),
        );
        self
    }

    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.responses
            .insert(url.to_string(), (Response::Status(status), Duration::ZERO));
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, url: &Url) -> Result<Page, FetchError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(url.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let (response, delay) = self
            .responses
            .get(url.as_str())
            .cloned()
            .unwrap_or((Response::Status(404), Duration::ZERO));

        // Always yield so concurrently launched fetches overlap
        tokio::time::sleep(delay.max(Duration::from_millis(1))).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match response {
            Response::Body(body) => Ok(Page::new(url.clone(), body)),
            Response::Status(status) => Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),
        }
    }
}

pub struct LineParser;

impl RecordParser for LineParser {
    fn count_signal(&self, page: &Page) -> Result<Option<usize>, PlanError> {
        let text = page.text();
        let Some(raw) = text.lines().find_map(|line| line.strip_prefix("count=")) else {
            return Ok(None);
        };
        raw.trim()
            .parse()
            .map(Some)
            .map_err(|_| PlanError::InvalidCount {
                page_url: page.url.to_string(),
                raw: raw.trim().to_string(),
            })
    }

    fn records(&self, page: &Page) -> ParsedPage {
        let mut parsed = ParsedPage::default();
        let text = page.text();
        let listings = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with("count="));

        for (position, line) in listings.enumerate() {
            match line.split_once('|') {
                Some((url, name)) => parsed.records.push(RawRecord {
                    url: url.to_string(),
                    name: name.to_string(),
                    note: None,
                    images: vec![],
                }),
                None => parsed.failures.push(ParseError::MissingField {
                    page_url: page.url.to_string(),
                    index: position + 1,
                    field: "name",
                }),
            }
        }
        parsed
    }
}

/// Body with a count line followed by `n` listings named `{prefix}{i}`
pub fn listing_body(count: Option<usize>, prefix: &str, range: std::ops::Range<usize>) -> String {
    let mut body = String::new();
    if let Some(count) = count {
        body.push_str(&format!("count={}\n", count));
    }
    for i in range {
        body.push_str(&format!("http://shelter.test/{prefix}{i}.html|{prefix}{i}\n"));
    }
    body
}
