//! Listing, page and batch types shared by the pipeline stages

use crate::ParseError;
use serde::Serialize;
use std::fmt;
use url::Url;

/// Raw bytes retrieved for one URL
#[derive(Debug, Clone)]
pub struct Page {
    /// The URL that was requested
    pub url: Url,

    /// Response body exactly as received
    pub body: Vec<u8>,
}

impl Page {
    pub fn new(url: Url, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url,
            body: body.into(),
        }
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// A listing as extracted from one page, before merging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Absolute detail-page URL; the identity of the listing
    pub url: String,
    pub name: String,
    pub note: Option<String>,
    /// Absolute image URLs in page order
    pub images: Vec<String>,
}

impl RawRecord {
    /// Merge key: two raw records with the same URL describe the same listing
    pub fn key(&self) -> &str {
        &self.url
    }
}

/// A finalized listing in a source's output collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub name: String,
    pub url: String,
    pub note: Option<String>,
    pub images: Vec<String>,
}

impl From<RawRecord> for Record {
    fn from(raw: RawRecord) -> Self {
        Self {
            name: raw.name,
            url: raw.url,
            note: raw.note,
            images: raw.images,
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Name: {} URL: {} Note: {} Images: {:?}",
            self.name,
            self.url,
            self.note.as_deref().unwrap_or(""),
            self.images
        )
    }
}

/// Output of parsing one page: the good records and the per-record failures
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    pub records: Vec<RawRecord>,
    pub failures: Vec<ParseError>,
}

impl ParsedPage {
    /// Number of listings the page contained, including the malformed ones
    pub fn listing_count(&self) -> usize {
        self.records.len() + self.failures.len()
    }
}
