//! Shelter-Scrape: a paginated listing scraper
//!
//! This crate collects adoptable-animal listings from a paginated HTML directory.
//! Each configured source is scraped concurrently: seed pages are fetched first to
//! learn the total listing count, every additional result page is fetched in
//! parallel, and the per-page batches are merged into one ordered collection that
//! is written to a timestamped snapshot directory.

pub mod arrivals;
pub mod config;
pub mod output;
pub mod scrape;
pub mod state;

use thiserror::Error;

/// Main error type for Shelter-Scrape operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::ScrapeState,
        to: state::ScrapeState,
    },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Task for {name} did not complete: {message}")]
    Task { name: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// A single page retrieval that did not produce usable bytes
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Archiving {url} to {path} failed: {source}")]
    Archive {
        url: String,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// The URL whose retrieval failed
    pub fn url(&self) -> &str {
        match self {
            Self::Transport { url, .. } | Self::Status { url, .. } | Self::Archive { url, .. } => {
                url
            }
        }
    }
}

/// Expected markup was absent or malformed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Record #{index} on {page_url} has no {field}")]
    MissingField {
        page_url: String,
        index: usize,
        field: &'static str,
    },

    #[error("Record #{index} on {page_url} links to unresolvable href '{href}'")]
    InvalidHref {
        page_url: String,
        index: usize,
        href: String,
    },

    #[error(
        "{page_url} carries no count signal but lists {found} records (limit without pagination is {limit})"
    )]
    UnpaginatedOverflow {
        page_url: String,
        found: usize,
        limit: usize,
    },

    #[error("{page_url} has no '{marker}' marker")]
    MissingMarker {
        page_url: String,
        marker: &'static str,
    },

    #[error("{page_url}: cannot read '{raw}' as {expected}")]
    Malformed {
        page_url: String,
        raw: String,
        expected: &'static str,
    },
}

/// The count signal was present but unusable for planning
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("Count signal '{raw}' on {page_url} is not a non-negative integer")]
    InvalidCount { page_url: String, raw: String },
}

/// Result type alias for Shelter-Scrape operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use scrape::{RawRecord, Record, SourceCoordinator, SourceOutcome, ShelterScraper};
pub use state::ScrapeState;
