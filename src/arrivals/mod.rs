//! Airport arrivals board
//!
//! Parses the Prague airport arrivals page: a "last update" header and a table
//! of rows carrying a time, a flight code and a city. Code-share rows that
//! follow each other with the same time and city are folded into one flight.

use crate::scrape::{coalesce_adjacent, Page, PageFetcher};
use crate::{ConfigError, ParseError, ScrapeError};
use chrono::{NaiveDateTime, NaiveTime};
use regex::Regex;
use std::fmt;
use url::Url;

const ROW_PATTERN: &str = r#"<tr>\s*<td><div>\s*([0-9]{2}:[0-9]{2})</div></td>\s*<td><div><div class="flightNumber">([A-Z0-9]{2} [0-9]{1,4})</div><span class="flID">\d*</span></div></td>\s*<td><div>(.*?)</div></td>"#;
const LAST_UPDATE_PATTERN: &str = r"Poslední aktualizace:\s*([0-9.: ]*)</div>";

/// One table row before coalescing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFlight {
    pub time: NaiveTime,
    pub city: String,
    pub code: String,
}

/// An arrival, possibly shared by several flight codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flight {
    pub time: NaiveTime,
    pub city: String,
    pub codes: Vec<String>,
}

impl From<RawFlight> for Flight {
    fn from(raw: RawFlight) -> Self {
        Self {
            time: raw.time,
            city: raw.city,
            codes: vec![raw.code],
        }
    }
}

impl fmt::Display for Flight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Time: {} City: {} Codes: {:?}",
            self.time.format("%H:%M"),
            self.city,
            self.codes
        )
    }
}

/// The parsed arrivals page
#[derive(Debug, Clone)]
pub struct ArrivalsBoard {
    pub last_update: NaiveDateTime,
    pub flights: Vec<Flight>,

    /// Rows that matched the table layout but carried an unreadable time
    pub skipped: Vec<ParseError>,
}

/// Compiled patterns for the arrivals page
#[derive(Debug, Clone)]
pub struct ArrivalsParser {
    row: Regex,
    last_update: Regex,
}

impl ArrivalsParser {
    pub fn new() -> Result<Self, ConfigError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern(e.to_string()))
        };

        Ok(Self {
            row: compile(ROW_PATTERN)?,
            last_update: compile(LAST_UPDATE_PATTERN)?,
        })
    }

    /// Parses the header timestamp and all flight rows
    pub fn parse(&self, page: &Page) -> Result<ArrivalsBoard, ParseError> {
        let text = page.text();
        let last_update = self.last_update(&text, page.url.as_str())?;

        let mut rows = Vec::new();
        let mut skipped = Vec::new();
        for caps in self.row.captures_iter(&text) {
            let raw_time = &caps[1];
            match NaiveTime::parse_from_str(raw_time, "%H:%M") {
                Ok(time) => rows.push(RawFlight {
                    time,
                    city: caps[3].trim().to_string(),
                    code: caps[2].to_string(),
                }),
                Err(_) => {
                    let error = ParseError::Malformed {
                        page_url: page.url.to_string(),
                        raw: raw_time.to_string(),
                        expected: "arrival time",
                    };
                    tracing::warn!("Skipping flight row: {}", error);
                    skipped.push(error);
                }
            }
        }

        Ok(ArrivalsBoard {
            last_update,
            flights: coalesce_flights(rows),
            skipped,
        })
    }

    fn last_update(&self, text: &str, page_url: &str) -> Result<NaiveDateTime, ParseError> {
        let raw = self
            .last_update
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .ok_or_else(|| ParseError::MissingMarker {
                page_url: page_url.to_string(),
                marker: "Poslední aktualizace",
            })?;

        NaiveDateTime::parse_from_str(raw, "%d.%m.%Y %H:%M").map_err(|_| ParseError::Malformed {
            page_url: page_url.to_string(),
            raw: raw.to_string(),
            expected: "update timestamp",
        })
    }
}

/// Folds consecutive rows with equal time and city into one flight
pub fn coalesce_flights(rows: impl IntoIterator<Item = RawFlight>) -> Vec<Flight> {
    coalesce_adjacent(
        rows.into_iter().map(Flight::from),
        |flight| (flight.time, flight.city.clone()),
        |kept, duplicate| kept.codes.extend(duplicate.codes),
    )
}

/// Fetches and parses an arrivals page
pub async fn fetch_board(
    fetcher: &dyn PageFetcher,
    url: &Url,
) -> Result<ArrivalsBoard, ScrapeError> {
    let parser = ArrivalsParser::new()?;
    let page = fetcher.fetch(url).await?;
    let board = parser.parse(&page)?;

    tracing::info!(
        "Arrivals board updated {}: {} flights",
        board.last_update,
        board.flights.len()
    );
    Ok(board)
}
