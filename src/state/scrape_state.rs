/// Scrape state definitions for tracking one source through the pipeline
///
/// A source moves strictly forward through these states; any non-terminal
/// state may fall through to `Failed`.
use std::fmt;

/// Represents the current state of a source scrape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrapeState {
    // ===== Active States =====
    /// Nothing fetched yet
    Init,

    /// Every seed page has been fetched and parsed
    SeedFetched,

    /// Additional page pointers are being computed per seed
    Planning,

    /// Additional page fetches have been launched
    FanOut,

    /// Waiting for launched pages to report
    Collecting,

    // ===== Terminal States =====
    /// All pages reported and the batches were merged
    Done,

    /// A fatal fetch, parse or plan error aborted the source
    Failed,
}

impl ScrapeState {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if the source finished with data
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: ScrapeState) -> bool {
        match (self, next) {
            (Self::Init, Self::SeedFetched)
            | (Self::SeedFetched, Self::Planning)
            | (Self::Planning, Self::FanOut)
            | (Self::FanOut, Self::Collecting)
            | (Self::Collecting, Self::Done) => true,
            (from, Self::Failed) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Short lowercase label used in logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::SeedFetched => "seed_fetched",
            Self::Planning => "planning",
            Self::FanOut => "fan_out",
            Self::Collecting => "collecting",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ScrapeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
