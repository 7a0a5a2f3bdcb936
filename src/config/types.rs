use serde::Deserialize;

/// Main configuration structure for Shelter-Scrape
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceConfig>,
}

/// Pagination and fan-out behavior
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Number of listings the site shows per result page
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: usize,

    /// Query parameter carrying the 1-based page pointer
    #[serde(rename = "pointer-param", default = "default_pointer_param")]
    pub pointer_param: String,

    /// Upper bound on in-flight page fetches per source; absent means uncapped
    #[serde(rename = "max-concurrent-fetches", default)]
    pub max_concurrent_fetches: Option<usize>,

    /// Order in which additional-page batches are merged
    #[serde(rename = "page-order", default)]
    pub page_order: PageOrder,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            pointer_param: default_pointer_param(),
            max_concurrent_fetches: None,
            page_order: PageOrder::default(),
        }
    }
}

/// Merge order for additional pages (seed pages always come first, in declaration order)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageOrder {
    /// Batches are appended as their fetches complete
    #[default]
    Completion,
    /// Batches are sorted by seed, then by page pointer
    Site,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the scraper
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the scraper
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the scraper
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for scraper-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory under which each run creates its snapshot directory
    pub directory: String,

    /// Keep the raw bytes of every fetched page in the snapshot
    #[serde(rename = "archive-pages", default = "default_true")]
    pub archive_pages: bool,

    /// Write a markdown run summary into the snapshot
    #[serde(default = "default_true")]
    pub summary: bool,
}

/// Markup patterns used by the listing parser
///
/// Defaults target the tierschutz-berlin.de adoption listings.
#[derive(Debug, Clone, Deserialize)]
pub struct ParserConfig {
    /// CSS selector matching one listing
    #[serde(default = "default_record_selector")]
    pub record: String,

    /// CSS selector (inside a listing) for the anchor carrying URL and name
    #[serde(default = "default_link_selector")]
    pub link: String,

    /// CSS selector (inside a listing) for the free-text note
    #[serde(default = "default_note_selector")]
    pub note: String,

    /// CSS selector (inside a listing) for image elements
    #[serde(default = "default_image_selector")]
    pub image: String,

    /// Regex over the raw page markup whose first capture group holds the total
    /// listing count
    ///
    /// The default only matches the dedicated `<td>` marker cell, so listing
    /// notes mentioning "(2 Tiere)" are never taken for the count.
    #[serde(rename = "count-pattern", default = "default_count_pattern")]
    pub count_pattern: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            record: default_record_selector(),
            link: default_link_selector(),
            note: default_note_selector(),
            image: default_image_selector(),
            count_pattern: default_count_pattern(),
        }
    }
}

/// One named source with its seed URLs
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Source name, also used as the snapshot file name
    pub name: String,

    /// Seed listing pages, fetched in this order
    pub seeds: Vec<String>,
}

fn default_page_size() -> usize {
    10
}

fn default_pointer_param() -> String {
    "tx_realty_pi1[pointer]".to_string()
}

fn default_true() -> bool {
    true
}

fn default_record_selector() -> String {
    "table.item".to_string()
}

fn default_link_selector() -> String {
    "h3 > a".to_string()
}

fn default_note_selector() -> String {
    "p.orange".to_string()
}

fn default_image_selector() -> String {
    "td.image img".to_string()
}

fn default_count_pattern() -> String {
    r"<td>(?:\s|&nbsp;)*\(\s*([^()\s]*)\s+Tiere\s*\)\s*</td>".to_string()
}
