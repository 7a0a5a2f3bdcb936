//! HTTP fetcher implementation
//!
//! This module handles all network retrieval for the scraper:
//! - Building the HTTP client with a descriptive user agent
//! - Plain GET requests, no retries, transport-default timeouts and redirects
//! - Classifying non-success statuses and transport failures as `FetchError`
//! - Optional archival of the fetched bytes into the snapshot directory

use crate::config::UserAgentConfig;
use crate::output::archive_file_name;
use crate::scrape::record::Page;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Retrieves the raw bytes behind a URL
///
/// Implementations perform exactly one attempt; retrying is never the
/// fetcher's business.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Page, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Example
///
/// ```no_run
/// use shelter_scrape::config::UserAgentConfig;
/// use shelter_scrape::scrape::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "shelter-scrape".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent_string(config))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Format: CrawlerName/Version (+ContactURL; ContactEmail)
pub fn user_agent_string(config: &UserAgentConfig) -> String {
    format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    )
}

/// `PageFetcher` backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Page, FetchError> {
        let response =
            self.client
                .get(url.clone())
                .send()
                .await
                .map_err(|source| FetchError::Transport {
                    url: url.to_string(),
                    source,
                })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        tracing::debug!("Fetched {} ({} bytes)", url, body.len());
        Ok(Page::new(url.clone(), body.to_vec()))
    }
}

/// Wraps another fetcher and stores every successfully fetched body on disk
///
/// Files land in `directory` under a name derived from the URL's last path
/// segment, a path digest and the query (see [`archive_file_name`]).
pub struct ArchivingFetcher {
    inner: Arc<dyn PageFetcher>,
    directory: PathBuf,
}

impl ArchivingFetcher {
    pub fn new(inner: Arc<dyn PageFetcher>, directory: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            directory: directory.into(),
        }
    }
}

#[async_trait]
impl PageFetcher for ArchivingFetcher {
    async fn fetch(&self, url: &Url) -> Result<Page, FetchError> {
        let page = self.inner.fetch(url).await?;

        let path = self.directory.join(archive_file_name(url));
        tokio::fs::write(&path, &page.body)
            .await
            .map_err(|source| FetchError::Archive {
                url: url.to_string(),
                path: path.display().to_string(),
                source,
            })?;

        tracing::trace!("Archived {} to {}", url, path.display());
        Ok(page)
    }
}
