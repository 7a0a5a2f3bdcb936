//! Integration tests for the scraper
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full snapshot run end-to-end.

use shelter_scrape::config::{
    parse_config, Config, OutputConfig, ParserConfig, ScraperConfig, SourceConfig, UserAgentConfig,
};
use shelter_scrape::output::archive_file_name;
use shelter_scrape::scrape::{page_url, run_snapshot};
use shelter_scrape::ScrapeState;
use std::path::Path;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const POINTER: &str = "tx_realty_pi1[pointer]";

/// Creates a test configuration writing into `output_dir`
fn create_test_config(sources: Vec<SourceConfig>, output_dir: &Path) -> Config {
    Config {
        scraper: ScraperConfig::default(),
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            directory: output_dir.display().to_string(),
            archive_pages: true,
            summary: true,
        },
        parser: ParserConfig::default(),
        sources,
    }
}

fn source(name: &str, seeds: Vec<String>) -> SourceConfig {
    SourceConfig {
        name: name.to_string(),
        seeds,
    }
}

/// One listing block in the shelter's markup
fn listing(slug: &str, name: &str) -> String {
    format!(
        r#"<table class="item" summary="">
            <tr><td class="image"><img src="/uploads/{slug}.jpg" /></td>
            <td><h3><a href="/tiervermittlung/{slug}.html">{name}</a></h3></td></tr>
            <tr><td><p class="orange">  Sucht ein
                Zuhause </p></td></tr>
        </table>"#
    )
}

/// A result page with an optional count signal and listings `prefix{range}`
fn listing_page(count: Option<usize>, prefix: &str, range: std::ops::Range<usize>) -> String {
    let header = count
        .map(|c| format!("<table><tr><td>&nbsp;( {} Tiere )</td></tr></table>", c))
        .unwrap_or_default();
    let listings: String = range
        .map(|i| listing(&format!("{prefix}-{i}"), &format!("{prefix} {i}")))
        .collect();
    format!(
        "<html><head><title>Tiervermittlung</title></head><body>{header}{listings}</body></html>"
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

/// Mounts the pointer pages first so they take precedence over the bare seed mock
async fn mount_paginated(
    server: &MockServer,
    seed_path: &str,
    prefix: &str,
    total: usize,
) {
    let pages = total.div_ceil(10);
    for pointer in 1..pages {
        let end = ((pointer + 1) * 10).min(total);
        Mock::given(method("GET"))
            .and(path(seed_path))
            .and(query_param(POINTER, pointer.to_string()))
            .respond_with(html(listing_page(Some(total), prefix, pointer * 10..end)))
            .expect(1)
            .mount(server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path(seed_path))
        .respond_with(html(listing_page(Some(total), prefix, 0..10.min(total))))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_snapshot_single_source() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_paginated(&mock_server, "/hunde.html", "hund", 23).await;

    let output = tempfile::tempdir().unwrap();
    let config = create_test_config(
        vec![source("dogs", vec![format!("{}/hunde.html", base_url)])],
        output.path(),
    );

    let report = run_snapshot(config, "testhash").await.unwrap();

    assert_eq!(report.outcomes.len(), 1);
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.state, ScrapeState::Done);

    let records = &outcome.report().unwrap().records;
    assert_eq!(records.len(), 23);

    // The seed page's listings come first, in page order
    for (i, record) in records.iter().take(10).enumerate() {
        assert_eq!(record.name, format!("hund {}", i));
    }
    assert_eq!(
        records[0].url,
        format!("{}/tiervermittlung/hund-0.html", base_url)
    );
    assert_eq!(records[0].note.as_deref(), Some("Sucht ein Zuhause"));
    assert_eq!(records[0].images, vec![format!("{}/uploads/hund-0.jpg", base_url)]);

    let mut names: Vec<_> = records.iter().map(|r| r.name.clone()).collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), 23);

    // Snapshot contents
    let dir = &report.snapshot_dir;
    assert!(dir
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("data-"));

    let stored: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.join("dogs.json")).unwrap()).unwrap();
    assert_eq!(stored.as_array().unwrap().len(), 23);

    let seed = Url::parse(&format!("{}/hunde.html", base_url)).unwrap();
    assert!(dir.join(archive_file_name(&seed)).exists());
    for pointer in 1..=2 {
        let page = page_url(&seed, POINTER, pointer);
        assert!(dir.join(archive_file_name(&page)).exists());
    }

    let summary = std::fs::read_to_string(dir.join("summary.md")).unwrap();
    assert!(summary.contains("- **Config Hash**: testhash"));
    assert!(summary.contains("| dogs | done | 3 | 23 | 0 |"));
}

#[tokio::test]
async fn test_snapshot_isolates_failing_source() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_paginated(&mock_server, "/hunde.html", "hund", 5).await;

    Mock::given(method("GET"))
        .and(path("/katzen.html"))
        .and(query_param(POINTER, "1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/katzen.html"))
        .respond_with(html(listing_page(Some(15), "katze", 0..10)))
        .mount(&mock_server)
        .await;

    let output = tempfile::tempdir().unwrap();
    let config = create_test_config(
        vec![
            source("dogs", vec![format!("{}/hunde.html", base_url)]),
            source("cats", vec![format!("{}/katzen.html", base_url)]),
        ],
        output.path(),
    );

    let report = run_snapshot(config, "testhash").await.unwrap();

    assert_eq!(report.failed_sources(), 1);
    assert!(report.outcomes[0].is_success());
    assert_eq!(report.outcomes[0].report().unwrap().records.len(), 5);
    assert_eq!(report.outcomes[1].state, ScrapeState::Failed);

    assert!(report.snapshot_dir.join("dogs.json").exists());
    assert!(!report.snapshot_dir.join("cats.json").exists());

    let summary = std::fs::read_to_string(report.snapshot_dir.join("summary.md")).unwrap();
    assert!(summary.contains("## Failures"));
    assert!(summary.contains("returned HTTP 500"));
}

#[tokio::test]
async fn test_snapshot_without_count_signal() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/voegel.html"))
        .respond_with(html(listing_page(None, "vogel", 0..4)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let output = tempfile::tempdir().unwrap();
    let mut config = create_test_config(
        vec![source("birds", vec![format!("{}/voegel.html", base_url)])],
        output.path(),
    );
    config.output.archive_pages = false;
    config.output.summary = false;

    let report = run_snapshot(config, "testhash").await.unwrap();

    assert_eq!(report.outcomes[0].report().unwrap().records.len(), 4);
    let seed = Url::parse(&format!("{}/voegel.html", base_url)).unwrap();
    assert!(!report.snapshot_dir.join(archive_file_name(&seed)).exists());
    assert!(!report.snapshot_dir.join("summary.md").exists());
}

#[tokio::test]
async fn test_snapshot_from_parsed_config() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_paginated(&mock_server, "/hunde.html", "hund", 12).await;

    let output = tempfile::tempdir().unwrap();
    let toml = format!(
        r#"
[scraper]
max-concurrent-fetches = 1
page-order = "site"

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[output]
directory = "{}"

[[source]]
name = "dogs"
seeds = ["{}/hunde.html"]
"#,
        output.path().display().to_string().replace('\\', "/"),
        base_url
    );

    let config = parse_config(&toml).unwrap();
    let report = run_snapshot(config, "testhash").await.unwrap();

    let records = &report.outcomes[0].report().unwrap().records;
    let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
    let expected: Vec<String> = (0..12).map(|i| format!("hund {}", i)).collect();
    assert_eq!(names, expected);
}
