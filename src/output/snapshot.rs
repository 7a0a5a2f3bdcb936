//! Snapshot directory handling
//!
//! Every run writes into a fresh `data-YYYYMMDDHHMMSS` directory: archived
//! pages, one JSON file per successful source and the run summary.

use crate::output::OutputResult;
use crate::scrape::Record;
use chrono::{DateTime, Local};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// One run's output directory
#[derive(Debug, Clone)]
pub struct Snapshot {
    dir: PathBuf,
    started_at: DateTime<Local>,
}

impl Snapshot {
    /// Creates `<root>/data-<timestamp>`
    ///
    /// The root is created if needed; the snapshot directory itself must not
    /// exist yet.
    pub fn create(root: &Path, started_at: DateTime<Local>) -> OutputResult<Self> {
        fs::create_dir_all(root)?;
        let dir = root.join(snapshot_dir_name(&started_at));
        fs::create_dir(&dir)?;

        tracing::info!("Writing snapshot to {}", dir.display());
        Ok(Self { dir, started_at })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// Writes `<source>.json` holding the merged records
    pub fn write_records(&self, source: &str, records: &[Record]) -> OutputResult<PathBuf> {
        let path = self.dir.join(format!("{}.json", source));
        let json = serde_json::to_vec_pretty(records)?;
        fs::write(&path, json)?;

        tracing::debug!("Saved {} records to {}", records.len(), path.display());
        Ok(path)
    }
}

/// `data-YYYYMMDDHHMMSS`
pub fn snapshot_dir_name(started_at: &DateTime<Local>) -> String {
    format!("data-{}", started_at.format("%Y%m%d%H%M%S"))
}

/// File name an archived page is stored under
///
/// The last path segment is kept and followed by the first eight hex digits of
/// the SHA-256 of the full path, so equally named pages in different
/// directories stay apart. A query string is folded in after the hash so that
/// paginated variants of the same listing do not overwrite each other.
///
/// # Examples
///
/// ```
/// use shelter_scrape::output::archive_file_name;
/// use url::Url;
///
/// let url = Url::parse("http://example.com/tiervermittlung/hunde.html").unwrap();
/// assert_eq!(archive_file_name(&url), "hunde_a1877812.html");
/// ```
pub fn archive_file_name(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or("index");

    let (stem, extension) = match segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, ext),
        _ => (segment, "html"),
    };

    let mut name = format!("{}_{}", stem, path_digest(url.path()));

    let query: Vec<String> = url
        .query_pairs()
        .map(|(key, value)| format!("{}-{}", key, value))
        .collect();
    if !query.is_empty() {
        name.push('_');
        name.push_str(&query.join("_"));
    }

    format!("{}.{}", sanitize(&name), sanitize(extension))
}

fn path_digest(path: &str) -> String {
    let digest = Sha256::digest(path.as_bytes());
    hex::encode(&digest[..4])
}

fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_snapshot_dir_name() {
        let at = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(snapshot_dir_name(&at), "data-20240307090501");
    }

    #[test]
    fn test_archive_file_name_plain() {
        let seed = url("http://www.tierschutz-berlin.de/nc/tierheim/tiervermittlung/hunde.html");
        assert_eq!(archive_file_name(&seed), "hunde_c821e1f8.html");
    }

    #[test]
    fn test_archive_file_name_with_pointer() {
        let paged = url(
            "http://www.tierschutz-berlin.de/nc/tierheim/tiervermittlung/hunde.html\
             ?tx_realty_pi1%5Bpointer%5D=3",
        );
        assert_eq!(
            archive_file_name(&paged),
            "hunde_c821e1f8_tx_realty_pi1_pointer_-3.html"
        );
    }

    #[test]
    fn test_archive_file_name_without_segment() {
        assert_eq!(archive_file_name(&url("http://example.com/")), "index_8a5edab2.html");
        assert_eq!(archive_file_name(&url("http://example.com/list/")), "list_e3a0362b.html");
    }

    #[test]
    fn test_archive_file_name_separates_directories() {
        let first = archive_file_name(&url("http://example.com/a/list.html"));
        let second = archive_file_name(&url("http://example.com/b/list.html"));

        assert_eq!(first, "list_cf93f28a.html");
        assert_eq!(second, "list_e4e85e12.html");
    }

    #[test]
    fn test_snapshot_writes_records() {
        let root = tempfile::tempdir().unwrap();
        let at = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let snapshot = Snapshot::create(root.path(), at).unwrap();

        assert_eq!(snapshot.dir(), root.path().join("data-20240102030405"));

        let records = vec![Record {
            name: "Bello".to_string(),
            url: "http://example.com/bello.html".to_string(),
            note: Some("lieb".to_string()),
            images: vec!["http://example.com/bello.jpg".to_string()],
        }];
        let path = snapshot.write_records("dogs", &records).unwrap();

        let stored: serde_json::Value =
            serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(stored[0]["name"], "Bello");
        assert_eq!(stored[0]["images"][0], "http://example.com/bello.jpg");
    }

    #[test]
    fn test_snapshot_refuses_existing_directory() {
        let root = tempfile::tempdir().unwrap();
        let at = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        Snapshot::create(root.path(), at).unwrap();
        assert!(Snapshot::create(root.path(), at).is_err());
    }
}
