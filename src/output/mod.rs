//! Output module for persisting scrape results
//!
//! This module handles:
//! - Creating the timestamped snapshot directory of a run
//! - Naming archived pages
//! - Writing per-source record files as JSON
//! - Generating the markdown run summary

mod snapshot;
mod summary;

pub use snapshot::{archive_file_name, snapshot_dir_name, Snapshot};
pub use summary::{format_summary, write_summary, RunInfo};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
