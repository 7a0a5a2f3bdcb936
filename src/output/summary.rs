//! Markdown run summary
//!
//! A human-readable overview of one run: which configuration produced it, how
//! each source ended, how many records were merged and which listings were
//! skipped.

use crate::output::OutputResult;
use crate::scrape::SourceOutcome;
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Inputs of the summary that are not part of the outcomes
#[derive(Debug, Clone)]
pub struct RunInfo {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub config_hash: String,
}

/// Writes the markdown summary to `output_path`
pub fn write_summary(
    info: &RunInfo,
    outcomes: &[SourceOutcome],
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_summary(info, outcomes);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats the run summary as markdown
pub fn format_summary(info: &RunInfo, outcomes: &[SourceOutcome]) -> String {
    let mut md = String::new();

    md.push_str("# Shelter-Scrape Run Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!(
        "- **Started**: {}\n",
        info.started_at.format("%Y-%m-%d %H:%M:%S")
    ));
    md.push_str(&format!(
        "- **Finished**: {}\n",
        info.finished_at.format("%Y-%m-%d %H:%M:%S")
    ));
    let duration = info.finished_at - info.started_at;
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n",
        duration.num_milliseconds() as f64 / 1000.0
    ));
    md.push_str(&format!("- **Config Hash**: {}\n\n", info.config_hash));

    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    let total_records: usize = outcomes
        .iter()
        .filter_map(|o| o.report())
        .map(|r| r.records.len())
        .sum();

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Sources**: {}\n", outcomes.len()));
    md.push_str(&format!("- **Succeeded**: {}\n", succeeded));
    md.push_str(&format!("- **Failed**: {}\n", outcomes.len() - succeeded));
    md.push_str(&format!("- **Records**: {}\n\n", total_records));

    md.push_str("## Sources\n\n");
    md.push_str("| Source | State | Pages | Records | Skipped |\n");
    md.push_str("|--------|-------|-------|---------|---------|\n");
    for outcome in outcomes {
        match outcome.report() {
            Some(report) => md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                outcome.name,
                outcome.state,
                report.pages_fetched,
                report.records.len(),
                report.skipped.len()
            )),
            None => md.push_str(&format!("| {} | {} | - | - | - |\n", outcome.name, outcome.state)),
        }
    }
    md.push('\n');

    let failures: Vec<_> = outcomes
        .iter()
        .filter_map(|o| o.result.as_ref().err().map(|e| (&o.name, e)))
        .collect();
    if !failures.is_empty() {
        md.push_str("## Failures\n\n");
        for (name, error) in failures {
            md.push_str(&format!("- **{}**: {}\n", name, error));
        }
        md.push('\n');
    }

    let skipped: Vec<_> = outcomes
        .iter()
        .filter_map(|o| o.report())
        .flat_map(|r| r.skipped.iter().map(move |e| (&r.name, e)))
        .collect();
    if !skipped.is_empty() {
        md.push_str("## Skipped Listings\n\n");
        for (name, error) in skipped {
            md.push_str(&format!("- {}: {}\n", name, error));
        }
        md.push('\n');
    }

    md
}
