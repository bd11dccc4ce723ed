//! Report persistence.
//!
//! The report JSON file is the stable interface between the collect,
//! render, and serve subcommands. Writes are whole-file: a crash between
//! checkpoints leaves the last fully-written, still-valid file behind.

use crate::models::Report;
use anyhow::{Context, Result};
use std::path::Path;

/// Serialize the report to pretty-printed JSON and write it in one shot.
pub fn save_report(path: &Path, report: &Report) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    Ok(())
}

/// Read a report back from disk.
pub fn load_report(path: &Path) -> Result<Report> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report file: {}", path.display()))?;
    let report: Report = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse report file: {}", path.display()))?;
    Ok(report)
}
