//! Batch reporting: per-source outcomes, written as JSON on request.

pub mod events;

use std::path::Path;

use crate::error::Result;

pub use events::{BatchReport, SourceOutcome, SourceStatus};

/// Write `report` as pretty JSON, creating parent directories.
pub fn write_report(path: &Path, report: &BatchReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(report).map_err(std::io::Error::other)?;
    std::fs::write(path, json)?;
    Ok(())
}
