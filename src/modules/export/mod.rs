//! Export Module
//!
//! Writes decoded calls and logs to disk.
//!
//! - `.csv` → one row per decoded parameter
//! - anything else → pretty JSON of the whole report
//! - Default files land in `<data_dir>/exports/`

mod csv_export;
mod json_export;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use tracing::info;

use crate::domain::abi::{CallDecoding, LogDecoding};

/// Everything decoded for one transaction or one ad-hoc input
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecodedReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    /// Contract the call data was sent to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call: Option<CallDecoding>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<LogDecoding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    /// Pick the format from the file extension; JSON unless `.csv`
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Json,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

/// Get the export directory under `data_dir`, creating it if needed
pub fn export_dir(data_dir: &Path) -> Result<PathBuf> {
    let dir = data_dir.join("exports");
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;
    Ok(dir)
}

/// Generate a timestamped filename
pub fn generate_filename(prefix: &str, format: ExportFormat) -> String {
    let timestamp = Local::now().format("%Y-%m-%d-%H%M%S");
    format!("{}-{}.{}", prefix, timestamp, format.extension())
}

/// Write a report; returns the number of records written
///
/// A record is a CSV row or, for JSON, one call or log entry.
pub fn export_report(path: &Path, report: &DecodedReport) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let format = ExportFormat::from_path(path);
    let count = match format {
        ExportFormat::Csv => csv_export::write_report(path, report),
        ExportFormat::Json => json_export::write_report(path, report),
    }
    .with_context(|| format!("Export to {} failed", path.display()))?;

    info!(path = %path.display(), records = count, ?format, "exported report");
    Ok(count)
}
