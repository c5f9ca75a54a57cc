//! JSON Export
//!
//! Writes the whole report as pretty JSON; decoding outcomes carry a
//! `status` tag so consumers can tell decoded entries from gaps.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::Result;

use super::DecodedReport;

/// Write a report to JSON file
pub fn write_report(path: &Path, report: &DecodedReport) -> Result<usize> {
    let json = serde_json::to_string_pretty(report)?;

    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;
    file.write_all(b"\n")?;

    Ok(usize::from(report.call.is_some()) + report.logs.len())
}
