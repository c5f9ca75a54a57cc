//! CSV Export
//!
//! Flattens a report into one row per decoded parameter. Calls and logs that
//! did not decode still get a single row so nothing silently disappears.

use std::path::Path;

use anyhow::Result;

use super::DecodedReport;
use crate::domain::abi::{CallDecoding, DecodedParameter, LogDecoding};

const HEADER: [&str; 9] = [
    "source",
    "address",
    "status",
    "name",
    "signature",
    "param",
    "type",
    "value",
    "indexed",
];

/// Write a report to CSV file
pub fn write_report(path: &Path, report: &DecodedReport) -> Result<usize> {
    let mut wtr = csv::Writer::from_path(path)?;
    let rows = report_rows(report);

    // Write header
    wtr.write_record(HEADER)?;

    // Write data rows
    for row in &rows {
        wtr.write_record(row)?;
    }

    wtr.flush()?;
    Ok(rows.len())
}

fn report_rows(report: &DecodedReport) -> Vec<[String; 9]> {
    let mut rows = Vec::new();
    let to = report.to.clone().unwrap_or_default();

    match &report.call {
        Some(CallDecoding::Decoded(call)) => {
            for param in &call.params {
                rows.push(param_row(
                    "call",
                    &to,
                    "decoded",
                    call.function_name(),
                    &call.signature,
                    param,
                ));
            }
            if call.params.is_empty() {
                rows.push(status_row("call", &to, "decoded", call.function_name(), &call.signature));
            }
        }
        Some(CallDecoding::Unrecognized { selector }) => {
            let selector = selector.as_ref().map(|s| s.as_str()).unwrap_or("");
            rows.push(status_row("call", &to, "unrecognized", "", selector));
        }
        Some(CallDecoding::PlainTransfer) => {
            rows.push(status_row("call", &to, "plain_transfer", "", ""));
        }
        None => {}
    }

    for (idx, log) in report.logs.iter().enumerate() {
        let source = format!("log{}", idx);
        match log {
            LogDecoding::Decoded { address, event } => {
                for param in &event.params {
                    rows.push(param_row(
                        &source,
                        address,
                        "decoded",
                        &event.name,
                        &event.signature,
                        param,
                    ));
                }
                if event.params.is_empty() {
                    rows.push(status_row(&source, address, "decoded", &event.name, &event.signature));
                }
            }
            LogDecoding::NeedAbi { address } => {
                rows.push(status_row(&source, address, "need_abi", "", ""));
            }
            LogDecoding::Unrecognized { address, topic } => {
                rows.push(status_row(
                    &source,
                    address,
                    "unrecognized",
                    "",
                    topic.as_deref().unwrap_or(""),
                ));
            }
        }
    }

    rows
}

fn param_row(
    source: &str,
    address: &str,
    status: &str,
    name: &str,
    signature: &str,
    param: &DecodedParameter,
) -> [String; 9] {
    [
        source.to_string(),
        address.to_string(),
        status.to_string(),
        name.to_string(),
        signature.to_string(),
        param.name.clone(),
        param.kind.clone(),
        param.value.clone(),
        param.indexed.to_string(),
    ]
}

fn status_row(source: &str, address: &str, status: &str, name: &str, signature: &str) -> [String; 9] {
    [
        source.to_string(),
        address.to_string(),
        status.to_string(),
        name.to_string(),
        signature.to_string(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::abi::{decode_call, AbiDescriptor, AbiParameter};

    #[test]
    fn test_rows_cover_every_outcome() {
        let abi = vec![AbiDescriptor::function(
            "transfer",
            vec![AbiParameter::new("to", "address"), AbiParameter::new("amount", "uint256")],
        )];
        let input = format!("0xa9059cbb{:064x}{:064x}", 1, 2);
        let report = DecodedReport {
            tx_hash: None,
            to: Some("0x01".to_string()),
            call: Some(decode_call(&input, &abi)),
            logs: vec![
                LogDecoding::NeedAbi {
                    address: "0x02".to_string(),
                },
                LogDecoding::Unrecognized {
                    address: "0x01".to_string(),
                    topic: Some("0xabcd".to_string()),
                },
            ],
        };

        let rows = report_rows(&report);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0][3], "transfer");
        assert_eq!(rows[1][5], "amount");
        assert_eq!(rows[1][7], "2");
        assert_eq!(rows[2][0], "log0");
        assert_eq!(rows[2][2], "need_abi");
        assert_eq!(rows[3][4], "0xabcd");
    }
}
