//! Unix timestamp display

use chrono::{DateTime, Utc};

use super::ToolResult;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Current unix time in seconds
pub fn now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// `YYYY-MM-DD HH:MM:SS UTC`
pub fn format_timestamp(ts: u64) -> String {
    i64::try_from(ts)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// Coarse relative age: `12 secs ago`, `3 mins ago`, `5 hours ago`, `2 days ago`
///
/// Timestamps in the future count as zero seconds ago.
pub fn time_ago(ts: u64, now: u64) -> String {
    let diff = now.saturating_sub(ts);
    if diff < MINUTE {
        format!("{} secs ago", diff)
    } else if diff < HOUR {
        format!("{} mins ago", diff / MINUTE)
    } else if diff < DAY {
        format!("{} hours ago", diff / HOUR)
    } else {
        format!("{} days ago", diff / DAY)
    }
}

/// Timestamp as both unix seconds and human readable forms
pub fn timestamp(ts: u64) -> ToolResult {
    ToolResult::new("Timestamp")
        .add("unix", ts.to_string())
        .add("utc", format_timestamp(ts))
        .add("age", time_ago(ts, now()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
        assert_eq!(format_timestamp(1704067200), "2024-01-01 00:00:00 UTC");
        assert_eq!(format_timestamp(u64::MAX), u64::MAX.to_string());
    }

    #[test]
    fn test_time_ago() {
        let now = 1_000_000;
        assert_eq!(time_ago(now - 12, now), "12 secs ago");
        assert_eq!(time_ago(now - 185, now), "3 mins ago");
        assert_eq!(time_ago(now - 5 * HOUR, now), "5 hours ago");
        assert_eq!(time_ago(now - 2 * DAY - 1, now), "2 days ago");
        assert_eq!(time_ago(now + 30, now), "0 secs ago");
    }
}
