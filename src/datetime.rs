//! Date/time and size formatting utilities for Hoard.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a timestamp as RFC3339 with millisecond precision.
pub fn to_rfc3339(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Describe how long ago `dt` was, relative to `now`.
///
/// Anything older than a week is shown as a plain date (`YYYY/MM/DD`).
pub fn format_relative(dt: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(*dt);

    let minutes = diff.num_minutes();
    let hours = diff.num_hours();
    let days = diff.num_days();

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{minutes} minutes ago")
    } else if hours < 24 {
        format!("{hours} hours ago")
    } else if days < 7 {
        format!("{days} days ago")
    } else {
        dt.format("%Y/%m/%d").to_string()
    }
}

/// Format a byte count for display, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    // Two decimals, trailing zeros trimmed.
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}
