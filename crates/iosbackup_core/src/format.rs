//! Human-readable renderings shared by exports and the CLI.

use chrono::{DateTime, Utc};

const SIZE_UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

/// Date and time as rendered in transcripts and listings.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Minute precision, used for notes and call logs.
pub const DATETIME_MINUTES_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Formats a byte count with one decimal, e.g. `1.5 MB`.
pub fn format_file_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in SIZE_UNITS {
        if size < 1024.0 {
            return format!("{size:.1} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1} PB")
}

/// Call duration as `m:ss`, or `h:mm:ss` from one hour up.
pub fn format_call_duration(secs: u64) -> String {
    let minutes = secs / 60;
    let seconds = secs % 60;
    if minutes >= 60 {
        return format!("{}:{:02}:{seconds:02}", minutes / 60, minutes % 60);
    }
    format!("{minutes}:{seconds:02}")
}

/// Total talk time, e.g. `42 seconds`, `7 minutes` or `2 hours, 5 minutes`.
pub fn format_total_duration(secs: u64) -> String {
    if secs < 60 {
        return format!("{secs} seconds");
    }
    let minutes = secs / 60;
    if minutes < 60 {
        return format!("{minutes} minutes");
    }
    format!("{} hours, {} minutes", minutes / 60, minutes % 60)
}

/// Formats an optional UTC timestamp; `None` renders as an empty string.
pub fn format_datetime(value: Option<DateTime<Utc>>, pattern: &str) -> String {
    value
        .map(|date| date.format(pattern).to_string())
        .unwrap_or_default()
}
