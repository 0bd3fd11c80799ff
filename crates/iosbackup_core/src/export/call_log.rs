//! CSV export for the call log.

use super::{create_dir, ExportError, ExportResult};
use crate::format::{format_call_duration, format_datetime, DATETIME_MINUTES_FORMAT};
use crate::model::call::CallRecord;
use log::info;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const HEADER: [&str; 5] = ["Date", "Phone Number", "Type", "Duration", "Answered"];

/// Writes `calls` as CSV with a header row.
pub fn write_calls_csv<W: Write>(calls: &[CallRecord], writer: W) -> ExportResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADER)?;
    for call in calls {
        csv.write_record([
            format_datetime(call.date, DATETIME_MINUTES_FORMAT).as_str(),
            call.phone_number(),
            call.call_type.name(),
            format_call_duration(call.duration_secs).as_str(),
            if call.answered { "Yes" } else { "No" },
        ])?;
    }
    csv.flush().map_err(|err| ExportError::Csv(err.into()))?;
    Ok(())
}

/// Writes the call log to `target`; returns the number of rows.
///
/// No file is created for an empty log.
pub fn export_calls_csv(calls: &[CallRecord], target: &Path) -> ExportResult<usize> {
    if calls.is_empty() {
        return Ok(0);
    }
    if let Some(parent) = target.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        create_dir(parent)?;
    }
    let file = File::create(target).map_err(|source| ExportError::Io {
        path: target.to_path_buf(),
        source,
    })?;
    write_calls_csv(calls, file)?;
    info!(
        "event=export_calls module=export status=ok count={}",
        calls.len()
    );
    Ok(calls.len())
}
