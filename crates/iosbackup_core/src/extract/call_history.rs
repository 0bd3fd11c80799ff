//! Phone call log (`CallHistory.storedata` or the legacy `call_history.db`).

use super::time::{from_apple_seconds, from_unix_seconds};
use super::{open_category_db, DbLocation, ExtractError, ExtractResult};
use crate::backup::domains::{
    CALL_HISTORY_FILE, HOME_DOMAIN, LEGACY_CALL_HISTORY_FILE, WIRELESS_DOMAIN,
};
use crate::db::table_exists;
use crate::model::call::{CallRecord, CallStats, CallType};
use crate::session::BackupSession;
use chrono::{DateTime, Utc};
use log::info;
use rusqlite::types::Value;
use rusqlite::{Connection, Row};

const DATABASE: &str = "CallHistory";
const LOCATIONS: &[DbLocation] = &[
    DbLocation::Suffix {
        domain: HOME_DOMAIN,
        file: CALL_HISTORY_FILE,
    },
    DbLocation::Suffix {
        domain: WIRELESS_DOMAIN,
        file: LEGACY_CALL_HISTORY_FILE,
    },
];

const MODERN_SQL: &str = "SELECT
    Z_PK AS id,
    ZADDRESS AS address,
    ZDATE AS date,
    ZDURATION AS duration,
    ZCALLTYPE AS call_type,
    ZANSWERED AS answered
FROM ZCALLRECORD
ORDER BY ZDATE DESC, Z_PK ASC;";

const LEGACY_SQL: &str = "SELECT
    ROWID AS id,
    address,
    date,
    duration,
    flags AS call_type,
    read AS answered
FROM call
ORDER BY date DESC, ROWID ASC;";

pub struct CallHistoryExtractor<'s> {
    session: &'s BackupSession,
}

impl<'s> CallHistoryExtractor<'s> {
    pub fn new(session: &'s BackupSession) -> Self {
        Self { session }
    }

    /// Every call, newest first.
    pub fn calls(&self) -> ExtractResult<Vec<CallRecord>> {
        let Some(conn) = open_category_db(self.session, DATABASE, LOCATIONS)? else {
            return Ok(Vec::new());
        };
        let calls = read_calls(&conn)?;
        info!("event=extract module=call_history status=ok count={}", calls.len());
        Ok(calls)
    }

    pub fn stats(&self) -> ExtractResult<CallStats> {
        Ok(call_stats(&self.calls()?))
    }
}

/// Reads call records from an opened call history database.
pub fn read_calls(conn: &Connection) -> ExtractResult<Vec<CallRecord>> {
    let (sql, to_date): (&str, fn(f64) -> Option<DateTime<Utc>>) =
        if table_exists(conn, "ZCALLRECORD")? {
            (MODERN_SQL, from_apple_seconds)
        } else if table_exists(conn, "call")? {
            (LEGACY_SQL, from_unix_seconds)
        } else {
            return Err(ExtractError::UnsupportedSchema(DATABASE));
        };

    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    let mut calls = Vec::new();
    while let Some(row) = rows.next()? {
        calls.push(parse_call_row(row, to_date)?);
    }
    Ok(calls)
}

pub fn call_stats(calls: &[CallRecord]) -> CallStats {
    let count = |kind: CallType| calls.iter().filter(|call| call.call_type == kind).count();
    CallStats {
        total_calls: calls.len(),
        incoming: count(CallType::Incoming),
        outgoing: count(CallType::Outgoing),
        missed: count(CallType::Missed),
        total_duration_secs: calls.iter().map(|call| call.duration_secs).sum(),
    }
}

fn parse_call_row(
    row: &Row<'_>,
    to_date: fn(f64) -> Option<DateTime<Utc>>,
) -> ExtractResult<CallRecord> {
    let duration = row.get::<_, Option<f64>>("duration")?.unwrap_or(0.0);
    Ok(CallRecord {
        id: row.get("id")?,
        address: address_text(row.get("address")?),
        date: row.get::<_, Option<f64>>("date")?.and_then(to_date),
        duration_secs: if duration.is_finite() && duration > 0.0 {
            duration as u64
        } else {
            0
        },
        call_type: CallType::from_code(row.get::<_, Option<i64>>("call_type")?.unwrap_or(0)),
        answered: row.get::<_, Option<i64>>("answered")?.unwrap_or(0) != 0,
    })
}

/// `ZADDRESS` is a text column on some releases and a blob on others.
fn address_text(value: Value) -> String {
    match value {
        Value::Text(text) => text,
        Value::Blob(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Value::Integer(number) => number.to_string(),
        Value::Real(_) | Value::Null => String::new(),
    }
}
