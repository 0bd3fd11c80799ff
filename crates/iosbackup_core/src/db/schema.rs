//! Schema probes used to pick between known database layouts.

use super::DbResult;
use rusqlite::Connection;

/// Returns whether `table` exists in the main schema.
pub fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Returns whether `table` has a column named `column`.
///
/// Returns `false` when the table itself does not exist.
pub fn table_has_column(conn: &Connection, table: &str, column: &str) -> DbResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current.eq_ignore_ascii_case(column) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Returns the first of `candidates` present on `table`.
pub fn first_existing_column(
    conn: &Connection,
    table: &str,
    candidates: &[&'static str],
) -> DbResult<Option<&'static str>> {
    for &candidate in candidates {
        if table_has_column(conn, table, candidate)? {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}
