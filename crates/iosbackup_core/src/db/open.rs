//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open backup database files in read-only mode.
//! - Configure connection pragmas required by extraction.
//!
//! # Invariants
//! - Returned connections cannot write to the backup. Files open as
//!   `immutable`, so SQLite creates no `-wal`, `-shm` or `-journal` siblings.
//! - Missing files are reported as `DbError::MissingFile`, never created.

use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use url::Url;
use std::time::{Duration, Instant};

/// Opens a SQLite database file read-only.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_readonly(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    let started_at = Instant::now();
    info!(
        "event=db_open module=db status=start mode=readonly path={}",
        path.display()
    );

    let opened = if path.is_file() {
        connect(path)
    } else {
        Err(("db_missing", DbError::MissingFile(path.to_path_buf())))
    };

    let elapsed_ms = started_at.elapsed().as_millis();
    match opened {
        Ok(conn) => {
            info!("event=db_open module=db status=ok mode=readonly duration_ms={elapsed_ms}");
            Ok(conn)
        }
        Err((code, err)) => {
            error!(
                "event=db_open module=db status=error mode=readonly duration_ms={elapsed_ms} error_code={code} error={err}"
            );
            Err(err)
        }
    }
}

fn connect(path: &Path) -> Result<Connection, (&'static str, DbError)> {
    let uri = immutable_uri(path).map_err(|err| ("db_uri_invalid", err))?;
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(uri.as_str(), flags)
        .map_err(|err| ("db_open_failed", DbError::from(err)))?;
    configure(&conn).map_err(|err| ("db_bootstrap_failed", DbError::from(err)))?;
    Ok(conn)
}

/// `file:` URI for `path` with `mode=ro&immutable=1`.
fn immutable_uri(path: &Path) -> DbResult<Url> {
    let absolute = path
        .canonicalize()
        .map_err(|_| DbError::InvalidPath(path.to_path_buf()))?;
    let mut uri =
        Url::from_file_path(&absolute).map_err(|()| DbError::InvalidPath(path.to_path_buf()))?;
    uri.set_query(Some("mode=ro&immutable=1"));
    Ok(uri)
}

fn configure(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute_batch("PRAGMA query_only = ON;")?;
    // Forces the header read so a non-database blob fails here, not mid-query.
    conn.query_row("SELECT COUNT(*) FROM sqlite_master;", [], |row| {
        row.get::<_, i64>(0)
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::immutable_uri;

    #[test]
    fn uri_escapes_path_and_sets_immutable() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("a b#1?.db");
        std::fs::write(&db, b"").unwrap();

        let uri = immutable_uri(&db).unwrap();
        assert_eq!(uri.scheme(), "file");
        assert_eq!(uri.query(), Some("mode=ro&immutable=1"));
        assert!(uri.path().ends_with("/a%20b%231%3F.db"));
        assert_eq!(uri.to_file_path().unwrap(), db.canonicalize().unwrap());
    }
}
