//! Per-category readers over the app databases embedded in a backup.
//!
//! # Responsibility
//! - Locate each category's database through the manifest.
//! - Pick a known schema layout by probing tables and columns.
//! - Map rows into the plain records of [`crate::model`].
//!
//! # Invariants
//! - Databases are opened read-only.
//! - A database that is absent from the manifest or from disk yields an empty
//!   result, not an error.
//! - An unrecognized schema is reported as [`ExtractError::UnsupportedSchema`].

use crate::db::{open_readonly, DbError};
use crate::manifest::ManifestError;
use crate::session::BackupSession;
use log::{debug, info};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod call_history;
pub mod camera_roll;
pub mod contacts;
pub mod messages;
pub mod notes;
pub mod time;

pub type ExtractResult<T> = Result<T, ExtractError>;

/// Error for category extraction.
#[derive(Debug)]
pub enum ExtractError {
    Manifest(ManifestError),
    Db(DbError),
    /// Database matched none of the known layouts.
    UnsupportedSchema(&'static str),
    InvalidData(String),
}

impl Display for ExtractError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manifest(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UnsupportedSchema(database) => {
                write!(f, "unsupported {database} database schema")
            }
            Self::InvalidData(message) => write!(f, "invalid data: {message}"),
        }
    }
}

impl Error for ExtractError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Manifest(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::UnsupportedSchema(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ManifestError> for ExtractError {
    fn from(value: ManifestError) -> Self {
        Self::Manifest(value)
    }
}

impl From<DbError> for ExtractError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for ExtractError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Where a category database may live in the manifest.
#[derive(Debug, Clone, Copy)]
pub(crate) enum DbLocation {
    /// Exact `relativePath`.
    Path {
        domain: &'static str,
        path: &'static str,
    },
    /// Any `relativePath` ending with `file`.
    Suffix {
        domain: &'static str,
        file: &'static str,
    },
}

/// Returns the first candidate whose blob exists on disk.
pub(crate) fn locate_database(
    session: &BackupSession,
    candidates: &[DbLocation],
) -> ExtractResult<Option<PathBuf>> {
    for candidate in candidates {
        let found = match *candidate {
            DbLocation::Path { domain, path } => session.resolve(domain, path)?,
            DbLocation::Suffix { domain, file } => session
                .files_matching(domain, &format!("%{file}"))?
                .iter()
                .map(|entry| session.blob_path(entry))
                .find(|blob| blob.is_file()),
        };
        if found.is_some() {
            return Ok(found);
        }
    }
    Ok(None)
}

/// Opens the first located candidate, or `None` when the category is absent.
pub(crate) fn open_category_db(
    session: &BackupSession,
    category: &'static str,
    candidates: &[DbLocation],
) -> ExtractResult<Option<Connection>> {
    let Some(path) = locate_database(session, candidates)? else {
        info!("event=extract_open module=extract category={category} status=absent");
        return Ok(None);
    };
    debug!(
        "event=extract_open module=extract category={category} path={}",
        path.display()
    );
    Ok(Some(open_readonly(&path)?))
}
