//! Backup manifest (`Manifest.db`) access.
//!
//! # Responsibility
//! - Map logical `(domain, relative_path)` pairs to blob names.
//! - Decode per-file metadata stored alongside each manifest row.
//! - Keep SQL details of the `Files` table inside this module.
//!
//! # Invariants
//! - The manifest is only ever read.
//! - Undecodable metadata degrades to empty metadata, never to an error.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod file_blob;
pub mod manifest_repo;

pub type ManifestResult<T> = Result<T, ManifestError>;

/// Error for manifest queries.
#[derive(Debug)]
pub enum ManifestError {
    Db(DbError),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    InvalidData(String),
}

impl Display for ManifestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "manifest is missing required table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "manifest table `{table}` is missing column `{column}`")
            }
            Self::InvalidData(message) => write!(f, "invalid manifest data: {message}"),
        }
    }
}

impl Error for ManifestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for ManifestError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for ManifestError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
