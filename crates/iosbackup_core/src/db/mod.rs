//! Read-only SQLite access for backup databases.
//!
//! # Responsibility
//! - Open `Manifest.db` and embedded app databases without ever writing.
//! - Provide schema probes so extractors can pick a known layout.
//!
//! # Invariants
//! - Every connection handed out by this module is opened read-only.
//! - Schema probes never mutate the database.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod open;
mod schema;

pub use open::open_readonly;
pub use schema::{first_existing_column, table_exists, table_has_column};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Database file does not exist on disk.
    MissingFile(PathBuf),
    /// Path cannot be expressed as a `file:` URI.
    InvalidPath(PathBuf),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::MissingFile(path) => {
                write!(f, "database file does not exist: {}", path.display())
            }
            Self::InvalidPath(path) => {
                write!(f, "cannot open database path as a URI: {}", path.display())
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::MissingFile(_) | Self::InvalidPath(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
