//! On-disk backup folder conventions.
//!
//! # Responsibility
//! - Describe the fixed file names and blob layout of an iOS backup folder.
//! - Derive content-addressed blob names from logical paths.
//! - Read device and encryption metadata from the backup's property lists.
//!
//! # Invariants
//! - Nothing in this module writes into a backup folder.

use crate::db::DbError;
use crate::manifest::ManifestError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod domains;
pub mod hash;
pub mod info;
pub mod layout;

pub type BackupResult<T> = Result<T, BackupError>;

/// Errors raised while opening or inspecting a backup folder.
#[derive(Debug)]
pub enum BackupError {
    /// Folder lacks `Info.plist` or a manifest.
    NotABackup(PathBuf),
    /// Backup was made with encryption enabled.
    Encrypted(PathBuf),
    /// Backup only has the pre-iOS-10 `Manifest.mbdb` index.
    LegacyManifest(PathBuf),
    /// A property list could not be read or decoded.
    Plist { path: PathBuf, source: plist::Error },
    Io { path: PathBuf, source: std::io::Error },
    Db(DbError),
    Manifest(ManifestError),
}

impl Display for BackupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotABackup(path) => {
                write!(f, "not an iOS backup folder: {}", path.display())
            }
            Self::Encrypted(path) => write!(
                f,
                "backup is encrypted; only unencrypted backups are supported: {}",
                path.display()
            ),
            Self::LegacyManifest(path) => write!(
                f,
                "backup uses the unsupported Manifest.mbdb index: {}",
                path.display()
            ),
            Self::Plist { path, source } => {
                write!(f, "failed to read plist {}: {source}", path.display())
            }
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Db(err) => write!(f, "{err}"),
            Self::Manifest(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BackupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Plist { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            Self::Manifest(err) => Some(err),
            Self::NotABackup(_) | Self::Encrypted(_) | Self::LegacyManifest(_) => None,
        }
    }
}

impl From<DbError> for BackupError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<ManifestError> for BackupError {
    fn from(value: ManifestError) -> Self {
        Self::Manifest(value)
    }
}

impl From<rusqlite::Error> for BackupError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
