//! Explorer settings resolved from caller overrides and platform defaults.
//!
//! Finder/iTunes place backups under:
//! - macOS: `~/Library/Application Support/MobileSync/Backup`
//! - Windows: `%APPDATA%\Apple Computer\MobileSync\Backup`

use crate::logging::{default_log_level, normalize_level, LoggingError};
use crate::mode::Mode;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const EXPORT_DIR_NAME: &str = "iOS_Export";

#[derive(Debug)]
pub enum ConfigError {
    /// No home directory to derive defaults from.
    NoHomeDirectory,
    InvalidLogLevel(LoggingError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoHomeDirectory => write!(
                f,
                "cannot determine the home directory; pass a backup root explicitly"
            ),
            Self::InvalidLogLevel(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidLogLevel(err) => Some(err),
            Self::NoHomeDirectory => None,
        }
    }
}

/// Values supplied by the caller; `None` falls back to the default.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub backup_root: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
    pub mode: Option<Mode>,
    pub log_level: Option<String>,
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplorerConfig {
    /// Folder holding one sub-folder per device backup.
    pub backup_root: PathBuf,
    pub export_dir: PathBuf,
    pub mode: Mode,
    pub log_level: &'static str,
    /// File logging target; stderr when `None`.
    pub log_dir: Option<PathBuf>,
}

impl ExplorerConfig {
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let backup_root = match overrides.backup_root {
            Some(root) => root,
            None => default_backup_root().ok_or(ConfigError::NoHomeDirectory)?,
        };
        let export_dir = match overrides.export_dir {
            Some(dir) => dir,
            None => default_export_dir().ok_or(ConfigError::NoHomeDirectory)?,
        };
        let log_level = match overrides.log_level.as_deref() {
            Some(level) => normalize_level(level).map_err(ConfigError::InvalidLogLevel)?,
            None => default_log_level(),
        };
        Ok(Self {
            backup_root,
            export_dir,
            mode: overrides.mode.unwrap_or_default(),
            log_level,
            log_dir: overrides.log_dir,
        })
    }
}

/// Platform backup location, when a home directory is known.
pub fn default_backup_root() -> Option<PathBuf> {
    if cfg!(windows) {
        return dirs::data_dir().map(|dir| dir.join("Apple Computer").join("MobileSync").join("Backup"));
    }
    dirs::home_dir().map(|home| {
        home.join("Library")
            .join("Application Support")
            .join("MobileSync")
            .join("Backup")
    })
}

/// `~/Desktop/iOS_Export`, or `~/iOS_Export` without a desktop folder.
pub fn default_export_dir() -> Option<PathBuf> {
    dirs::desktop_dir()
        .or_else(dirs::home_dir)
        .map(|dir| dir.join(EXPORT_DIR_NAME))
}
