//! Read-only access to unencrypted iOS device backups.
//! Opens a backup folder, resolves files through its manifest, and extracts
//! and exports camera roll media, contacts, messages, notes and call history.

pub mod backup;
pub mod config;
pub mod db;
pub mod export;
pub mod extract;
pub mod format;
pub mod logging;
pub mod manifest;
pub mod mode;
pub mod model;
pub mod session;

pub use backup::info::{list_available_backups, BackupSummary, DeviceInfo};
pub use backup::{BackupError, BackupResult};
pub use config::{ConfigError, ConfigOverrides, ExplorerConfig};
pub use export::{ExportError, ExportProgress, ExportResult, ExportSummary};
pub use extract::{ExtractError, ExtractResult};
pub use logging::{
    default_log_level, init_logging, init_stderr_logging, logging_status, LogTarget, LoggingError,
};
pub use manifest::manifest_repo::{DomainCount, ManifestRepository, SqliteManifestRepository};
pub use manifest::{ManifestError, ManifestResult};
pub use mode::{Category, Mode, ModeError};
pub use model::call::{CallRecord, CallStats, CallType};
pub use model::contact::{Contact, ContactStats};
pub use model::file::BackupFile;
pub use model::media::{MediaFile, MediaKind, MediaStats};
pub use model::message::{Chat, Message, MessageStats};
pub use model::note::{Note, NoteStats};
pub use session::{BackupInfo, BackupSession};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
