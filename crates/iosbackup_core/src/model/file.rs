//! Manifest entries.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// `Files.flags` value for a regular file.
pub const FLAG_FILE: i64 = 1;
/// `Files.flags` value for a directory entry.
pub const FLAG_DIRECTORY: i64 = 2;

/// Metadata decoded from the `Files.file` property-list blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMetadata {
    pub size: u64,
    pub mode: u32,
    pub modified: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
}

/// One row of the manifest `Files` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupFile {
    /// Blob name: SHA-1 of `"{domain}-{relative_path}"`.
    pub file_id: String,
    /// e.g. `CameraRollDomain`.
    pub domain: String,
    /// Original path inside the domain.
    pub relative_path: String,
    pub flags: i64,
    pub size: u64,
    pub mode: u32,
    pub modified: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
}

impl BackupFile {
    pub fn new(
        file_id: impl Into<String>,
        domain: impl Into<String>,
        relative_path: impl Into<String>,
        flags: i64,
        metadata: FileMetadata,
    ) -> Self {
        Self {
            file_id: file_id.into(),
            domain: domain.into(),
            relative_path: relative_path.into(),
            flags,
            size: metadata.size,
            mode: metadata.mode,
            modified: metadata.modified,
            created: metadata.created,
        }
    }

    /// Logical path as `domain:relative_path`.
    pub fn full_path(&self) -> String {
        format!("{}:{}", self.domain, self.relative_path)
    }

    /// Final path component of the original file.
    pub fn file_name(&self) -> &str {
        Path::new(&self.relative_path)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("")
    }

    /// Lowercase extension including the leading dot, or empty.
    pub fn extension(&self) -> String {
        Path::new(&self.relative_path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_lowercase()))
            .unwrap_or_default()
    }

    pub fn is_directory(&self) -> bool {
        self.flags == FLAG_DIRECTORY
    }
}
