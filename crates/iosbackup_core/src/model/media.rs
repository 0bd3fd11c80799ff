//! Camera roll media.

use super::file::BackupFile;
use crate::backup::domains::{is_image_extension, is_video_extension};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
}

/// A photo or video blob together with its on-disk location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaFile {
    pub file: BackupFile,
    /// Blob location inside the backup folder.
    pub source_path: PathBuf,
}

impl MediaFile {
    pub fn file_name(&self) -> &str {
        self.file.file_name()
    }

    pub fn kind(&self) -> Option<MediaKind> {
        let extension = self.file.extension();
        if is_image_extension(&extension) {
            Some(MediaKind::Photo)
        } else if is_video_extension(&extension) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    pub fn is_image(&self) -> bool {
        self.kind() == Some(MediaKind::Photo)
    }

    pub fn is_video(&self) -> bool {
        self.kind() == Some(MediaKind::Video)
    }

    pub fn size(&self) -> u64 {
        self.file.size
    }

    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.file.modified
    }

    /// Original path on the device.
    pub fn original_path(&self) -> &str {
        &self.file.relative_path
    }

    pub fn exists(&self) -> bool {
        self.source_path.is_file()
    }

    /// Reads at most `max_bytes` of the blob for previews.
    ///
    /// Returns `Ok(None)` when the blob is missing from the backup.
    pub fn read_preview(&self, max_bytes: u64) -> std::io::Result<Option<Vec<u8>>> {
        if !self.exists() {
            return Ok(None);
        }
        let mut buffer = Vec::new();
        File::open(&self.source_path)?
            .take(max_bytes)
            .read_to_end(&mut buffer)?;
        Ok(Some(buffer))
    }
}

/// Camera roll totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MediaStats {
    pub total_count: usize,
    pub photo_count: usize,
    pub video_count: usize,
    pub total_size: u64,
    pub photo_size: u64,
    pub video_size: u64,
}
