//! An opened backup folder.
//!
//! # Responsibility
//! - Validate a backup folder and open its `Manifest.db` read-only.
//! - Resolve logical `(domain, relativePath)` pairs to blob files on disk.
//! - Hand out per-category extractors bound to this session.
//!
//! # Invariants
//! - Encrypted backups are rejected before the manifest is touched.
//! - The manifest connection lives as long as the session.
//! - Domain listings are cached per session; the backup is never written.

use crate::backup::domains::{is_media_extension, CAMERA_ROLL_DOMAINS, CAMERA_ROLL_PREFIXES};
use crate::backup::info::{read_device_info, read_is_encrypted, DeviceInfo};
use crate::backup::layout::{
    is_valid_backup_folder, resolve_blob_path, INFO_PLIST, MANIFEST_DB, MANIFEST_MBDB,
};
use crate::backup::{BackupError, BackupResult};
use crate::db::open_readonly;
use crate::extract::call_history::CallHistoryExtractor;
use crate::extract::camera_roll::CameraRollExtractor;
use crate::extract::contacts::ContactsExtractor;
use crate::extract::messages::MessagesExtractor;
use crate::extract::notes::NotesExtractor;
use crate::manifest::manifest_repo::{DomainCount, ManifestRepository, SqliteManifestRepository};
use crate::manifest::ManifestResult;
use crate::model::file::BackupFile;
use log::{info, warn};
use rusqlite::Connection;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Identity of an opened backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupInfo {
    pub path: PathBuf,
    pub device: DeviceInfo,
    pub is_encrypted: bool,
}

impl BackupInfo {
    /// `"<device name> (YYYY-MM-DD)"`, or the device name for undated backups.
    pub fn display_name(&self) -> String {
        match self.device.last_backup_date {
            Some(date) => format!("{} ({})", self.device.device_name, date.format("%Y-%m-%d")),
            None => self.device.device_name.clone(),
        }
    }
}

/// Read-only handle on one backup folder.
pub struct BackupSession {
    info: BackupInfo,
    conn: Connection,
    domain_cache: RefCell<HashMap<String, Vec<BackupFile>>>,
}

impl BackupSession {
    /// Opens a backup folder.
    ///
    /// # Errors
    /// - [`BackupError::NotABackup`] when `Info.plist` or a manifest is missing.
    /// - [`BackupError::Encrypted`] for encrypted backups.
    /// - [`BackupError::LegacyManifest`] when only `Manifest.mbdb` exists.
    /// - [`BackupError::Manifest`] when `Manifest.db` lacks the `Files` table.
    pub fn open(path: impl AsRef<Path>) -> BackupResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !is_valid_backup_folder(&path) {
            return Err(BackupError::NotABackup(path));
        }

        let is_encrypted = read_is_encrypted(&path)?;
        if is_encrypted {
            warn!(
                "event=backup_open module=session status=rejected reason=encrypted path={}",
                path.display()
            );
            return Err(BackupError::Encrypted(path));
        }

        let manifest_path = path.join(MANIFEST_DB);
        if !manifest_path.is_file() {
            if path.join(MANIFEST_MBDB).is_file() {
                return Err(BackupError::LegacyManifest(path));
            }
            return Err(BackupError::NotABackup(path));
        }
        if !path.join(INFO_PLIST).is_file() {
            return Err(BackupError::NotABackup(path));
        }

        let device = read_device_info(&path)?;
        let conn = open_readonly(&manifest_path)?;
        SqliteManifestRepository::try_new(&conn)?;

        info!(
            "event=backup_open module=session status=ok path={} product_version={}",
            path.display(),
            device.product_version
        );

        Ok(Self {
            info: BackupInfo {
                path,
                device,
                is_encrypted,
            },
            conn,
            domain_cache: RefCell::new(HashMap::new()),
        })
    }

    pub fn info(&self) -> &BackupInfo {
        &self.info
    }

    /// Backup folder root.
    pub fn path(&self) -> &Path {
        &self.info.path
    }

    /// Manifest repository over this session's connection.
    ///
    /// The `Files` table was checked by [`BackupSession::open`].
    pub fn manifest(&self) -> SqliteManifestRepository<'_> {
        SqliteManifestRepository::from_checked(&self.conn)
    }

    /// Every entry of one domain, cached for the session.
    pub fn files_in_domain(&self, domain: &str) -> ManifestResult<Vec<BackupFile>> {
        if let Some(files) = self.domain_cache.borrow().get(domain) {
            return Ok(files.clone());
        }
        let files = self.manifest().files_in_domain(domain)?;
        self.domain_cache
            .borrow_mut()
            .insert(domain.to_string(), files.clone());
        Ok(files)
    }

    pub fn find_file(&self, domain: &str, relative_path: &str) -> ManifestResult<Option<BackupFile>> {
        self.manifest().find_file(domain, relative_path)
    }

    /// Entries of one domain whose path matches a SQL `LIKE` pattern.
    pub fn files_matching(&self, domain: &str, pattern: &str) -> ManifestResult<Vec<BackupFile>> {
        self.manifest().files_matching(domain, pattern)
    }

    /// On-disk location of an entry's blob.
    pub fn blob_path(&self, file: &BackupFile) -> PathBuf {
        resolve_blob_path(self.path(), &file.file_id)
    }

    /// Resolves a logical path to its blob, if the entry exists and its blob is on disk.
    pub fn resolve(&self, domain: &str, relative_path: &str) -> ManifestResult<Option<PathBuf>> {
        let Some(file) = self.find_file(domain, relative_path)? else {
            return Ok(None);
        };
        let blob = self.blob_path(&file);
        Ok(blob.is_file().then_some(blob))
    }

    /// Photo and video entries under the camera roll domains, deduplicated by blob name.
    pub fn camera_roll_files(&self) -> ManifestResult<Vec<BackupFile>> {
        let manifest = self.manifest();
        let mut seen = HashSet::new();
        let mut files = Vec::new();
        for &domain in CAMERA_ROLL_DOMAINS {
            for prefix in CAMERA_ROLL_PREFIXES {
                for file in manifest.files_matching(domain, &format!("{prefix}/%"))? {
                    if file.is_directory() || !is_media_extension(&file.extension()) {
                        continue;
                    }
                    if seen.insert(file.file_id.clone()) {
                        files.push(file);
                    }
                }
            }
        }
        Ok(files)
    }

    pub fn total_file_count(&self) -> ManifestResult<u64> {
        self.manifest().total_file_count()
    }

    pub fn domain_stats(&self) -> ManifestResult<Vec<DomainCount>> {
        self.manifest().domain_stats()
    }

    pub fn camera_roll(&self) -> CameraRollExtractor<'_> {
        CameraRollExtractor::new(self)
    }

    pub fn contacts(&self) -> ContactsExtractor<'_> {
        ContactsExtractor::new(self)
    }

    pub fn messages(&self) -> MessagesExtractor<'_> {
        MessagesExtractor::new(self)
    }

    pub fn notes(&self) -> NotesExtractor<'_> {
        NotesExtractor::new(self)
    }

    pub fn call_history(&self) -> CallHistoryExtractor<'_> {
        CallHistoryExtractor::new(self)
    }
}
