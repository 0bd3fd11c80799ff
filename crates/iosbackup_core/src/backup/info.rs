//! Device and backup metadata from `Info.plist` / `Manifest.plist`.

use super::layout::{is_valid_backup_folder, INFO_PLIST, MANIFEST_PLIST};
use super::{BackupError, BackupResult};
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const UNKNOWN_DEVICE: &str = "Unknown Device";
const UNKNOWN: &str = "Unknown";

#[derive(Debug, Default, Deserialize)]
struct InfoPlist {
    #[serde(rename = "Device Name")]
    device_name: Option<String>,
    #[serde(rename = "Display Name")]
    display_name: Option<String>,
    #[serde(rename = "Product Type")]
    product_type: Option<String>,
    #[serde(rename = "Product Version")]
    product_version: Option<String>,
    #[serde(rename = "Serial Number")]
    serial_number: Option<String>,
    #[serde(rename = "IMEI")]
    imei: Option<String>,
    #[serde(rename = "Phone Number")]
    phone_number: Option<String>,
    #[serde(rename = "Last Backup Date")]
    last_backup_date: Option<plist::Date>,
    #[serde(rename = "Unique Identifier")]
    unique_identifier: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ManifestPlist {
    #[serde(rename = "IsEncrypted", default)]
    is_encrypted: bool,
}

/// Device description recorded in a backup's `Info.plist`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub device_name: String,
    /// Falls back to `device_name`.
    pub display_name: String,
    /// Hardware model identifier, e.g. `iPhone14,2`.
    pub product_type: String,
    /// iOS version string.
    pub product_version: String,
    pub serial_number: String,
    pub imei: Option<String>,
    pub phone_number: Option<String>,
    pub last_backup_date: Option<DateTime<Utc>>,
    /// Falls back to the backup folder name.
    pub udid: String,
}

impl DeviceInfo {
    /// Placeholder used when `Info.plist` cannot be read.
    pub fn unknown(udid: impl Into<String>) -> Self {
        Self {
            device_name: UNKNOWN_DEVICE.to_string(),
            display_name: UNKNOWN_DEVICE.to_string(),
            product_type: UNKNOWN.to_string(),
            product_version: UNKNOWN.to_string(),
            serial_number: UNKNOWN.to_string(),
            imei: None,
            phone_number: None,
            last_backup_date: None,
            udid: udid.into(),
        }
    }

    fn from_plist(raw: InfoPlist, folder_name: &str) -> Self {
        let device_name = raw
            .device_name
            .unwrap_or_else(|| UNKNOWN_DEVICE.to_string());
        Self {
            display_name: raw.display_name.unwrap_or_else(|| device_name.clone()),
            device_name,
            product_type: raw.product_type.unwrap_or_else(|| UNKNOWN.to_string()),
            product_version: raw.product_version.unwrap_or_else(|| UNKNOWN.to_string()),
            serial_number: raw.serial_number.unwrap_or_else(|| UNKNOWN.to_string()),
            imei: raw.imei,
            phone_number: raw.phone_number,
            last_backup_date: raw.last_backup_date.map(plist_date_to_utc),
            udid: raw
                .unique_identifier
                .unwrap_or_else(|| folder_name.to_string()),
        }
    }
}

/// A backup folder found by [`list_available_backups`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupSummary {
    pub path: PathBuf,
    pub device: DeviceInfo,
}

/// Reads device metadata from `<backup>/Info.plist`.
pub fn read_device_info(backup: &Path) -> BackupResult<DeviceInfo> {
    let path = backup.join(INFO_PLIST);
    let raw: InfoPlist = plist::from_file(&path).map_err(|source| BackupError::Plist {
        path: path.clone(),
        source,
    })?;
    Ok(DeviceInfo::from_plist(raw, &folder_name(backup)))
}

/// Reads `IsEncrypted` from `<backup>/Manifest.plist`.
///
/// A missing `Manifest.plist` is treated as unencrypted.
pub fn read_is_encrypted(backup: &Path) -> BackupResult<bool> {
    let path = backup.join(MANIFEST_PLIST);
    if !path.exists() {
        return Ok(false);
    }
    let raw: ManifestPlist = plist::from_file(&path).map_err(|source| BackupError::Plist {
        path: path.clone(),
        source,
    })?;
    Ok(raw.is_encrypted)
}

/// Lists every backup folder directly under `root`, newest first.
///
/// Undated backups sort last. A missing `root` yields an empty list.
pub fn list_available_backups(root: &Path) -> BackupResult<Vec<BackupSummary>> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(root).map_err(|source| BackupError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let mut backups = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| BackupError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !is_valid_backup_folder(&path) {
            continue;
        }

        let device = match read_device_info(&path) {
            Ok(device) => device,
            Err(err) => {
                warn!(
                    "event=backup_scan module=backup status=degraded path={} error={}",
                    path.display(),
                    err
                );
                DeviceInfo::unknown(folder_name(&path))
            }
        };
        backups.push(BackupSummary { path, device });
    }

    backups.sort_by(|a, b| {
        b.device
            .last_backup_date
            .cmp(&a.device.last_backup_date)
            .then_with(|| a.path.cmp(&b.path))
    });
    Ok(backups)
}

fn folder_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn plist_date_to_utc(date: plist::Date) -> DateTime<Utc> {
    DateTime::<Utc>::from(SystemTime::from(date))
}
