//! Fixed file names and blob placement inside a backup folder.

use std::path::{Path, PathBuf};

pub const MANIFEST_DB: &str = "Manifest.db";
pub const MANIFEST_MBDB: &str = "Manifest.mbdb";
pub const MANIFEST_PLIST: &str = "Manifest.plist";
pub const INFO_PLIST: &str = "Info.plist";
pub const STATUS_PLIST: &str = "Status.plist";

/// Returns whether `path` looks like an iOS backup folder.
///
/// A backup folder holds `Info.plist` and either `Manifest.db` or the legacy
/// `Manifest.mbdb`.
pub fn is_valid_backup_folder(path: &Path) -> bool {
    if !path.is_dir() {
        return false;
    }
    let has_manifest = path.join(MANIFEST_DB).exists() || path.join(MANIFEST_MBDB).exists();
    has_manifest && path.join(INFO_PLIST).exists()
}

/// Sharded blob location: `<root>/<first two chars>/<file_id>`.
pub fn blob_path(root: &Path, file_id: &str) -> PathBuf {
    let shard = file_id.get(..2).unwrap_or(file_id);
    root.join(shard).join(file_id)
}

/// Resolves a blob to the location that exists on disk.
///
/// Backups made before iOS 10 keep blobs flat in the root folder. The sharded
/// path is returned when neither exists.
pub fn resolve_blob_path(root: &Path, file_id: &str) -> PathBuf {
    let sharded = blob_path(root, file_id);
    if sharded.exists() {
        return sharded;
    }
    let flat = root.join(file_id);
    if flat.exists() {
        return flat;
    }
    sharded
}

#[cfg(test)]
mod tests {
    use super::{blob_path, is_valid_backup_folder, resolve_blob_path, INFO_PLIST, MANIFEST_DB};
    use std::fs;
    use std::path::Path;

    const ID: &str = "3d0d7e5fb2ce288813306e4d4636395e047a3d28";

    #[test]
    fn blob_path_uses_two_char_shard() {
        let path = blob_path(Path::new("/backups/udid"), ID);
        assert_eq!(
            path,
            Path::new("/backups/udid/3d/3d0d7e5fb2ce288813306e4d4636395e047a3d28")
        );
    }

    #[test]
    fn resolve_blob_path_falls_back_to_flat_layout() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(ID), b"legacy").unwrap();
        assert_eq!(resolve_blob_path(dir.path(), ID), dir.path().join(ID));

        fs::create_dir_all(dir.path().join("3d")).unwrap();
        fs::write(dir.path().join("3d").join(ID), b"sharded").unwrap();
        assert_eq!(resolve_blob_path(dir.path(), ID), blob_path(dir.path(), ID));
    }

    #[test]
    fn valid_backup_folder_requires_manifest_and_info() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_valid_backup_folder(dir.path()));

        fs::write(dir.path().join(INFO_PLIST), b"").unwrap();
        assert!(!is_valid_backup_folder(dir.path()));

        fs::write(dir.path().join(MANIFEST_DB), b"").unwrap();
        assert!(is_valid_backup_folder(dir.path()));
        assert!(!is_valid_backup_folder(&dir.path().join(INFO_PLIST)));
    }
}
