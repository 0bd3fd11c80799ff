//! Synthetic backup folders for integration tests.

#![allow(dead_code)]

use iosbackup_core::backup::hash::file_id;
use plist::{Dictionary, Value};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

pub const DEVICE_NAME: &str = "Test iPhone";
pub const PRODUCT_VERSION: &str = "17.2";
pub const UDID: &str = "00008110-000A1B2C3D4E5F60";
pub const LAST_BACKUP_UNIX: u64 = 1_700_000_000;

/// Mode bits recorded for regular files.
const FILE_MODE: i64 = 0o100644;

pub struct BackupFixture {
    dir: TempDir,
}

impl BackupFixture {
    /// Creates an unencrypted backup with an empty manifest.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let fixture = Self { dir };
        fixture.write_info_plist(DEVICE_NAME, Some(LAST_BACKUP_UNIX));
        fixture.write_manifest_plist(false);

        let conn = Connection::open(fixture.path().join("Manifest.db")).unwrap();
        conn.execute_batch(
            "CREATE TABLE Files (
                fileID TEXT PRIMARY KEY,
                domain TEXT,
                relativePath TEXT,
                flags INTEGER,
                file BLOB
            );
            CREATE INDEX FilesDomainIdx ON Files(domain);
            CREATE TABLE Properties (key TEXT PRIMARY KEY, value BLOB);",
        )
        .unwrap();
        fixture
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_info_plist(&self, device_name: &str, last_backup_unix: Option<u64>) {
        let mut info = Dictionary::new();
        info.insert("Device Name".into(), Value::from(device_name));
        info.insert("Display Name".into(), Value::from(device_name));
        info.insert("Product Type".into(), Value::from("iPhone15,2"));
        info.insert("Product Version".into(), Value::from(PRODUCT_VERSION));
        info.insert("Serial Number".into(), Value::from("F2LXK0AAAAAA"));
        info.insert("Unique Identifier".into(), Value::from(UDID));
        if let Some(secs) = last_backup_unix {
            let date = UNIX_EPOCH + Duration::from_secs(secs);
            info.insert("Last Backup Date".into(), Value::Date(date.into()));
        }
        Value::Dictionary(info)
            .to_file_xml(self.path().join("Info.plist"))
            .unwrap();
    }

    pub fn write_manifest_plist(&self, encrypted: bool) {
        let mut manifest = Dictionary::new();
        manifest.insert("IsEncrypted".into(), Value::Boolean(encrypted));
        manifest.insert("Version".into(), Value::from("10.0"));
        Value::Dictionary(manifest)
            .to_file_binary(self.path().join("Manifest.plist"))
            .unwrap();
    }

    /// Adds a regular file with its blob; returns the blob name.
    pub fn add_file(
        &self,
        domain: &str,
        relative_path: &str,
        contents: &[u8],
        modified_unix: Option<i64>,
    ) -> String {
        let id = self.add_entry(
            domain,
            relative_path,
            1,
            Some(metadata_blob(contents.len() as i64, modified_unix)),
        );
        let blob = self.blob_location(&id);
        std::fs::create_dir_all(blob.parent().unwrap()).unwrap();
        std::fs::write(blob, contents).unwrap();
        id
    }

    /// Adds a file whose blob sits flat in the backup root, as before iOS 10.
    pub fn add_flat_file(&self, domain: &str, relative_path: &str, contents: &[u8]) -> String {
        let id = self.add_entry(
            domain,
            relative_path,
            1,
            Some(metadata_blob(contents.len() as i64, None)),
        );
        std::fs::write(self.path().join(&id), contents).unwrap();
        id
    }

    /// Adds a manifest row without writing its blob.
    pub fn add_missing_file(&self, domain: &str, relative_path: &str, size: i64) -> String {
        self.add_entry(domain, relative_path, 1, Some(metadata_blob(size, None)))
    }

    pub fn add_directory(&self, domain: &str, relative_path: &str) -> String {
        self.add_entry(domain, relative_path, 2, None)
    }

    /// Builds a SQLite database from `sql` and stores it as a backup file.
    pub fn add_database(&self, domain: &str, relative_path: &str, sql: &str) -> String {
        let scratch = tempfile::tempdir().unwrap();
        let db_path = scratch.path().join("scratch.sqlite");
        {
            let conn = Connection::open(&db_path).unwrap();
            conn.execute_batch(sql).unwrap();
        }
        let bytes = std::fs::read(&db_path).unwrap();
        self.add_file(domain, relative_path, &bytes, None)
    }

    /// Builds a SQLite database with a callback for binary inserts.
    pub fn add_database_with(
        &self,
        domain: &str,
        relative_path: &str,
        build: impl FnOnce(&Connection),
    ) -> String {
        let scratch = tempfile::tempdir().unwrap();
        let db_path = scratch.path().join("scratch.sqlite");
        {
            let conn = Connection::open(&db_path).unwrap();
            build(&conn);
        }
        let bytes = std::fs::read(&db_path).unwrap();
        self.add_file(domain, relative_path, &bytes, None)
    }

    pub fn blob_location(&self, id: &str) -> PathBuf {
        self.path().join(&id[..2]).join(id)
    }

    fn add_entry(
        &self,
        domain: &str,
        relative_path: &str,
        flags: i64,
        metadata: Option<Vec<u8>>,
    ) -> String {
        let id = file_id(domain, relative_path);
        let conn = Connection::open(self.path().join("Manifest.db")).unwrap();
        conn.execute(
            "INSERT INTO Files (fileID, domain, relativePath, flags, file)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![id, domain, relative_path, flags, metadata],
        )
        .unwrap();
        id
    }
}

/// `NSKeyedArchiver`-shaped `MBFile` metadata.
pub fn metadata_blob(size: i64, modified_unix: Option<i64>) -> Vec<u8> {
    let mut file = Dictionary::new();
    file.insert("Size".into(), Value::from(size));
    file.insert("Mode".into(), Value::from(FILE_MODE));
    if let Some(modified) = modified_unix {
        file.insert("LastModified".into(), Value::from(modified));
        file.insert("Birth".into(), Value::from(modified));
    }
    let mut root = Dictionary::new();
    root.insert("$archiver".into(), Value::from("NSKeyedArchiver"));
    root.insert(
        "$objects".into(),
        Value::Array(vec![Value::from("$null"), Value::Dictionary(file)]),
    );
    let mut out = Vec::new();
    Value::Dictionary(root).to_writer_binary(&mut out).unwrap();
    out
}

/// Seconds between 1970 and 2001, for Core Data timestamps in fixtures.
pub const APPLE_EPOCH_OFFSET: i64 = 978_307_200;

pub fn apple_seconds(unix: i64) -> f64 {
    (unix - APPLE_EPOCH_OFFSET) as f64
}

pub fn system_time(unix: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(unix)
}
