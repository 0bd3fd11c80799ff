use assert_cmd::Command;
use iosbackup_core::backup::hash::file_id;
use plist::{Dictionary, Value};
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use rusqlite::{params, Connection};
use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};
use tempfile::TempDir;

const BACKUP_NAME: &str = "00008110-000A1B2C3D4E5F60";

/// Backup root with one small backup: two camera roll files and an address book.
fn backup_root() -> TempDir {
    let root = tempfile::tempdir().unwrap();
    let backup = root.path().join(BACKUP_NAME);
    std::fs::create_dir(&backup).unwrap();

    let mut info = Dictionary::new();
    info.insert("Device Name".into(), Value::from("CLI Phone"));
    info.insert("Product Type".into(), Value::from("iPhone15,2"));
    info.insert("Product Version".into(), Value::from("17.2"));
    info.insert("Unique Identifier".into(), Value::from(BACKUP_NAME));
    let date = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    info.insert("Last Backup Date".into(), Value::Date(date.into()));
    Value::Dictionary(info)
        .to_file_xml(backup.join("Info.plist"))
        .unwrap();

    let conn = Connection::open(backup.join("Manifest.db")).unwrap();
    conn.execute_batch(
        "CREATE TABLE Files (
            fileID TEXT PRIMARY KEY, domain TEXT, relativePath TEXT, flags INTEGER, file BLOB
        );",
    )
    .unwrap();

    add_file(&conn, &backup, "CameraRollDomain", "Media/DCIM/100APPLE/IMG_0001.JPG", b"jpeg");
    add_file(&conn, &backup, "CameraRollDomain", "Media/DCIM/100APPLE/IMG_0002.MOV", b"movie");

    let scratch = tempfile::tempdir().unwrap();
    let address_book = scratch.path().join("ab.sqlite");
    {
        let ab = Connection::open(&address_book).unwrap();
        ab.execute_batch(
            "CREATE TABLE ABPerson (ROWID INTEGER PRIMARY KEY, First TEXT, Last TEXT, Organization TEXT, Note TEXT);
             CREATE TABLE ABMultiValue (UID INTEGER PRIMARY KEY, record_id INTEGER, property INTEGER, value TEXT);
             INSERT INTO ABPerson VALUES (1, 'Robin', 'Park', NULL, NULL);
             INSERT INTO ABMultiValue VALUES (1, 1, 3, '+15550100');",
        )
        .unwrap();
    }
    add_file(
        &conn,
        &backup,
        "HomeDomain",
        "Library/AddressBook/AddressBook.sqlitedb",
        &std::fs::read(&address_book).unwrap(),
    );
    root
}

fn add_file(conn: &Connection, backup: &Path, domain: &str, relative_path: &str, contents: &[u8]) {
    let id = file_id(domain, relative_path);
    conn.execute(
        "INSERT INTO Files VALUES (?1, ?2, ?3, 1, NULL);",
        params![id, domain, relative_path],
    )
    .unwrap();
    let shard = backup.join(&id[..2]);
    std::fs::create_dir_all(&shard).unwrap();
    std::fs::write(shard.join(&id), contents).unwrap();
}

fn cmd(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("iosbackup").unwrap();
    cmd.env_remove("IOSBACKUP_MODE")
        .env_remove("IOSBACKUP_LOG_DIR")
        .env("IOSBACKUP_ROOT", root)
        .env("IOSBACKUP_LOG_LEVEL", "error");
    cmd
}

#[test]
fn list_shows_backups_under_root() {
    let root = backup_root();
    cmd(root.path())
        .arg("list")
        .assert()
        .success()
        .stdout(contains(BACKUP_NAME).and(contains("CLI Phone")));
}

#[test]
fn info_json_includes_device_fields() {
    let root = backup_root();
    cmd(root.path())
        .args(["--json", "info", BACKUP_NAME])
        .assert()
        .success()
        .stdout(contains("\"ok\": true"))
        .stdout(contains("\"display_name\": \"CLI Phone (2023-11-14)\""))
        .stdout(contains("\"file_count\": 3"));
}

#[test]
fn show_lists_camera_roll_and_contacts() {
    let root = backup_root();
    cmd(root.path())
        .args(["show", BACKUP_NAME, "camera-roll"])
        .assert()
        .success()
        .stdout(contains("IMG_0001.JPG").and(contains("IMG_0002.MOV")));
    cmd(root.path())
        .args(["show", BACKUP_NAME, "contacts"])
        .assert()
        .success()
        .stdout(contains("Robin Park\t+15550100"));
}

#[test]
fn lite_mode_rejects_pro_categories() {
    let root = backup_root();
    cmd(root.path())
        .args(["--mode", "lite", "show", BACKUP_NAME, "contacts"])
        .assert()
        .failure()
        .stderr(contains("only available in Pro mode"));
    cmd(root.path())
        .args(["--mode", "lite", "stats", BACKUP_NAME])
        .assert()
        .success()
        .stdout(contains("camera roll: 1 photos").and(contains("contacts:").not()));
}

#[test]
fn export_writes_files_to_the_destination() {
    let root = backup_root();
    let out = tempfile::tempdir().unwrap();

    cmd(root.path())
        .args(["export", BACKUP_NAME, "camera_roll", "--kind", "videos", "--out"])
        .arg(out.path().join("videos"))
        .assert()
        .success()
        .stdout(contains("exported 1"));
    assert_eq!(
        std::fs::read(out.path().join("videos/IMG_0002.MOV")).unwrap(),
        b"movie"
    );
    assert!(!out.path().join("videos/IMG_0001.JPG").exists());

    cmd(root.path())
        .args(["export", BACKUP_NAME, "contacts", "--single-file", "--out"])
        .arg(out.path().join("contacts"))
        .assert()
        .success();
    let cards = std::fs::read_to_string(out.path().join("contacts/contacts.vcf")).unwrap();
    assert!(cards.contains("FN:Robin Park"));
}

#[test]
fn resolve_prints_blob_location_or_fails() {
    let root = backup_root();
    let id = file_id("CameraRollDomain", "Media/DCIM/100APPLE/IMG_0001.JPG");
    cmd(root.path())
        .args([
            "resolve",
            BACKUP_NAME,
            "CameraRollDomain",
            "Media/DCIM/100APPLE/IMG_0001.JPG",
        ])
        .assert()
        .success()
        .stdout(contains(id));
    cmd(root.path())
        .args(["resolve", BACKUP_NAME, "HomeDomain", "Library/missing"])
        .assert()
        .failure();
}

#[test]
fn unknown_categories_and_backups_fail() {
    let root = backup_root();
    cmd(root.path())
        .args(["show", BACKUP_NAME, "photos"])
        .assert()
        .failure()
        .stderr(contains("unknown category"));
    cmd(root.path())
        .args(["info", "no-such-backup"])
        .assert()
        .failure();
}
