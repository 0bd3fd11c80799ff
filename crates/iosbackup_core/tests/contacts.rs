mod common;

use common::BackupFixture;
use iosbackup_core::backup::domains::{ADDRESS_BOOK_PATH, HOME_DOMAIN};
use iosbackup_core::{BackupSession, ExtractError};

const ADDRESS_BOOK_SQL: &str = "
CREATE TABLE ABPerson (
    ROWID INTEGER PRIMARY KEY AUTOINCREMENT,
    First TEXT, Last TEXT, Middle TEXT, Organization TEXT, Note TEXT
);
CREATE TABLE ABMultiValue (
    UID INTEGER PRIMARY KEY,
    record_id INTEGER, property INTEGER, identifier INTEGER, label INTEGER, value TEXT
);
INSERT INTO ABPerson (ROWID, First, Last, Organization, Note) VALUES
    (1, 'Zoe', 'Quinn', NULL, 'met at\nconference'),
    (2, NULL, NULL, 'Acme Corp', NULL),
    (3, 'adam', NULL, NULL, NULL),
    (4, NULL, NULL, NULL, NULL);
INSERT INTO ABMultiValue (UID, record_id, property, value) VALUES
    (1, 1, 3, '+1 555 0100'),
    (2, 1, 3, '+1 555 0101'),
    (3, 1, 4, 'zoe@example.com'),
    (4, 2, 4, 'info@acme.example'),
    (5, 2, 5, 'https://acme.example'),
    (6, 99, 3, '+1 555 0199'),
    (7, 3, 3, NULL);
";

#[test]
fn contacts_join_phones_and_emails() {
    let fixture = BackupFixture::new();
    fixture.add_database(HOME_DOMAIN, ADDRESS_BOOK_PATH, ADDRESS_BOOK_SQL);
    let session = BackupSession::open(fixture.path()).unwrap();

    let contacts = session.contacts().contacts().unwrap();
    let names: Vec<String> = contacts.iter().map(|c| c.display_name()).collect();
    assert_eq!(names, vec!["Acme Corp", "adam", "Unknown", "Zoe Quinn"]);

    let zoe = &contacts[3];
    assert_eq!(zoe.phone_numbers, vec!["+1 555 0100", "+1 555 0101"]);
    assert_eq!(zoe.primary_email(), Some("zoe@example.com"));
    assert_eq!(zoe.note, "met at\nconference");

    let acme = &contacts[0];
    assert!(acme.phone_numbers.is_empty());
    assert_eq!(acme.emails, vec!["info@acme.example"]);

    let stats = session.contacts().stats().unwrap();
    assert_eq!(stats.total_count, 4);
    assert_eq!(stats.with_phones, 1);
    assert_eq!(stats.with_emails, 2);
}

#[test]
fn missing_address_book_yields_no_contacts() {
    let fixture = BackupFixture::new();
    let session = BackupSession::open(fixture.path()).unwrap();
    assert!(session.contacts().contacts().unwrap().is_empty());

    fixture.add_missing_file(HOME_DOMAIN, ADDRESS_BOOK_PATH, 4096);
    assert!(session.contacts().contacts().unwrap().is_empty());
}

#[test]
fn foreign_schema_is_unsupported() {
    let fixture = BackupFixture::new();
    fixture.add_database(HOME_DOMAIN, ADDRESS_BOOK_PATH, "CREATE TABLE other (x);");
    let session = BackupSession::open(fixture.path()).unwrap();
    let err = session.contacts().contacts().unwrap_err();
    assert!(matches!(err, ExtractError::UnsupportedSchema(_)));
}
