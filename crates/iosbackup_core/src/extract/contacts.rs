//! Address book contacts (`AddressBook.sqlitedb`).

use super::{open_category_db, DbLocation, ExtractError, ExtractResult};
use crate::backup::domains::{ADDRESS_BOOK_PATH, HOME_DOMAIN};
use crate::db::table_exists;
use crate::model::contact::{Contact, ContactStats};
use crate::session::BackupSession;
use log::info;
use rusqlite::Connection;
use std::collections::BTreeMap;

const DATABASE: &str = "AddressBook";
const LOCATIONS: &[DbLocation] = &[DbLocation::Path {
    domain: HOME_DOMAIN,
    path: ADDRESS_BOOK_PATH,
}];

/// `ABMultiValue.property` for phone numbers.
const PROPERTY_PHONE: i64 = 3;
/// `ABMultiValue.property` for email addresses.
const PROPERTY_EMAIL: i64 = 4;

pub struct ContactsExtractor<'s> {
    session: &'s BackupSession,
}

impl<'s> ContactsExtractor<'s> {
    pub fn new(session: &'s BackupSession) -> Self {
        Self { session }
    }

    /// Every contact, sorted by case-insensitive display name.
    pub fn contacts(&self) -> ExtractResult<Vec<Contact>> {
        let Some(conn) = open_category_db(self.session, DATABASE, LOCATIONS)? else {
            return Ok(Vec::new());
        };
        let contacts = read_contacts(&conn)?;
        info!(
            "event=extract module=contacts status=ok count={}",
            contacts.len()
        );
        Ok(contacts)
    }

    pub fn stats(&self) -> ExtractResult<ContactStats> {
        Ok(contact_stats(&self.contacts()?))
    }
}

/// Reads contacts from an opened address book.
pub fn read_contacts(conn: &Connection) -> ExtractResult<Vec<Contact>> {
    if !table_exists(conn, "ABPerson")? {
        return Err(ExtractError::UnsupportedSchema(DATABASE));
    }

    let mut persons = BTreeMap::new();
    {
        let mut stmt = conn.prepare(
            "SELECT ROWID AS id, First, Last, Organization, Note
             FROM ABPerson
             ORDER BY ROWID ASC;",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let id: i64 = row.get("id")?;
            persons.insert(
                id,
                Contact {
                    id,
                    first_name: row.get::<_, Option<String>>("First")?.unwrap_or_default(),
                    last_name: row.get::<_, Option<String>>("Last")?.unwrap_or_default(),
                    organization: row
                        .get::<_, Option<String>>("Organization")?
                        .unwrap_or_default(),
                    phone_numbers: Vec::new(),
                    emails: Vec::new(),
                    note: row.get::<_, Option<String>>("Note")?.unwrap_or_default(),
                },
            );
        }
    }

    if table_exists(conn, "ABMultiValue")? {
        let mut stmt = conn.prepare(
            "SELECT record_id, property, value
             FROM ABMultiValue
             WHERE property IN (?1, ?2) AND value IS NOT NULL
             ORDER BY ROWID ASC;",
        )?;
        let mut rows = stmt.query([PROPERTY_PHONE, PROPERTY_EMAIL])?;
        while let Some(row) = rows.next()? {
            let record_id: i64 = row.get("record_id")?;
            let Some(person) = persons.get_mut(&record_id) else {
                continue;
            };
            let value: String = row.get("value")?;
            match row.get::<_, i64>("property")? {
                PROPERTY_PHONE => person.phone_numbers.push(value),
                _ => person.emails.push(value),
            }
        }
    }

    let mut contacts: Vec<Contact> = persons.into_values().collect();
    contacts.sort_by_cached_key(|contact| (contact.display_name().to_lowercase(), contact.id));
    Ok(contacts)
}

pub fn contact_stats(contacts: &[Contact]) -> ContactStats {
    ContactStats {
        total_count: contacts.len(),
        with_phones: contacts
            .iter()
            .filter(|contact| !contact.phone_numbers.is_empty())
            .count(),
        with_emails: contacts
            .iter()
            .filter(|contact| !contact.emails.is_empty())
            .count(),
    }
}
