//! iMessage and SMS conversations (`sms.db`).
//!
//! # Invariants
//! - Messages inside a chat are ascending by date, then `ROWID`.
//! - Chats are sorted by last message date, newest first; chats without
//!   dated messages sort last.
//! - Messages that belong to no known chat are dropped.

use super::time::from_apple_message_date;
use super::{open_category_db, DbLocation, ExtractError, ExtractResult};
use crate::backup::domains::{HOME_DOMAIN, SMS_DB_PATH};
use crate::db::{table_exists, table_has_column};
use crate::model::message::{Chat, Message, MessageStats, SERVICE_IMESSAGE};
use crate::session::BackupSession;
use log::info;
use rusqlite::Connection;
use std::collections::{BTreeMap, HashMap};

const DATABASE: &str = "sms";
const LOCATIONS: &[DbLocation] = &[DbLocation::Path {
    domain: HOME_DOMAIN,
    path: SMS_DB_PATH,
}];
const REQUIRED_TABLES: &[&str] = &["handle", "chat", "message", "chat_message_join"];
const UNKNOWN_CHAT: &str = "Unknown";

/// Class name preceding the plain string inside an `attributedBody` typedstream.
const NSSTRING_MARKER: &[u8] = b"NSString";
/// Typedstream tag preceding string bytes.
const STRING_TAG: u8 = b'+';
const LENGTH_U16: u8 = 0x81;
const LENGTH_U32: u8 = 0x82;

pub struct MessagesExtractor<'s> {
    session: &'s BackupSession,
}

impl<'s> MessagesExtractor<'s> {
    pub fn new(session: &'s BackupSession) -> Self {
        Self { session }
    }

    pub fn chats(&self) -> ExtractResult<Vec<Chat>> {
        let Some(conn) = open_category_db(self.session, DATABASE, LOCATIONS)? else {
            return Ok(Vec::new());
        };
        let chats = read_chats(&conn)?;
        info!(
            "event=extract module=messages status=ok chats={} messages={}",
            chats.len(),
            chats.iter().map(Chat::message_count).sum::<usize>()
        );
        Ok(chats)
    }

    pub fn stats(&self) -> ExtractResult<MessageStats> {
        Ok(message_stats(&self.chats()?))
    }
}

/// Reads every chat with its messages and participants.
pub fn read_chats(conn: &Connection) -> ExtractResult<Vec<Chat>> {
    for &table in REQUIRED_TABLES {
        if !table_exists(conn, table)? {
            return Err(ExtractError::UnsupportedSchema(DATABASE));
        }
    }

    let handles = read_handles(conn)?;
    let mut chats = read_chat_rows(conn)?;
    read_messages(conn, &handles, &mut chats)?;
    if table_exists(conn, "chat_handle_join")? {
        read_participants(conn, &handles, &mut chats)?;
    }

    let mut chats: Vec<Chat> = chats.into_values().collect();
    // Raw dates mix seconds and nanoseconds, so SQL order is not enough.
    for chat in &mut chats {
        chat.messages
            .sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
    }
    chats.sort_by(|a, b| {
        b.last_message_date
            .cmp(&a.last_message_date)
            .then_with(|| a.chat_id.cmp(&b.chat_id))
    });
    Ok(chats)
}

pub fn message_stats(chats: &[Chat]) -> MessageStats {
    let message_count = chats.iter().map(Chat::message_count).sum();
    let imessage_count = chats
        .iter()
        .flat_map(|chat| &chat.messages)
        .filter(|message| message.service == SERVICE_IMESSAGE)
        .count();
    MessageStats {
        chat_count: chats.len(),
        message_count,
        imessage_count,
        sms_count: message_count - imessage_count,
    }
}

fn read_handles(conn: &Connection) -> ExtractResult<HashMap<i64, String>> {
    let mut stmt = conn.prepare("SELECT ROWID AS id, id AS address FROM handle;")?;
    let mut rows = stmt.query([])?;
    let mut handles = HashMap::new();
    while let Some(row) = rows.next()? {
        if let Some(address) = row.get::<_, Option<String>>("address")? {
            handles.insert(row.get("id")?, address);
        }
    }
    Ok(handles)
}

fn read_chat_rows(conn: &Connection) -> ExtractResult<BTreeMap<i64, Chat>> {
    let mut stmt = conn.prepare(
        "SELECT ROWID AS id, chat_identifier, display_name
         FROM chat
         ORDER BY ROWID ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut chats = BTreeMap::new();
    while let Some(row) = rows.next()? {
        let chat_id: i64 = row.get("id")?;
        let identifier = row
            .get::<_, Option<String>>("chat_identifier")?
            .unwrap_or_default();
        let display_name = row
            .get::<_, Option<String>>("display_name")?
            .filter(|name| !name.is_empty())
            .or_else(|| Some(identifier.clone()).filter(|id| !id.is_empty()))
            .unwrap_or_else(|| UNKNOWN_CHAT.to_string());
        chats.insert(
            chat_id,
            Chat {
                chat_id,
                identifier,
                display_name,
                participants: Vec::new(),
                messages: Vec::new(),
                last_message_date: None,
            },
        );
    }
    Ok(chats)
}

fn read_messages(
    conn: &Connection,
    handles: &HashMap<i64, String>,
    chats: &mut BTreeMap<i64, Chat>,
) -> ExtractResult<()> {
    let attributed_body = if table_has_column(conn, "message", "attributedBody")? {
        "m.attributedBody"
    } else {
        "NULL"
    };
    let sql = format!(
        "SELECT
            m.ROWID AS id,
            m.text AS text,
            {attributed_body} AS attributed_body,
            m.date AS date,
            m.is_from_me AS is_from_me,
            m.handle_id AS handle_id,
            m.service AS service,
            cmj.chat_id AS chat_id
         FROM message m
         LEFT JOIN chat_message_join cmj ON m.ROWID = cmj.message_id
         ORDER BY m.ROWID ASC;"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let Some(chat_id) = row.get::<_, Option<i64>>("chat_id")? else {
            continue;
        };
        let Some(chat) = chats.get_mut(&chat_id) else {
            continue;
        };

        let mut text = row.get::<_, Option<String>>("text")?.unwrap_or_default();
        if text.is_empty() {
            if let Some(body) = row.get::<_, Option<Vec<u8>>>("attributed_body")? {
                text = decode_attributed_body(&body).unwrap_or_default();
            }
        }

        let is_from_me = row.get::<_, Option<i64>>("is_from_me")?.unwrap_or(0) != 0;
        let handle_id = row.get::<_, Option<i64>>("handle_id")?.unwrap_or(0);
        let date = row
            .get::<_, Option<i64>>("date")?
            .and_then(from_apple_message_date);
        if date > chat.last_message_date {
            chat.last_message_date = date;
        }

        chat.messages.push(Message {
            id: row.get("id")?,
            chat_id,
            text,
            date,
            is_from_me,
            handle_id,
            sender: if is_from_me {
                None
            } else {
                handles.get(&handle_id).cloned()
            },
            service: row.get::<_, Option<String>>("service")?.unwrap_or_default(),
        });
    }
    Ok(())
}

fn read_participants(
    conn: &Connection,
    handles: &HashMap<i64, String>,
    chats: &mut BTreeMap<i64, Chat>,
) -> ExtractResult<()> {
    let mut stmt = conn.prepare(
        "SELECT chat_id, handle_id
         FROM chat_handle_join
         ORDER BY chat_id ASC, handle_id ASC;",
    )?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let chat_id: i64 = row.get("chat_id")?;
        let handle_id: i64 = row.get("handle_id")?;
        if let (Some(chat), Some(address)) = (chats.get_mut(&chat_id), handles.get(&handle_id)) {
            chat.participants.push(address.clone());
        }
    }
    Ok(())
}

/// Extracts the plain text from an archived `NSAttributedString`.
///
/// Newer iOS versions leave `message.text` NULL and keep the body only in the
/// typedstream `attributedBody` column. Returns `None` when no string is found.
pub fn decode_attributed_body(blob: &[u8]) -> Option<String> {
    let marker = blob
        .windows(NSSTRING_MARKER.len())
        .position(|window| window == NSSTRING_MARKER)?;
    let rest = &blob[marker + NSSTRING_MARKER.len()..];
    let tag = rest.iter().take(16).position(|&byte| byte == STRING_TAG)?;
    let rest = &rest[tag + 1..];

    let (len, start): (usize, usize) = match *rest.first()? {
        LENGTH_U16 => (u16::from_le_bytes([*rest.get(1)?, *rest.get(2)?]) as usize, 3),
        LENGTH_U32 => {
            let bytes: [u8; 4] = rest.get(1..5)?.try_into().ok()?;
            (u32::from_le_bytes(bytes) as usize, 5)
        }
        short => (short as usize, 1),
    };
    let bytes = rest.get(start..start.checked_add(len)?)?;
    let text = String::from_utf8_lossy(bytes).into_owned();
    (!text.is_empty()).then_some(text)
}
