//! Notes (`NoteStore.sqlite` and the older `notes.sqlite`).
//!
//! # Responsibility
//! - Read the three known layouts: the iOS 9+ cloud-sync store, the iOS 5-8
//!   `ZNOTE`/`ZNOTEBODY` store, and the original `note` table.
//! - Decode compressed protobuf note bodies and strip HTML bodies to text.
//!
//! # Invariants
//! - Notes are sorted by modification date, newest first, then by id.
//! - Notes marked for deletion are skipped.
//! - Titles are never empty; missing titles become `Untitled`.

use super::time::from_apple_seconds;
use super::{open_category_db, DbLocation, ExtractError, ExtractResult};
use crate::backup::domains::{
    HOME_DOMAIN, LEGACY_NOTES_PATH, NOTES_GROUP_DOMAIN, NOTE_STORE_FILE,
};
use crate::db::{first_existing_column, table_exists, table_has_column};
use crate::model::note::{Note, NoteStats, DEFAULT_FOLDER};
use crate::session::BackupSession;
use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use rusqlite::{Connection, Row};
use std::io::Read;

const DATABASE: &str = "NoteStore";
const LOCATIONS: &[DbLocation] = &[
    DbLocation::Suffix {
        domain: NOTES_GROUP_DOMAIN,
        file: NOTE_STORE_FILE,
    },
    DbLocation::Path {
        domain: HOME_DOMAIN,
        path: LEGACY_NOTES_PATH,
    },
];
const UNTITLED: &str = "Untitled";

/// Field numbers leading from the document wrapper to the note text.
const NOTE_TEXT_FIELD_PATH: &[u64] = &[2, 3, 2];
const WIRE_VARINT: u64 = 0;
const WIRE_FIXED64: u64 = 1;
const WIRE_LENGTH_DELIMITED: u64 = 2;
const WIRE_FIXED32: u64 = 5;
/// Placeholder character for inline attachments.
const ATTACHMENT_CHAR: char = '\u{fffc}';

static BLOCK_BREAK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|div|li|h[1-6])>").expect("valid block break regex")
});
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));
static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("valid entity regex")
});

/// Store layouts, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NoteSchema {
    CloudSync,
    CoreData,
    Legacy,
}

pub struct NotesExtractor<'s> {
    session: &'s BackupSession,
}

impl<'s> NotesExtractor<'s> {
    pub fn new(session: &'s BackupSession) -> Self {
        Self { session }
    }

    pub fn notes(&self) -> ExtractResult<Vec<Note>> {
        let Some(conn) = open_category_db(self.session, DATABASE, LOCATIONS)? else {
            return Ok(Vec::new());
        };
        let notes = read_notes(&conn)?;
        info!("event=extract module=notes status=ok count={}", notes.len());
        Ok(notes)
    }

    pub fn stats(&self) -> ExtractResult<NoteStats> {
        Ok(note_stats(&self.notes()?))
    }
}

/// Reads every note from an opened notes store.
pub fn read_notes(conn: &Connection) -> ExtractResult<Vec<Note>> {
    let schema = detect_schema(conn)?;
    debug!("event=notes_schema module=notes schema={schema:?}");
    let mut notes = match schema {
        NoteSchema::CloudSync => read_cloud_sync_notes(conn)?,
        NoteSchema::CoreData => read_core_data_notes(conn)?,
        NoteSchema::Legacy => read_legacy_notes(conn)?,
    };
    notes.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.id.cmp(&b.id)));
    Ok(notes)
}

pub fn note_stats(notes: &[Note]) -> NoteStats {
    NoteStats {
        note_count: notes.len(),
        total_words: notes.iter().map(Note::word_count).sum(),
    }
}

fn detect_schema(conn: &Connection) -> ExtractResult<NoteSchema> {
    if table_exists(conn, "ZICCLOUDSYNCINGOBJECT")? && table_exists(conn, "ZICNOTEDATA")? {
        return Ok(NoteSchema::CloudSync);
    }
    if table_exists(conn, "ZNOTE")? && table_exists(conn, "ZNOTEBODY")? {
        return Ok(NoteSchema::CoreData);
    }
    if table_exists(conn, "note")? {
        return Ok(NoteSchema::Legacy);
    }
    Err(ExtractError::UnsupportedSchema(DATABASE))
}

fn read_cloud_sync_notes(conn: &Connection) -> ExtractResult<Vec<Note>> {
    const TABLE: &str = "ZICCLOUDSYNCINGOBJECT";
    if !table_has_column(conn, TABLE, "ZTITLE1")? || !table_has_column(conn, TABLE, "ZNOTEDATA")? {
        return Err(ExtractError::UnsupportedSchema(DATABASE));
    }

    // Core Data numbers attribute columns per entity, so the suffix varies by iOS release.
    let created = column_or_null(
        first_existing_column(
            conn,
            TABLE,
            &["ZCREATIONDATE3", "ZCREATIONDATE1", "ZCREATIONDATE"],
        )?,
        "n",
    );
    let modified = column_or_null(
        first_existing_column(conn, TABLE, &["ZMODIFICATIONDATE1", "ZMODIFICATIONDATE"])?,
        "n",
    );
    let (folder, folder_join) =
        if table_has_column(conn, TABLE, "ZFOLDER")? && table_has_column(conn, TABLE, "ZTITLE2")? {
            (
                "f.ZTITLE2",
                "LEFT JOIN ZICCLOUDSYNCINGOBJECT f ON n.ZFOLDER = f.Z_PK",
            )
        } else {
            ("NULL", "")
        };
    let not_deleted = if table_has_column(conn, TABLE, "ZMARKEDFORDELETION")? {
        "AND (n.ZMARKEDFORDELETION IS NULL OR n.ZMARKEDFORDELETION = 0)"
    } else {
        ""
    };

    let sql = format!(
        "SELECT
            n.Z_PK AS id,
            n.ZTITLE1 AS title,
            nd.ZDATA AS data,
            {created} AS created,
            {modified} AS modified,
            {folder} AS folder
         FROM ZICCLOUDSYNCINGOBJECT n
         LEFT JOIN ZICNOTEDATA nd ON n.ZNOTEDATA = nd.Z_PK
         {folder_join}
         WHERE n.ZTITLE1 IS NOT NULL {not_deleted};"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let mut notes = Vec::new();
    while let Some(row) = rows.next()? {
        let content = row
            .get::<_, Option<Vec<u8>>>("data")?
            .map(|data| decode_note_body(&data))
            .unwrap_or_default();
        notes.push(Note {
            html_content: None,
            content,
            ..note_header(row)?
        });
    }
    Ok(notes)
}

fn read_core_data_notes(conn: &Connection) -> ExtractResult<Vec<Note>> {
    let mut stmt = conn.prepare(
        "SELECT
            n.Z_PK AS id,
            n.ZTITLE AS title,
            b.ZCONTENT AS body,
            n.ZCREATIONDATE AS created,
            n.ZMODIFICATIONDATE AS modified,
            NULL AS folder
         FROM ZNOTE n
         LEFT JOIN ZNOTEBODY b ON b.ZOWNER = n.Z_PK;",
    )?;
    read_html_notes(&mut stmt)
}

fn read_legacy_notes(conn: &Connection) -> ExtractResult<Vec<Note>> {
    let mut stmt = conn.prepare(
        "SELECT
            ROWID AS id,
            title,
            body,
            creation_date AS created,
            modification_date AS modified,
            NULL AS folder
         FROM note;",
    )?;
    read_html_notes(&mut stmt)
}

fn read_html_notes(stmt: &mut rusqlite::Statement<'_>) -> ExtractResult<Vec<Note>> {
    let mut rows = stmt.query([])?;
    let mut notes = Vec::new();
    while let Some(row) = rows.next()? {
        let html = row.get::<_, Option<String>>("body")?.unwrap_or_default();
        notes.push(Note {
            content: strip_html(&html),
            html_content: Some(html),
            ..note_header(row)?
        });
    }
    Ok(notes)
}

/// Id, title, dates and folder shared by every layout; body left empty.
fn note_header(row: &Row<'_>) -> ExtractResult<Note> {
    let title = row
        .get::<_, Option<String>>("title")?
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());
    Ok(Note {
        id: row.get("id")?,
        title,
        content: String::new(),
        html_content: None,
        created: row
            .get::<_, Option<f64>>("created")?
            .and_then(from_apple_seconds),
        modified: row
            .get::<_, Option<f64>>("modified")?
            .and_then(from_apple_seconds),
        folder: row
            .get::<_, Option<String>>("folder")?
            .filter(|folder| !folder.is_empty())
            .unwrap_or_else(|| DEFAULT_FOLDER.to_string()),
    })
}

fn column_or_null(column: Option<&'static str>, alias: &str) -> String {
    column.map_or_else(|| "NULL".to_string(), |column| format!("{alias}.{column}"))
}

/// Decodes a `ZICNOTEDATA.ZDATA` body to plain text.
///
/// Bodies are gzip-compressed protobuf documents on current releases; zlib
/// streams are accepted as well. Bodies that do not carry a
/// protobuf document are decoded as lossy UTF-8 and stripped of markup.
pub fn decode_note_body(data: &[u8]) -> String {
    let Some(raw) = decompress(data) else {
        return strip_html(&printable_text(data));
    };
    match protobuf_path(&raw, NOTE_TEXT_FIELD_PATH) {
        Some(text) => String::from_utf8_lossy(text)
            .chars()
            .filter(|&ch| ch != ATTACHMENT_CHAR)
            .collect::<String>()
            .trim()
            .to_string(),
        None => strip_html(&printable_text(&raw)),
    }
}

fn decompress(data: &[u8]) -> Option<Vec<u8>> {
    read_all(GzDecoder::new(data))
        .or_else(|| read_all(ZlibDecoder::new(data)))
        // Headerless, so only output that parses as a note document counts.
        .or_else(|| {
            read_all(DeflateDecoder::new(data))
                .filter(|raw| protobuf_path(raw, NOTE_TEXT_FIELD_PATH).is_some())
        })
}

fn read_all(mut reader: impl Read) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    reader.read_to_end(&mut out).ok()?;
    (!out.is_empty()).then_some(out)
}

fn printable_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|ch| !ch.is_control() || ch.is_whitespace())
        .collect()
}

/// Follows nested length-delimited fields and returns the innermost payload.
fn protobuf_path<'a>(message: &'a [u8], path: &[u64]) -> Option<&'a [u8]> {
    path.iter()
        .try_fold(message, |current, &field| protobuf_field(current, field))
}

/// First length-delimited occurrence of `wanted` in one protobuf message.
fn protobuf_field(message: &[u8], wanted: u64) -> Option<&[u8]> {
    let mut pos = 0;
    while pos < message.len() {
        let key = read_varint(message, &mut pos)?;
        let field = key >> 3;
        match key & 0x7 {
            WIRE_VARINT => {
                read_varint(message, &mut pos)?;
            }
            WIRE_FIXED64 => pos = pos.checked_add(8)?,
            WIRE_LENGTH_DELIMITED => {
                let len = usize::try_from(read_varint(message, &mut pos)?).ok()?;
                let end = pos.checked_add(len)?;
                let payload = message.get(pos..end)?;
                if field == wanted {
                    return Some(payload);
                }
                pos = end;
            }
            WIRE_FIXED32 => pos = pos.checked_add(4)?,
            _ => return None,
        }
    }
    None
}

fn read_varint(buf: &[u8], pos: &mut usize) -> Option<u64> {
    let mut value = 0u64;
    for shift in (0..64).step_by(7) {
        let byte = *buf.get(*pos)?;
        *pos += 1;
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Some(value);
        }
    }
    None
}

/// Converts an HTML note body to plain text.
///
/// Line-level elements become newlines, remaining tags are dropped, then
/// entities are decoded.
pub fn strip_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    let text = BLOCK_BREAK_RE.replace_all(html, "\n");
    let text = TAG_RE.replace_all(&text, "");
    let text = ENTITY_RE.replace_all(&text, |caps: &Captures<'_>| {
        decode_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string())
    });
    text.trim().to_string()
}

fn decode_entity(entity: &str) -> Option<String> {
    if let Some(number) = entity.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }
    let decoded = match entity {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        _ => return None,
    };
    Some(decoded.to_string())
}

#[cfg(test)]
mod tests {
    use super::{decode_note_body, protobuf_path, strip_html};
    use flate2::write::{DeflateEncoder, GzEncoder};
    use flate2::Compression;
    use std::io::Write;

    fn length_delimited(field: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![(field << 3) | 2, payload.len() as u8];
        out.extend_from_slice(payload);
        out
    }

    fn note_document(text: &str) -> Vec<u8> {
        let mut note = vec![0x08, 0x01];
        note.extend(length_delimited(2, text.as_bytes()));
        let document = length_delimited(3, &note);
        let mut version = vec![0x08, 0x00];
        version.extend(document);
        let mut root = vec![0x08, 0x00];
        root.extend(length_delimited(2, &version));
        root
    }

    #[test]
    fn walks_nested_protobuf_fields() {
        let doc = note_document("Groceries");
        assert_eq!(protobuf_path(&doc, &[2, 3, 2]), Some(&b"Groceries"[..]));
        assert_eq!(protobuf_path(&doc, &[2, 4]), None);
        assert_eq!(protobuf_path(&[0xff], &[2]), None);
    }

    #[test]
    fn decodes_gzip_protobuf_bodies() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&note_document("Groceries\nmilk \u{fffc}"))
            .unwrap();
        let data = encoder.finish().unwrap();
        assert_eq!(decode_note_body(&data), "Groceries\nmilk");
    }

    #[test]
    fn decodes_raw_deflate_bodies() {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&note_document("Packing list")).unwrap();
        let data = encoder.finish().unwrap();
        assert_eq!(decode_note_body(&data), "Packing list");
    }

    #[test]
    fn uncompressed_bodies_fall_back_to_text() {
        assert_eq!(decode_note_body(b"<b>plain</b> body"), "plain body");
    }

    #[test]
    fn strip_html_keeps_line_structure_and_entities() {
        let html = "<div>Fish &amp; chips</div><div>&lt;tag&gt;&#33;&#x21;</div>";
        assert_eq!(strip_html(html), "Fish & chips\n<tag>!!");
        assert_eq!(strip_html("&unknown; text"), "&unknown; text");
    }
}
