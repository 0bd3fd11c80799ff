//! Plain-text export for chats and notes.

use super::{
    create_dir, sanitize_file_name, write_file, ExportResult, ExportSummary, UniqueNamer,
    CHAT_NAME_CHARS, DEFAULT_NAME_CHARS, NOTE_NAME_MAX_CHARS,
};
use crate::format::{format_datetime, DATETIME_FORMAT, DATETIME_MINUTES_FORMAT};
use crate::model::message::Chat;
use crate::model::note::Note;
use log::{info, warn};
use std::path::Path;

const RULE_WIDTH: usize = 50;
const SELF_SENDER: &str = "Me";

/// Renders a chat as a readable transcript.
///
/// Incoming messages are attributed to their handle when known, otherwise to
/// the chat name.
pub fn chat_transcript(chat: &Chat) -> String {
    let mut lines = vec![
        format!("Chat with: {}", chat.display_name),
        "=".repeat(RULE_WIDTH),
        String::new(),
    ];
    for message in &chat.messages {
        let sender = if message.is_from_me {
            SELF_SENDER
        } else {
            message.sender.as_deref().unwrap_or(&chat.display_name)
        };
        lines.push(format!(
            "[{}] {sender}:",
            format_datetime(message.date, DATETIME_FORMAT)
        ));
        if message.text.is_empty() {
            lines.push("  ".to_string());
        }
        lines.extend(message.text.lines().map(|line| format!("  {line}")));
        lines.push(String::new());
    }
    lines.join("\n")
}

/// Renders a note with its title, dates and body.
pub fn note_document(note: &Note) -> String {
    [
        note.title.clone(),
        "=".repeat(note.title.chars().count()),
        String::new(),
        format!(
            "Created: {}",
            format_datetime(note.created, DATETIME_MINUTES_FORMAT)
        ),
        format!(
            "Modified: {}",
            format_datetime(note.modified, DATETIME_MINUTES_FORMAT)
        ),
        String::new(),
        "-".repeat(RULE_WIDTH),
        String::new(),
        note.content.clone(),
    ]
    .join("\n")
}

/// Writes one transcript per chat; chats without messages are skipped.
pub fn export_chats(chats: &[Chat], destination: &Path) -> ExportResult<ExportSummary> {
    let mut summary = ExportSummary::default();
    if chats.is_empty() {
        return Ok(summary);
    }
    create_dir(destination)?;

    let mut namer = UniqueNamer::new();
    for chat in chats {
        if chat.messages.is_empty() {
            summary.skipped += 1;
            continue;
        }
        let stem = sanitize_file_name(&chat.display_name, CHAT_NAME_CHARS, None);
        let target = destination.join(namer.claim(&format!("{stem}.txt")));
        record(&mut summary, "export_chat", write_file(&target, &chat_transcript(chat)));
    }

    info!(
        "event=export_chat module=export status=ok exported={} skipped={} failed={}",
        summary.exported, summary.skipped, summary.failed
    );
    Ok(summary)
}

/// Writes one text file per note, named after its title.
pub fn export_notes(notes: &[Note], destination: &Path) -> ExportResult<ExportSummary> {
    let mut summary = ExportSummary::default();
    if notes.is_empty() {
        return Ok(summary);
    }
    create_dir(destination)?;

    let mut namer = UniqueNamer::new();
    for note in notes {
        let stem = sanitize_file_name(&note.title, DEFAULT_NAME_CHARS, Some(NOTE_NAME_MAX_CHARS));
        let target = destination.join(namer.claim(&format!("{stem}.txt")));
        record(&mut summary, "export_note", write_file(&target, &note_document(note)));
    }

    info!(
        "event=export_note module=export status=ok exported={} failed={}",
        summary.exported, summary.failed
    );
    Ok(summary)
}

fn record(summary: &mut ExportSummary, event: &str, result: ExportResult<()>) {
    match result {
        Ok(()) => summary.exported += 1,
        Err(err) => {
            warn!("event={event} module=export status=failed error={err}");
            summary.failed += 1;
        }
    }
}
