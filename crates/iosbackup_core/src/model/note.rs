//! Notes app content.

use chrono::{DateTime, Utc};
use serde::Serialize;

pub const DEFAULT_FOLDER: &str = "Notes";
const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
    /// Plain text body.
    pub content: String,
    /// Original HTML body for schemas that store HTML.
    pub html_content: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub folder: String,
}

impl Note {
    /// First 200 characters, with `...` when truncated.
    pub fn preview(&self) -> String {
        let mut text: String = self.content.chars().take(PREVIEW_CHARS).collect();
        if self.content.chars().count() > PREVIEW_CHARS {
            text.push_str("...");
        }
        text
    }

    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NoteStats {
    pub note_count: usize,
    pub total_words: usize,
}
