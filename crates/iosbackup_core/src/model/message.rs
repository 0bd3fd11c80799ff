//! Messages conversations.

use chrono::{DateTime, Utc};
use serde::Serialize;

pub const SERVICE_IMESSAGE: &str = "iMessage";

/// One iMessage or SMS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// `message.ROWID`.
    pub id: i64,
    pub chat_id: i64,
    pub text: String,
    pub date: Option<DateTime<Utc>>,
    pub is_from_me: bool,
    pub handle_id: i64,
    /// Phone number or address of the sender when not sent by the owner.
    pub sender: Option<String>,
    /// `iMessage`, `SMS` or empty.
    pub service: String,
}

/// A conversation with its messages in ascending date order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chat {
    /// `chat.ROWID`.
    pub chat_id: i64,
    pub identifier: String,
    pub display_name: String,
    pub participants: Vec<String>,
    pub messages: Vec<Message>,
    pub last_message_date: Option<DateTime<Utc>>,
}

impl Chat {
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// First 100 characters of the last message.
    pub fn preview(&self) -> String {
        self.messages
            .last()
            .map(|message| message.text.chars().take(100).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MessageStats {
    pub chat_count: usize,
    pub message_count: usize,
    pub imessage_count: usize,
    pub sms_count: usize,
}
