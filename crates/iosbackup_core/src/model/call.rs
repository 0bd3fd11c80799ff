//! Phone call log entries.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    Incoming,
    Outgoing,
    Missed,
    Cancelled,
    Blocked,
    Unknown,
}

impl CallType {
    /// Maps the stored call type code.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Incoming,
            2 => Self::Outgoing,
            3 => Self::Missed,
            4 => Self::Cancelled,
            5 => Self::Blocked,
            _ => Self::Unknown,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Incoming => "Incoming",
            Self::Outgoing => "Outgoing",
            Self::Missed => "Missed",
            Self::Cancelled => "Cancelled",
            Self::Blocked => "Blocked",
            Self::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallRecord {
    pub id: i64,
    /// Phone number or handle; may be empty.
    pub address: String,
    pub date: Option<DateTime<Utc>>,
    pub duration_secs: u64,
    pub call_type: CallType,
    pub answered: bool,
}

impl CallRecord {
    pub fn phone_number(&self) -> &str {
        if self.address.is_empty() {
            "Unknown"
        } else {
            &self.address
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CallStats {
    pub total_calls: usize,
    pub incoming: usize,
    pub outgoing: usize,
    pub missed: usize,
    pub total_duration_secs: u64,
}
