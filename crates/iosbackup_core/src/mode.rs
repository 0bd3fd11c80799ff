//! Data categories and Lite/Pro feature gating.
//!
//! # Invariants
//! - Lite mode only allows categories that are not `pro_only`.
//! - Category keys are stable identifiers used on the command line and in
//!   configuration.

use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug)]
pub enum ModeError {
    /// Category requires Pro mode.
    ProOnly(Category),
    UnknownCategory(String),
    UnknownMode(String),
}

impl Display for ModeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProOnly(category) => {
                write!(f, "{} is only available in Pro mode", category.name())
            }
            Self::UnknownCategory(value) => write!(
                f,
                "unknown category `{value}` (expected one of: {})",
                Category::ALL.map(Category::key).join(", ")
            ),
            Self::UnknownMode(value) => {
                write!(f, "unknown mode `{value}` (expected `lite` or `pro`)")
            }
        }
    }
}

impl Error for ModeError {}

/// A browsable kind of personal data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    CameraRoll,
    Contacts,
    Messages,
    Notes,
    CallHistory,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Self::CameraRoll,
        Self::Contacts,
        Self::Messages,
        Self::Notes,
        Self::CallHistory,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::CameraRoll => "camera_roll",
            Self::Contacts => "contacts",
            Self::Messages => "messages",
            Self::Notes => "notes",
            Self::CallHistory => "call_history",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::CameraRoll => "Camera Roll",
            Self::Contacts => "Contacts",
            Self::Messages => "Messages",
            Self::Notes => "Notes",
            Self::CallHistory => "Call History",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::CameraRoll => "Photos and videos from your device",
            Self::Contacts => "Address book contacts",
            Self::Messages => "iMessage and SMS conversations",
            Self::Notes => "Notes app content",
            Self::CallHistory => "Phone call logs",
        }
    }

    pub fn pro_only(self) -> bool {
        !matches!(self, Self::CameraRoll)
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = ModeError;

    /// Accepts the key, case-insensitively, with `-` or `_` separators.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|category| category.key() == normalized)
            .ok_or_else(|| ModeError::UnknownCategory(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Camera roll only.
    Lite,
    /// Every category.
    #[default]
    Pro,
}

impl Mode {
    pub fn allows(self, category: Category) -> bool {
        match self {
            Self::Pro => true,
            Self::Lite => !category.pro_only(),
        }
    }

    pub fn ensure_allows(self, category: Category) -> Result<(), ModeError> {
        if self.allows(category) {
            Ok(())
        } else {
            Err(ModeError::ProOnly(category))
        }
    }

    /// Categories available in this mode, in display order.
    pub fn categories(self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|&category| self.allows(category))
            .collect()
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lite => f.write_str("lite"),
            Self::Pro => f.write_str("pro"),
        }
    }
}

impl FromStr for Mode {
    type Err = ModeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lite" => Ok(Self::Lite),
            "pro" => Ok(Self::Pro),
            _ => Err(ModeError::UnknownMode(value.to_string())),
        }
    }
}
