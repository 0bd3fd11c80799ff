//! Address book contacts.

use serde::Serialize;

const UNKNOWN_NAME: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Contact {
    /// `ABPerson.ROWID`.
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub organization: String,
    pub phone_numbers: Vec<String>,
    pub emails: Vec<String>,
    pub note: String,
}

impl Contact {
    /// First and last name, else organization, else `Unknown`.
    pub fn full_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_str(), self.last_name.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect();
        if !parts.is_empty() {
            return parts.join(" ");
        }
        if !self.organization.is_empty() {
            return self.organization.clone();
        }
        UNKNOWN_NAME.to_string()
    }

    pub fn display_name(&self) -> String {
        self.full_name()
    }

    pub fn primary_phone(&self) -> Option<&str> {
        self.phone_numbers.first().map(String::as_str)
    }

    pub fn primary_email(&self) -> Option<&str> {
        self.emails.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContactStats {
    pub total_count: usize,
    pub with_phones: usize,
    pub with_emails: usize,
}
