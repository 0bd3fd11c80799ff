//! Writing extracted data to a destination folder.
//!
//! # Responsibility
//! - Turn records into portable files: media copies, vCards, text
//!   transcripts and CSV call logs.
//! - Derive safe, unique file names from user-controlled titles.
//!
//! # Invariants
//! - Nothing is written into the backup folder.
//! - Empty inputs write nothing and report zero.
//! - A failure on one item is counted and logged; the batch continues.

use crate::extract::ExtractError;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub mod call_log;
pub mod media;
pub mod transcript;
pub mod vcard;

pub type ExportResult<T> = Result<T, ExportError>;

/// Characters kept in file names besides alphanumerics.
pub const DEFAULT_NAME_CHARS: &str = " ._-";
/// Chat names may carry phone numbers and addresses.
pub const CHAT_NAME_CHARS: &str = " ._-@+";
/// Longest note file name stem, in characters.
pub const NOTE_NAME_MAX_CHARS: usize = 100;
const FALLBACK_NAME: &str = "untitled";

#[derive(Debug)]
pub enum ExportError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Csv(csv::Error),
    Extract(ExtractError),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to write {}: {source}", path.display())
            }
            Self::Csv(err) => write!(f, "failed to write CSV: {err}"),
            Self::Extract(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv(err) => Some(err),
            Self::Extract(err) => Some(err),
        }
    }
}

impl From<csv::Error> for ExportError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<ExtractError> for ExportError {
    fn from(value: ExtractError) -> Self {
        Self::Extract(value)
    }
}

/// Outcome of a batch export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ExportSummary {
    pub exported: usize,
    /// Items with nothing to write, such as blobs missing from the backup.
    pub skipped: usize,
    pub failed: usize,
}

/// Progress snapshot passed to export callbacks before each item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportProgress {
    /// 1-based index of the item being exported.
    pub current: usize,
    pub total: usize,
    pub current_file: String,
    pub bytes_copied: u64,
    pub total_bytes: u64,
}

impl ExportProgress {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.current as f64 / self.total as f64 * 100.0
    }

    pub fn bytes_percentage(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.bytes_copied as f64 / self.total_bytes as f64 * 100.0
    }
}

/// Keeps alphanumerics and `allowed`, drops everything else.
///
/// Truncates to `max_chars` when given. Returns `untitled` when nothing is left.
pub fn sanitize_file_name(name: &str, allowed: &str, max_chars: Option<usize>) -> String {
    let cleaned: String = name
        .chars()
        .filter(|&ch| ch.is_alphanumeric() || allowed.contains(ch))
        .take(max_chars.unwrap_or(usize::MAX))
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned.chars().all(|ch| ch == '.') {
        return FALLBACK_NAME.to_string();
    }
    cleaned.to_string()
}

/// Hands out file names that do not collide within one destination.
///
/// Comparison is case-insensitive so results are safe on macOS and Windows
/// volumes. The second `IMG.JPG` becomes `IMG_1.JPG`, the third `IMG_2.JPG`.
#[derive(Debug, Default)]
pub struct UniqueNamer {
    claimed: HashSet<String>,
    counters: HashMap<String, usize>,
}

impl UniqueNamer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, name: &str) -> String {
        if self.claimed.insert(name.to_lowercase()) {
            return name.to_string();
        }
        let (stem, extension) = split_extension(name);
        let counter = self.counters.entry(name.to_lowercase()).or_insert(0);
        loop {
            *counter += 1;
            let candidate = format!("{stem}_{counter}{extension}");
            if self.claimed.insert(candidate.to_lowercase()) {
                return candidate;
            }
        }
    }
}

/// Splits `IMG.JPG` into `("IMG", ".JPG")`; dotfiles keep their name as stem.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(index) if index > 0 => name.split_at(index),
        _ => (name, ""),
    }
}

pub(crate) fn create_dir(path: &Path) -> ExportResult<()> {
    std::fs::create_dir_all(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write_file(path: &Path, contents: &str) -> ExportResult<()> {
    std::fs::write(path, contents).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::{sanitize_file_name, ExportProgress, UniqueNamer, CHAT_NAME_CHARS, DEFAULT_NAME_CHARS};

    #[test]
    fn sanitize_keeps_allowed_characters() {
        assert_eq!(
            sanitize_file_name("Trip: Rome/Paris?.txt", DEFAULT_NAME_CHARS, None),
            "Trip RomeParis.txt"
        );
        assert_eq!(
            sanitize_file_name("+1 (555) 010-0199", CHAT_NAME_CHARS, None),
            "+1 555 010-0199"
        );
        assert_eq!(sanitize_file_name("???", DEFAULT_NAME_CHARS, None), "untitled");
        assert_eq!(sanitize_file_name("abcdef", DEFAULT_NAME_CHARS, Some(3)), "abc");
    }

    #[test]
    fn namer_suffixes_collisions_case_insensitively() {
        let mut namer = UniqueNamer::new();
        assert_eq!(namer.claim("IMG_0001.JPG"), "IMG_0001.JPG");
        assert_eq!(namer.claim("img_0001.jpg"), "img_0001_1.jpg");
        assert_eq!(namer.claim("IMG_0001.JPG"), "IMG_0001_2.JPG");
        assert_eq!(namer.claim("README"), "README");
        assert_eq!(namer.claim("README"), "README_1");
    }

    #[test]
    fn namer_skips_names_taken_by_real_files() {
        let mut namer = UniqueNamer::new();
        namer.claim("a_1.txt");
        namer.claim("a.txt");
        assert_eq!(namer.claim("a.txt"), "a_2.txt");
    }

    #[test]
    fn progress_percentages_handle_empty_totals() {
        let progress = ExportProgress {
            current: 1,
            total: 4,
            current_file: "a".to_string(),
            bytes_copied: 0,
            total_bytes: 0,
        };
        assert_eq!(progress.percentage(), 25.0);
        assert_eq!(progress.bytes_percentage(), 0.0);
    }
}
