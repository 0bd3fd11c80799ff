//! Decoding of the `Files.file` metadata blob.
//!
//! The blob is a binary property list, normally an `NSKeyedArchiver` archive
//! whose `$objects` array holds an `MBFile` dictionary with `Size`, `Mode`,
//! `LastModified` and `Birth`. Some tools write the dictionary flat.

use crate::model::file::FileMetadata;
use chrono::{DateTime, Utc};
use plist::{Dictionary, Value};
use std::io::Cursor;

/// Decodes file metadata, returning defaults for empty or malformed blobs.
pub fn parse_file_blob(blob: &[u8]) -> FileMetadata {
    if blob.is_empty() {
        return FileMetadata::default();
    }
    let Ok(root) = Value::from_reader(Cursor::new(blob)) else {
        return FileMetadata::default();
    };
    let Some(root) = root.as_dictionary() else {
        return FileMetadata::default();
    };

    let mut metadata = FileMetadata::default();
    match root.get("$objects").and_then(Value::as_array) {
        Some(objects) => {
            for object in objects.iter().filter_map(Value::as_dictionary) {
                merge_fields(&mut metadata, object);
            }
        }
        None => merge_fields(&mut metadata, root),
    }
    metadata
}

fn merge_fields(metadata: &mut FileMetadata, dict: &Dictionary) {
    if let Some(size) = dict.get("Size").and_then(integer) {
        metadata.size = u64::try_from(size).unwrap_or(0);
    }
    if let Some(mode) = dict.get("Mode").and_then(integer) {
        metadata.mode = u32::try_from(mode).unwrap_or(0);
    }
    if let Some(modified) = dict.get("LastModified").and_then(timestamp) {
        metadata.modified = Some(modified);
    }
    if let Some(created) = dict.get("Birth").and_then(timestamp) {
        metadata.created = Some(created);
    }
}

fn integer(value: &Value) -> Option<i64> {
    value
        .as_signed_integer()
        .or_else(|| value.as_unsigned_integer().and_then(|v| i64::try_from(v).ok()))
        .or_else(|| value.as_real().map(|v| v as i64))
}

fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Date(date) => Some(DateTime::<Utc>::from(std::time::SystemTime::from(*date))),
        other => integer(other).and_then(|secs| DateTime::from_timestamp(secs, 0)),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_file_blob;
    use plist::{Dictionary, Value};

    fn binary(value: Value) -> Vec<u8> {
        let mut out = Vec::new();
        value.to_writer_binary(&mut out).unwrap();
        out
    }

    fn mbfile() -> Dictionary {
        let mut dict = Dictionary::new();
        dict.insert("Size".into(), Value::from(2048_i64));
        dict.insert("Mode".into(), Value::from(33188_i64));
        dict.insert("LastModified".into(), Value::from(1_700_000_000_i64));
        dict.insert("Birth".into(), Value::from(1_600_000_000_i64));
        dict
    }

    #[test]
    fn keyed_archive_objects_are_scanned() {
        let mut root = Dictionary::new();
        root.insert(
            "$objects".into(),
            Value::Array(vec![
                Value::String("$null".into()),
                Value::Dictionary(mbfile()),
            ]),
        );
        let metadata = parse_file_blob(&binary(Value::Dictionary(root)));
        assert_eq!(metadata.size, 2048);
        assert_eq!(metadata.mode, 33188);
        assert_eq!(metadata.modified.unwrap().timestamp(), 1_700_000_000);
        assert_eq!(metadata.created.unwrap().timestamp(), 1_600_000_000);
    }

    #[test]
    fn flat_dictionary_is_accepted() {
        let metadata = parse_file_blob(&binary(Value::Dictionary(mbfile())));
        assert_eq!(metadata.size, 2048);
    }

    #[test]
    fn garbage_yields_default_metadata() {
        assert_eq!(parse_file_blob(b"not a plist").size, 0);
        assert!(parse_file_blob(&[]).modified.is_none());
    }
}
