//! Blob naming used by iOS backups.
//!
//! Each backed-up file is stored under `hex(SHA1("{domain}-{relative_path}"))`.

use sha1::{Digest, Sha1};

/// Length of a blob name in hex characters.
pub const FILE_ID_LEN: usize = 40;

/// Computes the blob name for a logical `(domain, relative_path)` pair.
pub fn file_id(domain: &str, relative_path: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(domain.as_bytes());
    hasher.update(b"-");
    hasher.update(relative_path.as_bytes());
    hex::encode(hasher.finalize())
}

/// Returns whether `value` has the shape of a blob name.
pub fn is_file_id(value: &str) -> bool {
    value.len() == FILE_ID_LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::{file_id, is_file_id};

    #[test]
    fn file_id_matches_known_sms_db_name() {
        assert_eq!(
            file_id("HomeDomain", "Library/SMS/sms.db"),
            "3d0d7e5fb2ce288813306e4d4636395e047a3d28"
        );
    }

    #[test]
    fn file_id_matches_known_address_book_name() {
        assert_eq!(
            file_id("HomeDomain", "Library/AddressBook/AddressBook.sqlitedb"),
            "31bb7ba8914766d4ba40d6dfb6113c8b614be442"
        );
    }

    #[test]
    fn file_id_is_lowercase_hex_of_fixed_length() {
        let id = file_id("CameraRollDomain", "Media/DCIM/100APPLE/IMG_0001.JPG");
        assert!(is_file_id(&id));
        assert_eq!(id, id.to_lowercase());
        assert!(!is_file_id("not-a-hash"));
    }
}
