//! Where each data category lives inside a backup.

pub const HOME_DOMAIN: &str = "HomeDomain";
pub const WIRELESS_DOMAIN: &str = "WirelessDomain";
pub const CAMERA_ROLL_DOMAIN: &str = "CameraRollDomain";
pub const MEDIA_DOMAIN: &str = "MediaDomain";
pub const NOTES_GROUP_DOMAIN: &str = "AppDomainGroup-group.com.apple.notes";

pub const CAMERA_ROLL_DOMAINS: &[&str] = &[CAMERA_ROLL_DOMAIN, MEDIA_DOMAIN];
pub const CAMERA_ROLL_PREFIXES: &[&str] = &["Media/DCIM", "Media/PhotoData"];

pub const ADDRESS_BOOK_PATH: &str = "Library/AddressBook/AddressBook.sqlitedb";
pub const SMS_DB_PATH: &str = "Library/SMS/sms.db";
pub const NOTE_STORE_FILE: &str = "NoteStore.sqlite";
pub const LEGACY_NOTES_PATH: &str = "Library/Notes/notes.sqlite";
pub const CALL_HISTORY_FILE: &str = "CallHistory.storedata";
pub const LEGACY_CALL_HISTORY_FILE: &str = "call_history.db";

pub const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".heic", ".heif", ".gif", ".bmp", ".tiff", ".webp",
];
pub const VIDEO_EXTENSIONS: &[&str] = &[".mov", ".mp4", ".m4v", ".avi", ".3gp"];

/// Returns whether a lowercase dotted extension is a camera-roll image.
pub fn is_image_extension(extension: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&extension)
}

/// Returns whether a lowercase dotted extension is a camera-roll video.
pub fn is_video_extension(extension: &str) -> bool {
    VIDEO_EXTENSIONS.contains(&extension)
}

pub fn is_media_extension(extension: &str) -> bool {
    is_image_extension(extension) || is_video_extension(extension)
}
