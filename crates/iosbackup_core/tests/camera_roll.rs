mod common;

use common::BackupFixture;
use iosbackup_core::{BackupSession, MediaKind};

fn camera_roll_fixture() -> BackupFixture {
    let fixture = BackupFixture::new();
    fixture.add_file(
        "CameraRollDomain",
        "Media/DCIM/100APPLE/IMG_0001.JPG",
        b"old photo",
        Some(1_600_000_000),
    );
    fixture.add_file(
        "CameraRollDomain",
        "Media/DCIM/100APPLE/IMG_0002.MOV",
        b"newest video bytes",
        Some(1_700_000_000),
    );
    fixture.add_file(
        "CameraRollDomain",
        "Media/DCIM/101APPLE/IMG_0003.HEIC",
        b"undated",
        None,
    );
    fixture.add_file(
        "CameraRollDomain",
        "Media/DCIM/100APPLE/IMG_0004.PNG",
        b"same day",
        Some(1_600_000_000),
    );
    fixture.add_missing_file("CameraRollDomain", "Media/DCIM/100APPLE/IMG_0005.MP4", 4_096);
    fixture
}

#[test]
fn media_is_sorted_newest_first() {
    let fixture = camera_roll_fixture();
    let session = BackupSession::open(fixture.path()).unwrap();
    let media = session.camera_roll().all_media().unwrap();
    let names: Vec<&str> = media.iter().map(|file| file.file_name()).collect();
    assert_eq!(
        names,
        vec![
            "IMG_0002.MOV",
            "IMG_0001.JPG",
            "IMG_0004.PNG",
            "IMG_0005.MP4",
            "IMG_0003.HEIC",
        ]
    );
    assert_eq!(
        media[0].source_path,
        fixture.blob_location(&media[0].file.file_id)
    );
}

#[test]
fn photos_and_videos_are_filtered_by_extension() {
    let fixture = camera_roll_fixture();
    let session = BackupSession::open(fixture.path()).unwrap();
    let extractor = session.camera_roll();

    let photos = extractor.photos().unwrap();
    assert_eq!(photos.len(), 3);
    assert!(photos.iter().all(|file| file.is_image()));

    let videos = extractor.videos().unwrap();
    assert_eq!(videos.len(), 2);
    assert!(videos.iter().all(|file| file.kind() == Some(MediaKind::Video)));

    assert_eq!(extractor.media_of_kind(None).unwrap().len(), 5);

    let stats = extractor.stats().unwrap();
    assert_eq!(stats.total_count, 5);
    assert_eq!(stats.photo_count, 3);
    assert_eq!(stats.video_count, 2);
    assert_eq!(stats.video_size, 18 + 4_096);
    assert_eq!(stats.photo_size, 9 + 7 + 8);
}

#[test]
fn previews_read_a_prefix_of_existing_blobs() {
    let fixture = camera_roll_fixture();
    let session = BackupSession::open(fixture.path()).unwrap();
    let media = session.camera_roll().all_media().unwrap();

    assert_eq!(media[0].read_preview(6).unwrap(), Some(b"newest".to_vec()));
    assert_eq!(
        media[1].read_preview(1_024).unwrap(),
        Some(b"old photo".to_vec())
    );
    assert!(!media[3].exists());
    assert_eq!(media[3].read_preview(16).unwrap(), None);
}

#[test]
fn backups_without_camera_roll_have_no_media() {
    let fixture = BackupFixture::new();
    let session = BackupSession::open(fixture.path()).unwrap();
    assert!(session.camera_roll().all_media().unwrap().is_empty());
    assert_eq!(session.camera_roll().stats().unwrap().total_count, 0);
}
