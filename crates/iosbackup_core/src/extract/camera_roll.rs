//! Camera roll photos and videos.

use super::ExtractResult;
use crate::model::media::{MediaFile, MediaKind, MediaStats};
use crate::session::BackupSession;
use log::info;

pub struct CameraRollExtractor<'s> {
    session: &'s BackupSession,
}

impl<'s> CameraRollExtractor<'s> {
    pub fn new(session: &'s BackupSession) -> Self {
        Self { session }
    }

    /// Every photo and video, newest modification first.
    ///
    /// Undated entries sort last; ties keep original-path order.
    pub fn all_media(&self) -> ExtractResult<Vec<MediaFile>> {
        let mut media: Vec<MediaFile> = self
            .session
            .camera_roll_files()?
            .into_iter()
            .map(|file| MediaFile {
                source_path: self.session.blob_path(&file),
                file,
            })
            .collect();
        media.sort_by(|a, b| {
            b.modified()
                .cmp(&a.modified())
                .then_with(|| a.original_path().cmp(b.original_path()))
        });
        info!(
            "event=extract module=camera_roll status=ok count={}",
            media.len()
        );
        Ok(media)
    }

    /// Media of one kind, or everything when `kind` is `None`.
    pub fn media_of_kind(&self, kind: Option<MediaKind>) -> ExtractResult<Vec<MediaFile>> {
        let media = self.all_media()?;
        Ok(match kind {
            Some(kind) => media
                .into_iter()
                .filter(|file| file.kind() == Some(kind))
                .collect(),
            None => media,
        })
    }

    pub fn photos(&self) -> ExtractResult<Vec<MediaFile>> {
        self.media_of_kind(Some(MediaKind::Photo))
    }

    pub fn videos(&self) -> ExtractResult<Vec<MediaFile>> {
        self.media_of_kind(Some(MediaKind::Video))
    }

    pub fn stats(&self) -> ExtractResult<MediaStats> {
        Ok(media_stats(&self.all_media()?))
    }
}

/// Counts and byte totals for a media listing.
pub fn media_stats(media: &[MediaFile]) -> MediaStats {
    let mut stats = MediaStats::default();
    for file in media {
        match file.kind() {
            Some(MediaKind::Photo) => {
                stats.photo_count += 1;
                stats.photo_size += file.size();
            }
            Some(MediaKind::Video) => {
                stats.video_count += 1;
                stats.video_size += file.size();
            }
            None => continue,
        }
        stats.total_count += 1;
        stats.total_size += file.size();
    }
    stats
}
