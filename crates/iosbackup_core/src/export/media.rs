//! Copying camera roll blobs out of a backup under their original names.

use super::{create_dir, ExportProgress, ExportResult, ExportSummary, UniqueNamer};
use crate::extract::camera_roll::CameraRollExtractor;
use crate::model::media::{MediaFile, MediaKind};
use log::{debug, info, warn};
use std::fs::File;
use std::path::Path;
use std::time::SystemTime;

/// Copies `files` into `destination`, calling `on_progress` before each copy.
///
/// Blobs missing from the backup are skipped; copy failures are counted and
/// the batch continues.
pub fn export_media<F>(
    files: &[MediaFile],
    destination: &Path,
    mut on_progress: F,
) -> ExportResult<ExportSummary>
where
    F: FnMut(&ExportProgress),
{
    let mut summary = ExportSummary::default();
    if files.is_empty() {
        return Ok(summary);
    }
    create_dir(destination)?;

    let total_bytes = files.iter().map(MediaFile::size).sum();
    let mut bytes_copied = 0;
    let mut namer = UniqueNamer::new();

    for (index, media) in files.iter().enumerate() {
        let file_name = namer.claim(media.file_name());
        on_progress(&ExportProgress {
            current: index + 1,
            total: files.len(),
            current_file: file_name.clone(),
            bytes_copied,
            total_bytes,
        });

        if !media.exists() {
            warn!(
                "event=export_media module=export status=skipped reason=missing_blob file_id={}",
                media.file.file_id
            );
            summary.skipped += 1;
            continue;
        }

        let target = destination.join(&file_name);
        match std::fs::copy(&media.source_path, &target) {
            Ok(copied) => {
                bytes_copied += copied;
                summary.exported += 1;
                if let Some(modified) = media.modified() {
                    preserve_modified_time(&target, modified.into());
                }
            }
            Err(err) => {
                warn!(
                    "event=export_media module=export status=failed file_id={} error={}",
                    media.file.file_id, err
                );
                summary.failed += 1;
            }
        }
    }

    info!(
        "event=export_media module=export status=ok exported={} skipped={} failed={} bytes={}",
        summary.exported, summary.skipped, summary.failed, bytes_copied
    );
    Ok(summary)
}

/// Exports the whole camera roll, or only photos or videos.
pub fn export_camera_roll<F>(
    extractor: &CameraRollExtractor<'_>,
    kind: Option<MediaKind>,
    destination: &Path,
    on_progress: F,
) -> ExportResult<ExportSummary>
where
    F: FnMut(&ExportProgress),
{
    let media = extractor.media_of_kind(kind)?;
    export_media(&media, destination, on_progress)
}

fn preserve_modified_time(path: &Path, modified: SystemTime) {
    let result = File::options()
        .write(true)
        .open(path)
        .and_then(|file| file.set_modified(modified));
    if let Err(err) = result {
        debug!(
            "event=export_media module=export status=mtime_unset path={} error={}",
            path.display(),
            err
        );
    }
}
