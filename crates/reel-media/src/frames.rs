//! Preview frame extraction.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::filter_sample_every;

/// Default seconds between extracted frames.
pub const DEFAULT_FRAME_INTERVAL_SECS: f64 = 2.0;

/// File name pattern for extracted frames.
const FRAME_PATTERN: &str = "frame_%d.jpg";

/// Write one JPEG every `interval_secs` into `dir` as `frame_<n>.jpg`,
/// numbered from 0.
///
/// Frames left in `dir` by an earlier run are removed first. Returns the
/// extracted frame paths in order.
pub async fn extract_frames(
    video: impl AsRef<Path>,
    dir: impl AsRef<Path>,
    interval_secs: f64,
) -> MediaResult<Vec<PathBuf>> {
    let video = video.as_ref();
    let dir = dir.as_ref();

    if !(interval_secs.is_finite() && interval_secs > 0.0) {
        return Err(MediaError::internal(format!(
            "Frame interval must be positive, got {}",
            interval_secs
        )));
    }

    tokio::fs::create_dir_all(dir).await?;
    let removed = clear_frames(dir).await?;
    if removed > 0 {
        debug!(dir = %dir.display(), removed, "Removed previous preview frames");
    }

    FfmpegRunner::new()
        .run(&frames_command(video, dir, interval_secs))
        .await?;

    let frames = list_frames(dir).await?;
    info!(
        video = %video.display(),
        dir = %dir.display(),
        count = frames.len(),
        "Extracted preview frames"
    );
    Ok(frames)
}

fn frames_command(video: &Path, dir: &Path, interval_secs: f64) -> FfmpegCommand {
    FfmpegCommand::new(video, dir.join(FRAME_PATTERN))
        .video_filter(filter_sample_every(interval_secs))
        .output_args(["-q:v", "2", "-start_number", "0"])
}

/// Delete `frame_<n>.jpg` files in `dir`, leaving anything else. Returns how many went.
async fn clear_frames(dir: &Path) -> MediaResult<usize> {
    let mut removed = 0;
    for path in list_frames(dir).await? {
        tokio::fs::remove_file(&path).await?;
        removed += 1;
    }
    Ok(removed)
}

/// Frame files in `dir`, ordered by their index.
async fn list_frames(dir: &Path) -> MediaResult<Vec<PathBuf>> {
    let mut indexed = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if let Some(index) = frame_index(&path) {
            indexed.push((index, path));
        }
    }
    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, path)| path).collect())
}

fn frame_index(path: &Path) -> Option<u64> {
    let name = path.file_name()?.to_str()?;
    name.strip_prefix("frame_")?.strip_suffix(".jpg")?.parse().ok()
}
