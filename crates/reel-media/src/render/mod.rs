//! Highlight reel rendering.
//!
//! Cuts every highlight interval out of the source video, burns captions into
//! the frames whose playback position matches a caption start, and joins the
//! cuts into one silent clip.
//!
//! Two backends:
//! - [`FfmpegReelRenderer`]: per-interval FFmpeg cuts with `drawtext`, then the
//!   concat demuxer. Always available.
//! - `OpencvReelRenderer` (feature `opencv`): frame-by-frame decode and
//!   re-encode at the source fps and resolution.

mod ffmpeg;
#[cfg(feature = "opencv")]
mod opencv_backend;

use std::fmt::Display;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reel_models::{HighlightSet, TranscriptSegment};
use tracing::warn;

use crate::error::{MediaError, MediaResult};

pub use ffmpeg::FfmpegReelRenderer;
#[cfg(feature = "opencv")]
pub use opencv_backend::OpencvReelRenderer;

/// Default reel file name inside the highlights directory.
pub const HIGHLIGHT_FILE_NAME: &str = "highlight.mp4";

/// Result of a render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutcome {
    /// Rendered file
    pub path: PathBuf,
    /// Intervals that made it into the reel
    pub segments_rendered: usize,
    /// Intervals dropped after a decode or encode failure
    pub segments_skipped: usize,
}

/// Renders a highlight reel from a source video.
#[async_trait]
pub trait ReelRenderer: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Write the reel for `highlights` to `output`.
    ///
    /// A failing interval is skipped. Fails when the source cannot be opened
    /// or when a non-empty set produced no output at all. An empty set writes
    /// nothing and reports zero segments.
    async fn render(
        &self,
        source: &Path,
        highlights: &HighlightSet,
        transcript: &[TranscriptSegment],
        output: &Path,
    ) -> MediaResult<RenderOutcome>;
}

fn record_skipped_segment(backend: &'static str) {
    metrics::counter!("reel_render_segments_skipped_total", "backend" => backend).increment(1);
}

/// Per-segment bookkeeping: a failed segment is counted and skipped, the
/// reel fails only when nothing was rendered.
#[derive(Debug)]
pub(crate) struct SegmentTally {
    backend: &'static str,
    rendered: usize,
    skipped: usize,
}

impl SegmentTally {
    pub(crate) fn new(backend: &'static str) -> Self {
        Self {
            backend,
            rendered: 0,
            skipped: 0,
        }
    }

    pub(crate) fn rendered(&mut self) {
        self.rendered += 1;
    }

    pub(crate) fn skipped(&mut self, segment: usize, reason: impl Display) {
        warn!(backend = self.backend, segment, reason = %reason, "Skipping highlight segment");
        self.skipped += 1;
        record_skipped_segment(self.backend);
    }

    /// Record a segment from the number of frames it wrote, or the error that stopped it.
    pub(crate) fn record<E: Display>(&mut self, segment: usize, frames: Result<u64, E>) {
        match frames {
            Ok(n) if n > 0 => self.rendered(),
            Ok(_) => self.skipped(segment, "no frames decoded"),
            Err(e) => self.skipped(segment, e),
        }
    }

    pub(crate) fn has_rendered(&self) -> bool {
        self.rendered > 0
    }

    pub(crate) fn into_outcome(self, path: &Path, total: usize) -> MediaResult<RenderOutcome> {
        if self.rendered == 0 {
            return Err(MediaError::render_failed(format!(
                "none of the {total} highlight segments could be rendered"
            )));
        }
        Ok(RenderOutcome {
            path: path.to_path_buf(),
            segments_rendered: self.rendered,
            segments_skipped: self.skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_segment_is_skipped_and_later_segments_count() {
        let mut tally = SegmentTally::new("test");
        tally.record::<&str>(0, Ok(48));
        tally.record(1, Err("frame read failed"));
        tally.record::<&str>(2, Ok(0));
        tally.record::<&str>(3, Ok(30));

        assert!(tally.has_rendered());
        let outcome = tally.into_outcome(Path::new("out.mp4"), 4).unwrap();
        assert_eq!(
            outcome,
            RenderOutcome {
                path: PathBuf::from("out.mp4"),
                segments_rendered: 2,
                segments_skipped: 2,
            }
        );
    }

    #[test]
    fn test_nothing_rendered_is_render_failure() {
        let mut tally = SegmentTally::new("test");
        tally.record(0, Err("decode error"));
        tally.skipped(1, "encoder error");

        assert!(!tally.has_rendered());
        let err = tally.into_outcome(Path::new("out.mp4"), 2).unwrap_err();
        assert!(matches!(err, MediaError::RenderFailed(_)));
    }
}
