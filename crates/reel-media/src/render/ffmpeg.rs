//! Reel rendering with the FFmpeg CLI.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reel_models::{HighlightSet, TimeInterval, TranscriptSegment};
use tracing::info;

use super::{ReelRenderer, RenderOutcome, SegmentTally};
use crate::captions::{CaptionIndex, CaptionMatch, CaptionWindow};
use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::{caption_font_size, chain_filters, filter_caption};
use crate::probe::probe_video;

/// Cuts each interval with FFmpeg and joins the parts with the concat demuxer.
#[derive(Debug, Clone)]
pub struct FfmpegReelRenderer {
    caption_match: CaptionMatch,
    crf: u8,
    preset: String,
}

impl Default for FfmpegReelRenderer {
    fn default() -> Self {
        Self {
            caption_match: CaptionMatch::default(),
            crf: 20,
            preset: "veryfast".to_string(),
        }
    }
}

impl FfmpegReelRenderer {
    pub fn new(caption_match: CaptionMatch) -> Self {
        Self {
            caption_match,
            ..Self::default()
        }
    }

    /// Command cutting `interval` from `source` into `part`, drawing `captions`.
    fn segment_command(
        &self,
        source: &Path,
        part: &Path,
        interval: &TimeInterval,
        captions: &[(PathBuf, CaptionWindow)],
        font_size: u32,
    ) -> FfmpegCommand {
        let filters: Vec<String> = captions
            .iter()
            .map(|(text_file, window)| filter_caption(text_file, font_size, window.start, window.end))
            .collect();

        let mut cmd = FfmpegCommand::new(source, part)
            .seek(interval.start)
            .duration(interval.duration());
        if let Some(filter) = chain_filters(&filters) {
            cmd = cmd.video_filter(filter);
        }
        cmd.video_codec("libx264")
            .preset(self.preset.clone())
            .crf(self.crf)
            .pixel_format("yuv420p")
            .no_audio()
    }
}

/// Concat demuxer list for `parts`.
fn concat_list(parts: &[PathBuf]) -> String {
    parts
        .iter()
        .map(|p| format!("file '{}'\n", p.to_string_lossy().replace('\'', "'\\''")))
        .collect()
}

#[async_trait]
impl ReelRenderer for FfmpegReelRenderer {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn render(
        &self,
        source: &Path,
        highlights: &HighlightSet,
        transcript: &[TranscriptSegment],
        output: &Path,
    ) -> MediaResult<RenderOutcome> {
        if highlights.is_empty() {
            return Ok(RenderOutcome {
                path: output.to_path_buf(),
                segments_rendered: 0,
                segments_skipped: 0,
            });
        }

        let info = probe_video(source)
            .await
            .map_err(|e| MediaError::render_failed(format!("cannot open source video: {e}")))?;

        let index = CaptionIndex::new(transcript, self.caption_match, info.fps);
        let font_size = caption_font_size(info.height);
        let scratch = tempfile::tempdir()?;
        let runner = FfmpegRunner::new();

        let mut parts = Vec::with_capacity(highlights.len());
        let mut tally = SegmentTally::new(self.name());

        for (i, interval) in highlights.iter().enumerate() {
            let mut captions = Vec::new();
            for (j, window) in index.windows_within(interval).into_iter().enumerate() {
                let text_file = scratch.path().join(format!("caption_{i}_{j}.txt"));
                tokio::fs::write(&text_file, &window.text).await?;
                captions.push((text_file, window));
            }

            let part = scratch.path().join(format!("part_{i:04}.mp4"));
            let cmd = self.segment_command(source, &part, interval, &captions, font_size);

            info!(
                segment = i,
                start = interval.start,
                end = interval.end,
                captions = captions.len(),
                "Rendering highlight segment"
            );

            match runner.run(&cmd).await {
                Ok(()) if part.exists() => {
                    tally.rendered();
                    parts.push(part);
                }
                Ok(()) => tally.skipped(i, "segment produced no output"),
                Err(e) => tally.skipped(i, e),
            }
        }

        if !tally.has_rendered() {
            return tally.into_outcome(output, highlights.len());
        }

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let list_path = scratch.path().join("parts.txt");
        tokio::fs::write(&list_path, concat_list(&parts)).await?;

        let concat = FfmpegCommand::new(&list_path, output)
            .input_args(["-f", "concat", "-safe", "0"])
            .codec_copy()
            .output_args(["-movflags", "+faststart"]);
        runner
            .run(&concat)
            .await
            .map_err(|e| MediaError::render_failed(format!("failed to join segments: {e}")))?;

        let outcome = tally.into_outcome(output, highlights.len())?;
        info!(
            output = %output.display(),
            rendered = outcome.segments_rendered,
            skipped = outcome.segments_skipped,
            "Highlight reel written"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_command_with_captions() {
        let renderer = FfmpegReelRenderer::default();
        let captions = vec![(
            PathBuf::from("/tmp/caption_0_0.txt"),
            CaptionWindow {
                start: 0.98,
                end: 1.02,
                text: "hello".to_string(),
            },
        )];

        let cmd = renderer.segment_command(
            Path::new("in.mp4"),
            Path::new("part.mp4"),
            &TimeInterval::new(2.0, 5.0),
            &captions,
            30,
        );
        let args = cmd.build_args();

        let vf = args.iter().position(|a| a == "-vf").unwrap();
        assert!(args[vf + 1].contains("textfile='/tmp/caption_0_0.txt'"));
        assert!(args[vf + 1].contains("between(t,0.98,1.02)"));
        assert!(args.contains(&"2.000".to_string()));
        assert!(args.contains(&"3.000".to_string()));
        assert!(args.contains(&"-an".to_string()));
    }

    #[test]
    fn test_segment_command_without_captions_has_no_filter() {
        let renderer = FfmpegReelRenderer::default();
        let cmd = renderer.segment_command(
            Path::new("in.mp4"),
            Path::new("part.mp4"),
            &TimeInterval::new(0.0, 1.0),
            &[],
            30,
        );
        let args = cmd.build_args();
        assert!(!args.contains(&"-vf".to_string()));
        assert!(args.contains(&"20".to_string()));
    }

    #[test]
    fn test_concat_list_quotes_paths() {
        let list = concat_list(&[PathBuf::from("/tmp/a.mp4"), PathBuf::from("/tmp/it's.mp4")]);
        assert_eq!(list, "file '/tmp/a.mp4'\nfile '/tmp/it'\\''s.mp4'\n");
    }

    #[tokio::test]
    async fn test_empty_set_renders_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("highlight.mp4");
        let outcome = FfmpegReelRenderer::default()
            .render(Path::new("missing.mp4"), &HighlightSet::new(), &[], &output)
            .await
            .unwrap();
        assert_eq!(outcome.segments_rendered, 0);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_missing_source_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let highlights = HighlightSet::coalesce([TimeInterval::new(0.0, 1.0)], 1.5);
        let err = FfmpegReelRenderer::default()
            .render(
                Path::new("/nonexistent/source.mp4"),
                &highlights,
                &[],
                &dir.path().join("out.mp4"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::RenderFailed(_)));
    }
}
