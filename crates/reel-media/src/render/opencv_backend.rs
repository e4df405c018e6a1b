//! Frame-accurate reel rendering with OpenCV.

use std::path::Path;

use async_trait::async_trait;
use opencv::{
    core::{Mat, Point, Scalar, Size},
    imgproc,
    prelude::*,
    videoio::{
        VideoCapture, VideoWriter, CAP_ANY, CAP_PROP_FPS, CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH,
        CAP_PROP_POS_FRAMES, CAP_PROP_POS_MSEC,
    },
};
use reel_models::{HighlightSet, TimeInterval, TranscriptSegment};
use tracing::{info, warn};

use super::{ReelRenderer, RenderOutcome, SegmentTally};
use crate::captions::{CaptionIndex, CaptionMatch};
use crate::error::{MediaError, MediaResult};

const FONT_FACE: i32 = imgproc::FONT_HERSHEY_SIMPLEX;
const FONT_SCALE: f64 = 1.0;
const FONT_THICKNESS: i32 = 2;

/// Decodes each interval frame by frame and writes one stream at the
/// source's fps and resolution.
#[derive(Debug, Clone, Default)]
pub struct OpencvReelRenderer {
    caption_match: CaptionMatch,
}

impl OpencvReelRenderer {
    pub fn new(caption_match: CaptionMatch) -> Self {
        Self { caption_match }
    }
}

#[async_trait]
impl ReelRenderer for OpencvReelRenderer {
    fn name(&self) -> &'static str {
        "opencv"
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

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let source = source.to_path_buf();
        let output = output.to_path_buf();
        let intervals: Vec<TimeInterval> = highlights.iter().copied().collect();
        let transcript = transcript.to_vec();
        let caption_match = self.caption_match;

        tokio::task::spawn_blocking(move || {
            render_blocking(&source, &intervals, &transcript, caption_match, &output)
        })
        .await
        .map_err(|e| MediaError::internal(format!("render task panicked: {e}")))?
    }
}

fn render_blocking(
    source: &Path,
    intervals: &[TimeInterval],
    transcript: &[TranscriptSegment],
    caption_match: CaptionMatch,
    output: &Path,
) -> MediaResult<RenderOutcome> {
    let mut cap = VideoCapture::from_file(&source.to_string_lossy(), CAP_ANY)?;
    if !cap.is_opened()? {
        return Err(MediaError::render_failed(format!(
            "cannot open source video {}",
            source.display()
        )));
    }

    let fps = cap.get(CAP_PROP_FPS)?;
    if !(fps.is_finite() && fps > 0.0) {
        return Err(MediaError::render_failed(format!(
            "unknown frame rate for {}",
            source.display()
        )));
    }
    let size = Size::new(
        cap.get(CAP_PROP_FRAME_WIDTH)? as i32,
        cap.get(CAP_PROP_FRAME_HEIGHT)? as i32,
    );

    let mut writer = open_writer(output, fps, size)?;
    let index = CaptionIndex::new(transcript, caption_match, fps);

    let mut frame = Mat::default();
    let mut tally = SegmentTally::new("opencv");

    for (i, interval) in intervals.iter().enumerate() {
        let frames = write_segment(&mut cap, &mut writer, &index, interval, fps, &mut frame);
        tally.record(i, frames);
    }

    cap.release()?;
    writer.release()?;

    if !tally.has_rendered() {
        let _ = std::fs::remove_file(output);
    }
    let outcome = tally.into_outcome(output, intervals.len())?;

    info!(
        output = %output.display(),
        rendered = outcome.segments_rendered,
        skipped = outcome.segments_skipped,
        fps,
        "Highlight reel written"
    );

    Ok(outcome)
}

/// Decode one interval into `writer`. Returns the number of frames written.
///
/// An error stops this interval only; frames already written stay in the reel.
fn write_segment(
    cap: &mut VideoCapture,
    writer: &mut VideoWriter,
    index: &CaptionIndex,
    interval: &TimeInterval,
    fps: f64,
    frame: &mut Mat,
) -> MediaResult<u64> {
    cap.set(CAP_PROP_POS_FRAMES, (interval.start * fps).floor())?;

    let mut written = 0u64;
    while cap.get(CAP_PROP_POS_MSEC)? / 1000.0 < interval.end {
        if !cap.read(frame)? || frame.empty() {
            warn!(start = interval.start, written, "Frame read failed, stopping segment");
            break;
        }

        let position = cap.get(CAP_PROP_POS_MSEC)? / 1000.0;
        if let Some(text) = index.lookup(position) {
            draw_caption(frame, text)?;
        }

        writer.write(&*frame)?;
        written += 1;
    }
    Ok(written)
}

/// H.264 when the OpenCV build supports it, MPEG-4 Part 2 otherwise.
fn open_writer(output: &Path, fps: f64, size: Size) -> MediaResult<VideoWriter> {
    let path = output.to_string_lossy();
    for codec in [['a', 'v', 'c', '1'], ['m', 'p', '4', 'v']] {
        let fourcc = VideoWriter::fourcc(codec[0], codec[1], codec[2], codec[3])?;
        let writer = VideoWriter::new(&path, fourcc, fps, size, true)?;
        if writer.is_opened()? {
            return Ok(writer);
        }
        warn!(codec = %codec.iter().collect::<String>(), "Video codec unavailable, trying next");
    }
    Err(MediaError::render_failed(format!(
        "cannot open video writer for {}",
        output.display()
    )))
}

/// White text centred on the frame, outlined in black.
fn draw_caption(frame: &mut Mat, text: &str) -> MediaResult<()> {
    let mut baseline = 0;
    let text_size = imgproc::get_text_size(text, FONT_FACE, FONT_SCALE, FONT_THICKNESS, &mut baseline)?;
    let x = (frame.cols() - text_size.width) / 2;
    let y = frame.rows() / 2;

    let black = Scalar::new(0.0, 0.0, 0.0, 0.0);
    let white = Scalar::new(255.0, 255.0, 255.0, 0.0);

    for offset in [-1, 1] {
        imgproc::put_text(
            frame,
            text,
            Point::new(x + offset, y + offset),
            FONT_FACE,
            FONT_SCALE,
            black,
            FONT_THICKNESS + 2,
            imgproc::LINE_AA,
            false,
        )?;
    }
    imgproc::put_text(
        frame,
        text,
        Point::new(x, y),
        FONT_FACE,
        FONT_SCALE,
        white,
        FONT_THICKNESS,
        imgproc::LINE_AA,
        false,
    )?;
    Ok(())
}
