#![deny(unreachable_patterns)]
//! Media processing for highlight reels.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a runner that reports stderr on failure
//! - Video download through yt-dlp and probing through ffprobe
//! - Preview frame extraction
//! - Transcription from subtitles or local Whisper (feature `whisper`)
//! - Fast-speech and fast-motion detection (optical flow needs feature `opencv`)
//! - Interval merging and captioned reel rendering

pub mod captions;
pub mod command;
pub mod detection;
pub mod download;
pub mod error;
pub mod filters;
pub mod frames;
pub mod probe;
pub mod render;
pub mod transcribe;

pub use captions::{write_captions_file, CaptionIndex, CaptionMatch, CAPTIONS_FILE_NAME};
pub use command::{check_ffmpeg, check_ffprobe, check_ytdlp, FfmpegCommand, FfmpegRunner};
pub use detection::{
    detect_fast_motion, detect_fast_speech, merge_detections, DetectionConfig, MotionWindowBuilder,
};
pub use download::{convert_youtube_url, download_video, DownloadOptions};
pub use error::{MediaError, MediaResult};
pub use frames::{extract_frames, DEFAULT_FRAME_INTERVAL_SECS};
pub use probe::{probe_video, VideoInfo};
#[cfg(feature = "opencv")]
pub use render::OpencvReelRenderer;
pub use render::{FfmpegReelRenderer, ReelRenderer, RenderOutcome, HIGHLIGHT_FILE_NAME};
#[cfg(feature = "whisper")]
pub use transcribe::WhisperTranscriber;
pub use transcribe::{resolve_language, SubtitleTranscriber, Transcriber, DEFAULT_LANGUAGE};
