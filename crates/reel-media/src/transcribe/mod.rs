//! Speech transcription.
//!
//! Two backends implement [`Transcriber`]:
//!
//! - [`SubtitleTranscriber`] reads the WebVTT track fetched alongside the
//!   download. Always available.
//! - `WhisperTranscriber` runs whisper.cpp locally (feature `whisper`). The
//!   model is loaded once and shared across requests.

mod subtitles;

#[cfg(feature = "whisper")]
mod audio;
#[cfg(feature = "whisper")]
mod whisper;

use std::path::Path;

use async_trait::async_trait;
use reel_models::TranscriptSegment;
use tracing::warn;

use crate::error::MediaResult;

pub use subtitles::{find_subtitle_file, parse_vtt, SubtitleTranscriber};
#[cfg(feature = "whisper")]
pub use whisper::WhisperTranscriber;

/// Language used when the requested one is not recognised.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Language codes accepted by Whisper.
pub const WHISPER_LANGUAGES: &[&str] = &[
    "af", "am", "ar", "as", "az", "ba", "be", "bg", "bn", "bo", "br", "bs", "ca", "cs", "cy", "da",
    "de", "el", "en", "es", "et", "eu", "fa", "fi", "fo", "fr", "gl", "gu", "ha", "haw", "he", "hi",
    "hr", "ht", "hu", "hy", "id", "is", "it", "ja", "jw", "ka", "kk", "km", "kn", "ko", "la", "lb",
    "ln", "lo", "lt", "lv", "mg", "mi", "mk", "ml", "mn", "mr", "ms", "mt", "my", "ne", "nl", "nn",
    "no", "oc", "pa", "pl", "ps", "pt", "ro", "ru", "sa", "sd", "si", "sk", "sl", "sn", "so", "sq",
    "sr", "su", "sv", "sw", "ta", "te", "tg", "th", "tk", "tl", "tr", "tt", "uk", "ur", "uz", "vi",
    "yi", "yo", "zh", "yue",
];

/// Return `language` if Whisper knows it, otherwise [`DEFAULT_LANGUAGE`].
pub fn resolve_language(language: &str) -> &str {
    if WHISPER_LANGUAGES.contains(&language) {
        language
    } else {
        warn!(language, fallback = DEFAULT_LANGUAGE, "Unknown transcription language");
        DEFAULT_LANGUAGE
    }
}

/// Produces timed speech segments for a video.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Transcribe `video`. Segments are ordered by start time.
    async fn transcribe(&self, video: &Path, language: &str) -> MediaResult<Vec<TranscriptSegment>>;
}
