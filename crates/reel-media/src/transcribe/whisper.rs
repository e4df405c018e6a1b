//! Local speech recognition with whisper.cpp.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use reel_models::TranscriptSegment;
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::audio::extract_pcm_samples;
use super::{resolve_language, Transcriber};
use crate::error::{MediaError, MediaResult};

/// Whisper model loaded once and shared by every request.
///
/// Each transcription creates its own decoding state, so concurrent calls
/// do not share mutable model state.
pub struct WhisperTranscriber {
    context: Arc<WhisperContext>,
    model_path: PathBuf,
}

impl WhisperTranscriber {
    /// Load the GGML model at `model_path`.
    pub fn load(model_path: impl AsRef<Path>) -> MediaResult<Self> {
        let model_path = model_path.as_ref();
        if !model_path.exists() {
            return Err(MediaError::model_not_found(model_path.display().to_string()));
        }

        let path_str = model_path
            .to_str()
            .ok_or_else(|| MediaError::model_not_found(model_path.display().to_string()))?;
        let context = WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
            .map_err(|e| MediaError::transcription_failed(format!("failed to load model: {e}")))?;

        info!(model = %model_path.display(), "Loaded Whisper model");
        Ok(Self {
            context: Arc::new(context),
            model_path: model_path.to_path_buf(),
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl std::fmt::Debug for WhisperTranscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperTranscriber")
            .field("model_path", &self.model_path)
            .finish_non_exhaustive()
    }
}

/// Run a full decode and translate into English segments.
fn run_whisper(
    context: &WhisperContext,
    samples: &[f32],
    language: &str,
) -> MediaResult<Vec<TranscriptSegment>> {
    let mut state = context
        .create_state()
        .map_err(|e| MediaError::transcription_failed(format!("failed to create state: {e}")))?;

    let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
    params.set_language(Some(language));
    params.set_translate(true);
    params.set_no_timestamps(false);
    params.set_print_realtime(false);
    params.set_print_progress(false);
    params.set_print_timestamps(false);
    params.set_print_special(false);

    state
        .full(params, samples)
        .map_err(|e| MediaError::transcription_failed(format!("decode failed: {e}")))?;

    let mut segments = Vec::new();
    for idx in 0..state.full_n_segments() {
        let Some(segment) = state.get_segment(idx) else {
            continue;
        };
        // Timestamps are in centiseconds
        let start = segment.start_timestamp() as f64 / 100.0;
        let end = segment.end_timestamp() as f64 / 100.0;
        let text = segment
            .to_str_lossy()
            .map(|cow| cow.trim().to_string())
            .unwrap_or_default();
        segments.push(TranscriptSegment::new(start, end, text));
    }
    Ok(segments)
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    fn name(&self) -> &'static str {
        "whisper"
    }

    async fn transcribe(&self, video: &Path, language: &str) -> MediaResult<Vec<TranscriptSegment>> {
        let language = resolve_language(language).to_string();

        let scratch = tempfile::tempdir()?;
        let samples = extract_pcm_samples(video, scratch.path()).await?;
        debug!(
            video = %video.display(),
            samples = samples.len(),
            "Extracted audio for transcription"
        );

        let context = Arc::clone(&self.context);
        let segments = tokio::task::spawn_blocking(move || run_whisper(&context, &samples, &language))
            .await
            .map_err(|e| MediaError::internal(format!("transcription task panicked: {e}")))??;

        info!(
            video = %video.display(),
            segments = segments.len(),
            "Transcription complete"
        );
        Ok(segments)
    }
}
