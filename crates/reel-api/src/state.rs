//! Application state.

use std::sync::Arc;

use reel_media::{check_ffmpeg, check_ffprobe, check_ytdlp, ReelRenderer, SubtitleTranscriber, Transcriber};
use tracing::{info, warn};

use crate::config::ApiConfig;
use crate::error::mask_internal_errors;
use crate::pipeline::{HighlightPipeline, PipelineSettings, ReelPipeline, YtDlpSource};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Arc<dyn HighlightPipeline>,
}

impl AppState {
    /// Create new application state.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        mask_internal_errors(config.is_production());

        tokio::fs::create_dir_all(&config.files_dir).await?;
        tokio::fs::create_dir_all(config.highlights_dir()).await?;

        if let Err(e) = check_ffmpeg() {
            warn!("{}; processing requests will fail", e);
        }
        if let Err(e) = check_ffprobe() {
            warn!("{}; processing requests will fail", e);
        }
        if let Err(e) = check_ytdlp() {
            warn!("{}; processing requests will fail", e);
        }

        let transcriber = build_transcriber(&config)?;
        let renderer = build_renderer(&config);
        info!(
            transcriber = transcriber.name(),
            renderer = renderer.name(),
            "Media backends selected"
        );

        let settings = PipelineSettings::from_config(&config, transcriber.name() == "subtitles");
        let pipeline = ReelPipeline::new(settings, Arc::new(YtDlpSource), transcriber, renderer);

        Ok(Self::with_pipeline(config, Arc::new(pipeline)))
    }

    /// State around an existing pipeline.
    pub fn with_pipeline(config: ApiConfig, pipeline: Arc<dyn HighlightPipeline>) -> Self {
        Self { config, pipeline }
    }
}

#[cfg(feature = "whisper")]
fn build_transcriber(config: &ApiConfig) -> Result<Arc<dyn Transcriber>, Box<dyn std::error::Error>> {
    match &config.whisper_model_path {
        Some(path) => Ok(Arc::new(reel_media::WhisperTranscriber::load(path)?)),
        None => Ok(Arc::new(SubtitleTranscriber::new())),
    }
}

#[cfg(not(feature = "whisper"))]
fn build_transcriber(config: &ApiConfig) -> Result<Arc<dyn Transcriber>, Box<dyn std::error::Error>> {
    if config.whisper_model_path.is_some() {
        warn!("WHISPER_MODEL_PATH is set but this build lacks the `whisper` feature; using subtitles");
    }
    Ok(Arc::new(SubtitleTranscriber::new()))
}

#[cfg(feature = "opencv")]
fn build_renderer(config: &ApiConfig) -> Arc<dyn ReelRenderer> {
    Arc::new(reel_media::OpencvReelRenderer::new(config.caption_match))
}

#[cfg(not(feature = "opencv"))]
fn build_renderer(config: &ApiConfig) -> Arc<dyn ReelRenderer> {
    Arc::new(reel_media::FfmpegReelRenderer::new(config.caption_match))
}
