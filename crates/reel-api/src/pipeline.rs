//! Request pipeline: download, analyse, merge, render.
//!
//! ```text
//! url ─► download ─► probe ─► frames ─► transcribe ─┬─► speech ─┐
//!                                                   └─► motion ─┴─► merge ─► render
//! ```
//!
//! Stages run one after another. CPU-bound detection runs on the blocking
//! pool. The reel and captions sidecar live at fixed paths, so concurrent
//! requests overwrite each other's outputs.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reel_media::transcribe::resolve_language;
use reel_media::{
    detect_fast_motion, detect_fast_speech, download_video, extract_frames, merge_detections,
    probe_video, write_captions_file, DetectionConfig, DownloadOptions, ReelRenderer, Transcriber,
    VideoInfo, HIGHLIGHT_FILE_NAME,
};
use reel_models::HighlightSet;
use tracing::Instrument;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::logging::RequestLogger;
use crate::metrics::{record_pipeline_run, record_stage_duration};

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Merged highlight intervals
    pub highlights: HighlightSet,
    /// Rendered reel; `None` when nothing was highlighted
    pub clip_path: Option<PathBuf>,
}

/// Turns a video URL into highlights and a rendered reel.
#[async_trait]
pub trait HighlightPipeline: Send + Sync {
    async fn process(&self, url: &str, request_id: &str) -> ApiResult<PipelineOutput>;
}

/// A downloaded, probed source video.
#[derive(Debug, Clone)]
pub struct AcquiredVideo {
    pub path: PathBuf,
    pub info: VideoInfo,
}

/// Fetches the source video for a URL into a directory.
///
/// Any failure, including a file that cannot be probed, is
/// [`ApiError::DownloadFailed`].
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn acquire(&self, url: &str, dir: &Path, options: &DownloadOptions) -> ApiResult<AcquiredVideo>;
}

/// yt-dlp download followed by an ffprobe check.
#[derive(Debug, Clone, Default)]
pub struct YtDlpSource;

#[async_trait]
impl VideoSource for YtDlpSource {
    async fn acquire(&self, url: &str, dir: &Path, options: &DownloadOptions) -> ApiResult<AcquiredVideo> {
        let path = download_video(url, dir, options)
            .await
            .map_err(|e| ApiError::DownloadFailed(e.to_string()))?;
        let info = probe_video(&path)
            .await
            .map_err(|e| ApiError::DownloadFailed(format!("downloaded file is not a usable video: {e}")))?;
        Ok(AcquiredVideo { path, info })
    }
}

/// Pipeline settings taken from [`ApiConfig`].
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub files_dir: PathBuf,
    pub highlights_dir: PathBuf,
    pub frames_dir: PathBuf,
    pub captions_path: PathBuf,
    pub language: String,
    pub detection: DetectionConfig,
    pub extract_frames: bool,
    pub frame_interval_secs: f64,
    /// Ask the downloader for subtitles (used by subtitle-based transcription)
    pub download_subtitles: bool,
}

impl PipelineSettings {
    pub fn from_config(config: &ApiConfig, download_subtitles: bool) -> Self {
        Self {
            files_dir: config.files_dir.clone(),
            highlights_dir: config.highlights_dir(),
            frames_dir: config.frames_dir(),
            captions_path: config.captions_path(),
            language: resolve_language(&config.transcribe_language).to_string(),
            detection: config.detection.clone(),
            extract_frames: config.extract_frames,
            frame_interval_secs: config.frame_interval_secs,
            download_subtitles,
        }
    }

    fn clip_path(&self) -> PathBuf {
        self.highlights_dir.join(HIGHLIGHT_FILE_NAME)
    }
}

/// Production pipeline over the media crate.
pub struct ReelPipeline {
    settings: PipelineSettings,
    source: Arc<dyn VideoSource>,
    transcriber: Arc<dyn Transcriber>,
    renderer: Arc<dyn ReelRenderer>,
}

impl ReelPipeline {
    pub fn new(
        settings: PipelineSettings,
        source: Arc<dyn VideoSource>,
        transcriber: Arc<dyn Transcriber>,
        renderer: Arc<dyn ReelRenderer>,
    ) -> Self {
        Self {
            settings,
            source,
            transcriber,
            renderer,
        }
    }

    async fn run(&self, url: &str, logger: &RequestLogger) -> ApiResult<PipelineOutput> {
        let settings = &self.settings;

        // Acquire
        let stage = Instant::now();
        let mut options = DownloadOptions::default();
        if settings.download_subtitles {
            options = options.with_subtitles(settings.language.clone());
        }
        let AcquiredVideo { path: video, info } =
            self.source.acquire(url, &settings.files_dir, &options).await?;
        record_stage_duration("download", stage.elapsed().as_secs_f64());
        logger.log_stage(
            "download",
            &format!(
                "{} ({:.1}s, {}x{} @ {:.2} fps)",
                video.display(),
                info.duration,
                info.width,
                info.height,
                info.fps
            ),
        );

        // Preview frames
        if settings.extract_frames {
            let stage = Instant::now();
            match extract_frames(&video, &settings.frames_dir, settings.frame_interval_secs).await {
                Ok(frames) => logger.log_stage("frames", &format!("{} frames extracted", frames.len())),
                Err(e) => logger.log_warning(&format!("frame extraction failed: {e}")),
            }
            record_stage_duration("frames", stage.elapsed().as_secs_f64());
        }

        // Transcribe
        let stage = Instant::now();
        let transcript = self.transcriber.transcribe(&video, &settings.language).await?;
        write_captions_file(&transcript, &settings.captions_path).await?;
        record_stage_duration("transcribe", stage.elapsed().as_secs_f64());
        logger.log_stage(
            "transcribe",
            &format!("{} segments via {}", transcript.len(), self.transcriber.name()),
        );

        // Detect
        let stage = Instant::now();
        let speech = detect_fast_speech(&transcript, settings.detection.speech_rate_threshold);
        let motion = {
            let video = video.clone();
            let threshold = settings.detection.motion_threshold;
            tokio::task::spawn_blocking(move || detect_fast_motion(&video, threshold))
                .await
                .map_err(|e| ApiError::internal(format!("motion detection task failed: {e}")))?
        };
        let highlights = merge_detections(&speech, &motion, settings.detection.merge_margin_secs);
        record_stage_duration("detect", stage.elapsed().as_secs_f64());
        logger.log_stage(
            "detect",
            &format!(
                "{} speech, {} motion, {} merged",
                speech.len(),
                motion.len(),
                highlights.len()
            ),
        );

        if highlights.is_empty() {
            logger.log_completion("no engaging moments detected, skipping render");
            return Ok(PipelineOutput {
                highlights,
                clip_path: None,
            });
        }

        // Render
        let stage = Instant::now();
        let clip_path = settings.clip_path();
        let outcome = self
            .renderer
            .render(&video, &highlights, &transcript, &clip_path)
            .await
            .map_err(|e| ApiError::RenderFailed(e.to_string()))?;
        if !outcome.path.exists() {
            return Err(ApiError::RenderFailed("output file missing".to_string()));
        }
        record_stage_duration("render", stage.elapsed().as_secs_f64());
        if outcome.segments_skipped > 0 {
            logger.log_warning(&format!("{} segments skipped", outcome.segments_skipped));
        }
        logger.log_completion(&format!(
            "{} highlights rendered with {} to {}",
            outcome.segments_rendered,
            self.renderer.name(),
            outcome.path.display()
        ));

        Ok(PipelineOutput {
            highlights,
            clip_path: Some(outcome.path),
        })
    }
}

#[async_trait]
impl HighlightPipeline for ReelPipeline {
    async fn process(&self, url: &str, request_id: &str) -> ApiResult<PipelineOutput> {
        let logger = RequestLogger::new(request_id, "process");
        logger.log_start(url);

        let result = self.run(url, &logger).instrument(logger.create_span()).await;
        match &result {
            Ok(output) => record_pipeline_run("success", output.highlights.len()),
            Err(e) => {
                logger.log_error(&e.to_string());
                record_pipeline_run("failure", 0);
            }
        }
        result
    }
}
