//! API configuration.

use std::path::PathBuf;

use reel_media::captions::CaptionMatch;
use reel_media::{DetectionConfig, DEFAULT_FRAME_INTERVAL_SECS, DEFAULT_LANGUAGE};

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Root of downloaded videos, frames, captions and reels
    pub files_dir: PathBuf,
    /// Base for returned clip URLs; the request's Host header when unset
    pub public_base_url: Option<String>,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Expose Prometheus metrics at /metrics
    pub metrics_enabled: bool,
    /// GGML model for local transcription (feature `whisper`)
    pub whisper_model_path: Option<PathBuf>,
    /// Spoken language of incoming videos
    pub transcribe_language: String,
    /// Detector thresholds and merge margin
    pub detection: DetectionConfig,
    /// Write preview frames for each download
    pub extract_frames: bool,
    /// Seconds between preview frames
    pub frame_interval_secs: f64,
    /// Caption-to-frame matching for the rendered reel
    pub caption_match: CaptionMatch,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 10000,
            files_dir: PathBuf::from("files"),
            public_base_url: None,
            cors_origins: vec!["*".to_string()],
            max_body_size: 1024 * 1024, // 1MB
            environment: "development".to_string(),
            metrics_enabled: true,
            whisper_model_path: None,
            transcribe_language: DEFAULT_LANGUAGE.to_string(),
            detection: DetectionConfig::default(),
            extract_frames: true,
            frame_interval_secs: DEFAULT_FRAME_INTERVAL_SECS,
            caption_match: CaptionMatch::default(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable source.
    ///
    /// Unset or unparseable values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parsed = |key: &str| parse_var::<f64>(&lookup, key);
        let non_empty = |key: &str| lookup(key).map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        let mut detection = defaults.detection.clone();
        if let Some(v) = parsed("SPEECH_RATE_THRESHOLD") {
            detection = detection.with_speech_rate_threshold(v);
        }
        if let Some(v) = parsed("MOTION_THRESHOLD") {
            detection = detection.with_motion_threshold(v);
        }
        if let Some(v) = parsed("MERGE_MARGIN_SECS") {
            detection = detection.with_merge_margin_secs(v);
        }

        Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT").unwrap_or(defaults.port),
            files_dir: non_empty("FILES_DIR").map(PathBuf::from).unwrap_or(defaults.files_dir),
            public_base_url: non_empty("PUBLIC_BASE_URL").map(|s| s.trim_end_matches('/').to_string()),
            cors_origins: non_empty("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            max_body_size: parse_var(&lookup, "MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            environment: non_empty("ENVIRONMENT").unwrap_or(defaults.environment),
            metrics_enabled: lookup("METRICS_ENABLED")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.metrics_enabled),
            whisper_model_path: non_empty("WHISPER_MODEL_PATH").map(PathBuf::from),
            transcribe_language: non_empty("TRANSCRIBE_LANGUAGE").unwrap_or(defaults.transcribe_language),
            detection,
            extract_frames: lookup("EXTRACT_FRAMES")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.extract_frames),
            frame_interval_secs: parsed("FRAME_INTERVAL_SECS")
                .filter(|v| *v > 0.0)
                .unwrap_or(defaults.frame_interval_secs),
            caption_match: parse_var(&lookup, "CAPTION_MATCH").unwrap_or(defaults.caption_match),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    /// Directory holding rendered reels.
    pub fn highlights_dir(&self) -> PathBuf {
        self.files_dir.join("highlights")
    }

    /// Directory holding extracted preview frames.
    pub fn frames_dir(&self) -> PathBuf {
        self.files_dir.join("frames")
    }

    /// Captions sidecar path.
    pub fn captions_path(&self) -> PathBuf {
        self.files_dir.join(reel_media::CAPTIONS_FILE_NAME)
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|s| s.trim().parse().ok())
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
