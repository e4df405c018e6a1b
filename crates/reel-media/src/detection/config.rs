//! Configuration for highlight detection.
//!
//! These parameters decide which moments count as engaging and how close two
//! detections must be before they are folded into one highlight.

use serde::{Deserialize, Serialize};

/// Default speech rate above which a transcript segment is flagged (words/second).
pub const DEFAULT_SPEECH_RATE_THRESHOLD: f64 = 3.5;

/// Default mean absolute optical-flow magnitude above which a frame transition is flagged.
pub const DEFAULT_MOTION_THRESHOLD: f64 = 15.0;

/// Default maximum gap (seconds) between intervals that still merge.
pub const DEFAULT_MERGE_MARGIN_SECS: f64 = 1.5;

/// Thresholds for the speech and motion detectors and the interval merger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Words per second a segment must exceed (strictly) to be flagged.
    ///
    /// Conversational speech sits around 2-3 words/second; 3.5 catches
    /// excited or rushed delivery.
    pub speech_rate_threshold: f64,

    /// Mean absolute flow component a frame transition must exceed (strictly).
    ///
    /// Measured in pixels per frame, so the useful range depends on
    /// resolution. 15.0 targets cuts, whip pans and fast action on 720p.
    pub motion_threshold: f64,

    /// Gap in seconds at or below which neighbouring intervals merge.
    pub merge_margin_secs: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            speech_rate_threshold: DEFAULT_SPEECH_RATE_THRESHOLD,
            motion_threshold: DEFAULT_MOTION_THRESHOLD,
            merge_margin_secs: DEFAULT_MERGE_MARGIN_SECS,
        }
    }
}

impl DetectionConfig {
    /// Builder-style setter for the speech rate threshold.
    pub fn with_speech_rate_threshold(mut self, words_per_second: f64) -> Self {
        self.speech_rate_threshold = words_per_second.max(0.0);
        self
    }

    /// Builder-style setter for the motion threshold.
    pub fn with_motion_threshold(mut self, threshold: f64) -> Self {
        self.motion_threshold = threshold.max(0.0);
        self
    }

    /// Builder-style setter for the merge margin.
    pub fn with_merge_margin_secs(mut self, secs: f64) -> Self {
        self.merge_margin_secs = secs.max(0.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DetectionConfig::default();
        assert_eq!(config.speech_rate_threshold, 3.5);
        assert_eq!(config.motion_threshold, 15.0);
        assert_eq!(config.merge_margin_secs, 1.5);
    }

    #[test]
    fn test_builder_pattern() {
        let config = DetectionConfig::default()
            .with_speech_rate_threshold(4.0)
            .with_motion_threshold(8.0)
            .with_merge_margin_secs(0.5);

        assert_eq!(config.speech_rate_threshold, 4.0);
        assert_eq!(config.motion_threshold, 8.0);
        assert_eq!(config.merge_margin_secs, 0.5);
    }

    #[test]
    fn test_negative_values_clamped() {
        let config = DetectionConfig::default().with_merge_margin_secs(-1.0);
        assert_eq!(config.merge_margin_secs, 0.0);
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: DetectionConfig = serde_json::from_str(r#"{"motion_threshold": 20.0}"#).unwrap();
        assert_eq!(config.motion_threshold, 20.0);
        assert_eq!(config.speech_rate_threshold, 3.5);
    }
}
