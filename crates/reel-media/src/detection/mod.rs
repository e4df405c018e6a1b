//! Highlight detection.
//!
//! Two independent detectors feed one merger:
//!
//! ```text
//! transcript ──► speech_rate ──┐
//!                              ├──► merge ──► HighlightSet
//! video ───────► motion ───────┘
//! ```
//!
//! The speech detector is pure. The motion detector decodes the video and is
//! blocking; callers run it on a blocking thread.

mod config;
mod merge;
mod motion;
mod speech_rate;

pub use config::{
    DetectionConfig, DEFAULT_MERGE_MARGIN_SECS, DEFAULT_MOTION_THRESHOLD, DEFAULT_SPEECH_RATE_THRESHOLD,
};
pub use merge::merge_detections;
pub use motion::{detect_fast_motion, MotionWindowBuilder, MOTION_WINDOW_SECS};
pub use speech_rate::detect_fast_speech;
