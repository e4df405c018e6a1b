//! Fast-motion detection using dense optical flow.
//!
//! Each consecutive pair of grayscale frames is scored by the mean absolute
//! Farneback flow component. Transitions scoring above the threshold emit a
//! fixed one-second window starting at the transition's time.

use std::path::Path;

use reel_models::TimeInterval;
use tracing::{debug, warn};

/// Length of the window emitted for each flagged transition.
pub const MOTION_WINDOW_SECS: f64 = 1.0;

/// Turns per-transition motion scores into highlight windows.
///
/// Transition `i` is the step from frame `i` into frame `i + 1`, so the
/// first transition has index 0 and starts at `0 / fps`.
#[derive(Debug, Clone)]
pub struct MotionWindowBuilder {
    fps: f64,
    threshold: f64,
    windows: Vec<TimeInterval>,
}

impl MotionWindowBuilder {
    /// Create a builder for a stream at `fps` frames per second.
    pub fn new(fps: f64, threshold: f64) -> Self {
        Self {
            fps,
            threshold,
            windows: Vec::new(),
        }
    }

    /// Record the score of one transition. Returns whether it was flagged.
    pub fn push(&mut self, transition_index: u64, score: f64) -> bool {
        if score > self.threshold {
            let start = transition_index as f64 / self.fps;
            self.windows.push(TimeInterval::new(start, start + MOTION_WINDOW_SECS));
            true
        } else {
            false
        }
    }

    /// Number of windows emitted so far.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Flagged windows in transition order. They may overlap.
    pub fn finish(self) -> Vec<TimeInterval> {
        self.windows
    }
}

/// Detect fast motion in `video`. Blocking; run on a blocking thread.
///
/// Never fails: an unreadable video, an unreadable first frame or a build
/// without OpenCV yields an empty list and a warning.
pub fn detect_fast_motion(video: &Path, threshold: f64) -> Vec<TimeInterval> {
    match scan_video(video, threshold) {
        Ok(windows) => {
            debug!(
                video = %video.display(),
                windows = windows.len(),
                threshold,
                "Fast motion detection complete"
            );
            metrics::counter!("reel_motion_windows_total").increment(windows.len() as u64);
            windows
        }
        Err(e) => {
            warn!(video = %video.display(), error = %e, "Motion detection skipped");
            Vec::new()
        }
    }
}

#[cfg(feature = "opencv")]
fn scan_video(video: &Path, threshold: f64) -> crate::error::MediaResult<Vec<TimeInterval>> {
    use opencv::{
        core::{self, Mat},
        imgproc,
        prelude::*,
        video as cv_video,
        videoio::{VideoCapture, CAP_ANY, CAP_PROP_FPS},
    };

    use crate::error::MediaError;

    const FARNEBACK_PYR_SCALE: f64 = 0.5;
    const FARNEBACK_LEVELS: i32 = 3;
    const FARNEBACK_WINSIZE: i32 = 15;
    const FARNEBACK_ITERATIONS: i32 = 3;
    const FARNEBACK_POLY_N: i32 = 5;
    const FARNEBACK_POLY_SIGMA: f64 = 1.2;
    const FARNEBACK_FLAGS: i32 = 0;

    let video_str = video.to_string_lossy();
    let mut cap = VideoCapture::from_file(&video_str, CAP_ANY)?;
    if !cap.is_opened()? {
        return Err(MediaError::InvalidVideo(format!("Cannot open {}", video.display())));
    }

    let fps = cap.get(CAP_PROP_FPS)?;
    if !(fps.is_finite() && fps > 0.0) {
        return Err(MediaError::InvalidVideo(format!("Unknown frame rate for {}", video.display())));
    }

    let to_gray = |frame: &Mat| -> crate::error::MediaResult<Mat> {
        let mut gray = Mat::default();
        imgproc::cvt_color(
            frame,
            &mut gray,
            imgproc::COLOR_BGR2GRAY,
            0,
            core::AlgorithmHint::ALGO_HINT_DEFAULT,
        )?;
        Ok(gray)
    };

    let mut frame = Mat::default();
    if !cap.read(&mut frame)? || frame.empty() {
        return Err(MediaError::InvalidVideo(format!(
            "Cannot read first frame of {}",
            video.display()
        )));
    }
    let mut prev_gray = to_gray(&frame)?;

    let mut builder = MotionWindowBuilder::new(fps, threshold);
    let mut flow = Mat::default();
    let mut transition: u64 = 0;

    while cap.read(&mut frame)? && !frame.empty() {
        let gray = to_gray(&frame)?;
        cv_video::calc_optical_flow_farneback(
            &prev_gray,
            &gray,
            &mut flow,
            FARNEBACK_PYR_SCALE,
            FARNEBACK_LEVELS,
            FARNEBACK_WINSIZE,
            FARNEBACK_ITERATIONS,
            FARNEBACK_POLY_N,
            FARNEBACK_POLY_SIGMA,
            FARNEBACK_FLAGS,
        )?;

        // Mean over both flow channels of |dx| and |dy|
        let magnitude = core::abs(&flow)?.to_mat()?;
        let means = core::mean(&magnitude, &core::no_array())?;
        let score = (means[0] + means[1]) / 2.0;

        builder.push(transition, score);

        prev_gray = gray;
        transition += 1;
    }

    cap.release()?;
    Ok(builder.finish())
}

#[cfg(not(feature = "opencv"))]
fn scan_video(_video: &Path, _threshold: f64) -> crate::error::MediaResult<Vec<TimeInterval>> {
    Err(crate::error::MediaError::internal(
        "optical flow requires the `opencv` feature",
    ))
}
