//! Merging speech and motion detections into highlight intervals.

use reel_models::{HighlightSet, TimeInterval};
use tracing::info;

/// Combine both detector outputs into one ordered, non-overlapping set.
///
/// Intervals whose gap is at most `margin` seconds are joined, keeping the
/// furthest end.
pub fn merge_detections(speech: &[TimeInterval], motion: &[TimeInterval], margin: f64) -> HighlightSet {
    let merged = HighlightSet::coalesce(speech.iter().chain(motion).copied(), margin);

    info!(
        speech = speech.len(),
        motion = motion.len(),
        highlights = merged.len(),
        total_secs = merged.total_duration(),
        "Merged highlight intervals"
    );
    metrics::histogram!("reel_highlight_segments").record(merged.len() as f64);

    merged
}
