//! Fast-speech detection over transcript segments.

use reel_models::{TimeInterval, TranscriptSegment};
use tracing::debug;

/// Flag every segment whose speech rate strictly exceeds `threshold` words/second.
///
/// Output keeps input order, one interval per flagged segment with the
/// segment's own bounds. Segments with zero or negative duration have a rate
/// of zero and are never flagged.
pub fn detect_fast_speech(segments: &[TranscriptSegment], threshold: f64) -> Vec<TimeInterval> {
    let flagged: Vec<TimeInterval> = segments
        .iter()
        .filter(|segment| segment.words_per_second() > threshold)
        .map(|segment| TimeInterval::new(segment.start, segment.end))
        .collect();

    debug!(
        segments = segments.len(),
        flagged = flagged.len(),
        threshold,
        "Fast speech detection complete"
    );

    flagged
}
