//! Transcript models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A timed block of recognized speech.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranscriptSegment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Recognized text
    pub text: String,
}

impl TranscriptSegment {
    /// Create a new segment.
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Duration in seconds. May be zero or negative for malformed input.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Number of whitespace-delimited tokens in the text.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Speaking rate in words per second; 0 when the duration is not positive.
    pub fn words_per_second(&self) -> f64 {
        let duration = self.duration();
        if duration > 0.0 {
            self.word_count() as f64 / duration
        } else {
            0.0
        }
    }

    /// Render the block written to the captions sidecar file.
    pub fn to_caption_block(&self) -> String {
        format!("{:.2} --> {:.2}\n{}\n\n", self.start, self.end, self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_per_second() {
        let segment = TranscriptSegment::new(0.0, 1.0, "a b c d");
        assert_eq!(segment.word_count(), 4);
        assert!((segment.words_per_second() - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_non_positive_duration_has_zero_rate() {
        assert_eq!(TranscriptSegment::new(2.0, 2.0, "one two").words_per_second(), 0.0);
        assert_eq!(TranscriptSegment::new(3.0, 1.0, "one two").words_per_second(), 0.0);
    }

    #[test]
    fn test_word_count_collapses_whitespace() {
        let segment = TranscriptSegment::new(0.0, 1.0, "  hello \t world\nagain  ");
        assert_eq!(segment.word_count(), 3);
        assert_eq!(TranscriptSegment::new(0.0, 1.0, "   ").word_count(), 0);
    }

    #[test]
    fn test_caption_block() {
        let segment = TranscriptSegment::new(1.0, 2.456, " Hello there");
        assert_eq!(segment.to_caption_block(), "1.00 --> 2.46\n Hello there\n\n");
    }
}
