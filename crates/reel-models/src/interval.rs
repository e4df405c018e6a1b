//! Time intervals and merged highlight sets.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::response::{KeyMoment, KEY_MOMENT_CAPTION};
use crate::timestamp::format_key_timestamp;

/// A closed time range `[start, end]` in seconds within a source video.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimeInterval {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
}

impl TimeInterval {
    /// Create a new interval. Reversed bounds are swapped so `start <= end` holds.
    pub fn new(start: f64, end: f64) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    /// Duration of this interval in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Gap in seconds between the end of `self` and the start of `next`.
    /// Negative when the two overlap.
    pub fn gap_to(&self, next: &TimeInterval) -> f64 {
        next.start - self.end
    }

    /// Whether `position` lies inside the interval (inclusive on both ends).
    pub fn contains(&self, position: f64) -> bool {
        position >= self.start && position <= self.end
    }
}

impl From<(f64, f64)> for TimeInterval {
    fn from((start, end): (f64, f64)) -> Self {
        Self::new(start, end)
    }
}

/// Final merged, non-overlapping, ascending list of intervals chosen for the reel.
///
/// The only way to build a non-empty set is [`HighlightSet::coalesce`], so every
/// value of this type is sorted by start and pairwise non-overlapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct HighlightSet {
    intervals: Vec<TimeInterval>,
}

impl HighlightSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort `intervals` by start and fold together every pair whose gap is at
    /// most `margin` seconds (inclusive).
    ///
    /// Nested intervals collapse to the outer bound; a single interval is
    /// returned unchanged. Negative or NaN margins are treated as zero, so
    /// overlapping inputs always merge.
    pub fn coalesce<I>(intervals: I, margin: f64) -> Self
    where
        I: IntoIterator<Item = TimeInterval>,
    {
        let margin = margin.max(0.0);
        let mut sorted: Vec<TimeInterval> = intervals.into_iter().collect();
        sorted.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.end.total_cmp(&b.end)));

        let mut merged: Vec<TimeInterval> = Vec::with_capacity(sorted.len());
        for next in sorted {
            match merged.last_mut() {
                Some(current) if current.gap_to(&next) <= margin => {
                    current.end = current.end.max(next.end);
                }
                _ => merged.push(next),
            }
        }

        Self { intervals: merged }
    }

    /// Number of intervals.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Whether the set holds no intervals.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Iterate over the intervals in ascending order.
    pub fn iter(&self) -> std::slice::Iter<'_, TimeInterval> {
        self.intervals.iter()
    }

    /// Borrow the intervals as a slice.
    pub fn as_slice(&self) -> &[TimeInterval] {
        &self.intervals
    }

    /// Total covered duration in seconds.
    pub fn total_duration(&self) -> f64 {
        self.intervals.iter().map(TimeInterval::duration).sum()
    }

    /// One key moment per interval, labelled with its start time.
    pub fn key_moments(&self) -> Vec<KeyMoment> {
        self.intervals
            .iter()
            .map(|interval| KeyMoment {
                timestamp: format_key_timestamp(interval.start),
                caption: KEY_MOMENT_CAPTION.to_string(),
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a HighlightSet {
    type Item = &'a TimeInterval;
    type IntoIter = std::slice::Iter<'a, TimeInterval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.iter()
    }
}

impl From<HighlightSet> for Vec<TimeInterval> {
    fn from(set: HighlightSet) -> Self {
        set.intervals
    }
}
