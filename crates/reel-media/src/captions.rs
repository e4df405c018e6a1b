//! Caption lookup by playback position and the captions sidecar file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use reel_models::{TimeInterval, TranscriptSegment};

use crate::error::MediaResult;

/// Caption sidecar file name inside the files directory.
pub const CAPTIONS_FILE_NAME: &str = "captions.txt";

/// How a frame position is matched against caption start times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionMatch {
    /// Position rounded to 0.01 s must equal the rounded caption start.
    Exact,
    /// Caption start nearest to the position, within half a frame interval.
    #[default]
    Nearest,
}

impl std::str::FromStr for CaptionMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "nearest" => Ok(Self::Nearest),
            other => Err(format!("unknown caption match mode: {other}")),
        }
    }
}

/// A caption visible over a time range.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionWindow {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[derive(Debug, Clone)]
struct Entry {
    start: f64,
    /// Start in centiseconds
    key: i64,
    text: String,
}

/// Captions keyed by start time.
#[derive(Debug, Clone)]
pub struct CaptionIndex {
    entries: Vec<Entry>,
    mode: CaptionMatch,
    tolerance: f64,
}

fn centis(seconds: f64) -> i64 {
    (seconds * 100.0).round() as i64
}

impl CaptionIndex {
    /// Index `segments` for a video playing at `fps`.
    ///
    /// Segments with empty text are skipped. When two segments share a
    /// rounded start, the later one wins.
    pub fn new(segments: &[TranscriptSegment], mode: CaptionMatch, fps: f64) -> Self {
        let mut entries: Vec<Entry> = Vec::with_capacity(segments.len());
        for segment in segments {
            let text = segment.text.trim();
            if text.is_empty() {
                continue;
            }
            let entry = Entry {
                start: segment.start,
                key: centis(segment.start),
                text: text.to_string(),
            };
            match entries.iter_mut().find(|e| e.key == entry.key) {
                Some(existing) => *existing = entry,
                None => entries.push(entry),
            }
        }
        entries.sort_by(|a, b| a.start.total_cmp(&b.start));

        let tolerance = if fps.is_finite() && fps > 0.0 { 0.5 / fps } else { 0.0 };

        Self {
            entries,
            mode,
            tolerance,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Caption to draw at `position` seconds, if any.
    pub fn lookup(&self, position: f64) -> Option<&str> {
        match self.mode {
            CaptionMatch::Exact => {
                let key = centis(position);
                self.entries.iter().find(|e| e.key == key).map(|e| e.text.as_str())
            }
            CaptionMatch::Nearest => {
                let idx = self.entries.partition_point(|e| e.start < position);
                let candidates = [idx.checked_sub(1), Some(idx)];
                candidates
                    .into_iter()
                    .flatten()
                    .filter_map(|i| self.entries.get(i))
                    .map(|e| ((e.start - position).abs(), e))
                    .filter(|(dist, _)| *dist <= self.tolerance)
                    .min_by(|a, b| a.0.total_cmp(&b.0))
                    .map(|(_, e)| e.text.as_str())
            }
        }
    }

    /// Caption windows intersecting `interval`, relative to its start.
    pub fn windows_within(&self, interval: &TimeInterval) -> Vec<CaptionWindow> {
        let mut windows = Vec::new();
        for (i, entry) in self.entries.iter().enumerate() {
            let (mut lo, mut hi) = match self.mode {
                CaptionMatch::Exact => {
                    let center = entry.key as f64 / 100.0;
                    (center - 0.005, center + 0.005)
                }
                CaptionMatch::Nearest => (entry.start - self.tolerance, entry.start + self.tolerance),
            };
            if self.mode == CaptionMatch::Nearest {
                if let Some(prev) = i.checked_sub(1).and_then(|p| self.entries.get(p)) {
                    lo = lo.max((prev.start + entry.start) / 2.0);
                }
                if let Some(next) = self.entries.get(i + 1) {
                    hi = hi.min((entry.start + next.start) / 2.0);
                }
            }

            let lo = lo.max(interval.start);
            let hi = hi.min(interval.end);
            if lo <= hi {
                windows.push(CaptionWindow {
                    start: lo - interval.start,
                    end: hi - interval.start,
                    text: entry.text.clone(),
                });
            }
        }
        windows
    }
}

/// Render the sidecar contents: one block per segment.
pub fn format_captions(segments: &[TranscriptSegment]) -> String {
    segments.iter().map(TranscriptSegment::to_caption_block).collect()
}

/// Write the captions sidecar, replacing any previous file.
pub async fn write_captions_file(segments: &[TranscriptSegment], path: impl AsRef<Path>) -> MediaResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, format_captions(segments)).await?;
    debug!(path = %path.display(), segments = segments.len(), "Wrote captions file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments() -> Vec<TranscriptSegment> {
        vec![
            TranscriptSegment::new(1.0, 2.0, " hello there "),
            TranscriptSegment::new(3.004, 4.0, "second"),
            TranscriptSegment::new(5.0, 6.0, "   "),
        ]
    }

    #[test]
    fn test_exact_lookup_rounds_to_centiseconds() {
        let index = CaptionIndex::new(&segments(), CaptionMatch::Exact, 30.0);
        assert_eq!(index.len(), 2);
        assert_eq!(index.lookup(1.0), Some("hello there"));
        assert_eq!(index.lookup(1.004), Some("hello there"));
        assert_eq!(index.lookup(3.0), Some("second"));
        assert_eq!(index.lookup(1.033), None);
        assert_eq!(index.lookup(5.0), None);
    }

    #[test]
    fn test_nearest_lookup_within_half_frame() {
        let index = CaptionIndex::new(&segments(), CaptionMatch::Nearest, 30.0);
        // Half a frame at 30 fps is ~0.0167 s
        assert_eq!(index.lookup(1.01), Some("hello there"));
        assert_eq!(index.lookup(0.99), Some("hello there"));
        assert_eq!(index.lookup(1.05), None);
        assert_eq!(index.lookup(2.99), Some("second"));
    }

    #[test]
    fn test_duplicate_start_keeps_last() {
        let segs = vec![
            TranscriptSegment::new(1.0, 2.0, "first"),
            TranscriptSegment::new(1.001, 2.0, "replacement"),
        ];
        let index = CaptionIndex::new(&segs, CaptionMatch::Exact, 25.0);
        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup(1.0), Some("replacement"));
    }

    #[test]
    fn test_windows_within_interval() {
        let index = CaptionIndex::new(&segments(), CaptionMatch::Nearest, 25.0);
        let windows = index.windows_within(&TimeInterval::new(0.5, 2.5));
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].text, "hello there");
        assert!((windows[0].start - 0.48).abs() < 1e-9);
        assert!((windows[0].end - 0.52).abs() < 1e-9);

        assert!(index.windows_within(&TimeInterval::new(10.0, 11.0)).is_empty());
    }

    #[test]
    fn test_caption_match_from_str() {
        assert_eq!("exact".parse::<CaptionMatch>(), Ok(CaptionMatch::Exact));
        assert_eq!(" Nearest ".parse::<CaptionMatch>(), Ok(CaptionMatch::Nearest));
        assert!("fuzzy".parse::<CaptionMatch>().is_err());
        assert_eq!(CaptionMatch::default(), CaptionMatch::Nearest);
    }

    #[tokio::test]
    async fn test_write_captions_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CAPTIONS_FILE_NAME);
        let segs = vec![
            TranscriptSegment::new(0.0, 1.5, "a b"),
            TranscriptSegment::new(1.5, 3.25, "c"),
        ];

        write_captions_file(&segs, &path).await.unwrap();
        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, "0.00 --> 1.50\na b\n\n1.50 --> 3.25\nc\n\n");
    }
}
