//! Transcripts from downloaded WebVTT subtitles.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reel_models::{parse_timestamp, TranscriptSegment};
use tracing::{debug, info, warn};

use super::Transcriber;
use crate::error::MediaResult;

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

/// Reads `<stem>.<lang>.vtt` written next to the video by the downloader.
///
/// Videos without subtitles produce an empty transcript.
#[derive(Debug, Default, Clone)]
pub struct SubtitleTranscriber;

impl SubtitleTranscriber {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transcriber for SubtitleTranscriber {
    fn name(&self) -> &'static str {
        "subtitles"
    }

    async fn transcribe(&self, video: &Path, language: &str) -> MediaResult<Vec<TranscriptSegment>> {
        let Some(vtt_path) = find_subtitle_file(video, language).await? else {
            info!(video = %video.display(), language, "No subtitles found, transcript is empty");
            return Ok(Vec::new());
        };

        let content = tokio::fs::read_to_string(&vtt_path).await?;
        let segments = parse_vtt(&content);
        info!(
            subtitles = %vtt_path.display(),
            segments = segments.len(),
            "Loaded transcript from subtitles"
        );
        Ok(segments)
    }
}

/// Locate the subtitle file for `video`, preferring `language`.
///
/// Falls back to any `<stem>.*.vtt` sibling when the requested language is
/// missing (auto-generated tracks are sometimes tagged `en-orig` and similar).
pub async fn find_subtitle_file(video: &Path, language: &str) -> MediaResult<Option<PathBuf>> {
    let (Some(dir), Some(stem)) = (video.parent(), video.file_stem().and_then(|s| s.to_str())) else {
        return Ok(None);
    };
    let dir = if dir.as_os_str().is_empty() { Path::new(".") } else { dir };

    let exact = dir.join(format!("{stem}.{language}.vtt"));
    if tokio::fs::try_exists(&exact).await? {
        return Ok(Some(exact));
    }

    let prefix = format!("{stem}.");
    let mut candidates = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with(&prefix) && name.ends_with(".vtt") {
            candidates.push(entry.path());
        }
    }

    // Tracks for the requested language first, then the rest by name
    candidates.sort_by_key(|p| {
        let name = p.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        let lang_match = name.contains(&format!(".{language}"));
        (!lang_match, name)
    });

    if let Some(first) = candidates.first() {
        warn!(
            requested = language,
            using = %first.display(),
            "Requested subtitle language missing, using closest track"
        );
    }
    Ok(candidates.into_iter().next())
}

/// Parse WebVTT cues into transcript segments.
///
/// Markup tags are stripped and a cue's lines are joined with spaces.
/// Lines repeating the previous cue's text (rolling auto-captions) are
/// dropped, and cues left with no text are skipped.
pub fn parse_vtt(content: &str) -> Vec<TranscriptSegment> {
    let mut segments = Vec::new();
    let mut previous_lines: Vec<String> = Vec::new();

    let normalized = content.replace("\r\n", "\n");
    for block in normalized.split("\n\n") {
        let lines: Vec<&str> = block.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        let Some(timing_idx) = lines.iter().position(|l| l.contains("-->")) else {
            continue;
        };

        let Some((start, end)) = parse_cue_timing(lines[timing_idx]) else {
            debug!(line = lines[timing_idx], "Skipping cue with unparseable timing");
            continue;
        };

        let cue_lines: Vec<String> = lines[timing_idx + 1..]
            .iter()
            .map(|l| clean_cue_text(l))
            .filter(|l| !l.is_empty())
            .collect();

        let fresh: Vec<&str> = cue_lines
            .iter()
            .filter(|l| !previous_lines.contains(l))
            .map(String::as_str)
            .collect();

        if !fresh.is_empty() {
            segments.push(TranscriptSegment::new(start, end, fresh.join(" ")));
        }
        if !cue_lines.is_empty() {
            previous_lines = cue_lines;
        }
    }

    segments.sort_by(|a, b| a.start.total_cmp(&b.start));
    segments
}

/// `00:00:01.000 --> 00:00:02.500 align:start position:0%`
fn parse_cue_timing(line: &str) -> Option<(f64, f64)> {
    let (start, rest) = line.split_once("-->")?;
    let end = rest.split_whitespace().next()?;
    let start = parse_timestamp(start).ok()?;
    let end = parse_timestamp(end).ok()?;
    Some((start, end))
}

fn clean_cue_text(line: &str) -> String {
    let stripped = TAG_PATTERN.replace_all(line, "");
    stripped
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
