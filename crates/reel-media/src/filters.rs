//! FFmpeg video filter definitions.

use std::path::Path;

/// Caption outline width in pixels.
pub const CAPTION_BORDER_WIDTH: u32 = 2;

/// Frame sampling filter: one frame every `interval_secs`.
pub fn filter_sample_every(interval_secs: f64) -> String {
    format!("fps=1/{}", format_filter_number(interval_secs))
}

/// Caption text size for a frame height, matching a scale-1.0 Hershey font on 720p.
pub fn caption_font_size(frame_height: u32) -> u32 {
    (frame_height / 24).max(12)
}

/// Centered white caption with a black outline, read from `text_file`,
/// visible while `start <= t <= end` (seconds, relative to the clip).
pub fn filter_caption(text_file: &Path, font_size: u32, start: f64, end: f64) -> String {
    format!(
        "drawtext=textfile='{}':fontsize={}:fontcolor=white:borderw={}:bordercolor=black:\
         x=(w-text_w)/2:y=(h-text_h)/2:enable='between(t,{},{})'",
        escape_filter_path(text_file),
        font_size,
        CAPTION_BORDER_WIDTH,
        format_filter_number(start),
        format_filter_number(end),
    )
}

/// Chain caption filters; `None` when there is nothing to draw.
pub fn chain_filters(filters: &[String]) -> Option<String> {
    if filters.is_empty() {
        None
    } else {
        Some(filters.join(","))
    }
}

/// Escape a path for use inside a single-quoted filter option.
///
/// Quoting already protects `:` and `,`; only the quote itself needs breaking out.
fn escape_filter_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("/"),
            '\'' => out.push_str("'\\''"),
            _ => out.push(c),
        }
    }
    out
}

fn format_filter_number(value: f64) -> String {
    let s = format!("{:.3}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_filter() {
        assert_eq!(filter_sample_every(2.0), "fps=1/2");
        assert_eq!(filter_sample_every(0.5), "fps=1/0.5");
    }

    #[test]
    fn test_caption_filter() {
        let filter = filter_caption(Path::new("/tmp/cap_0.txt"), 30, 0.48, 0.52);
        assert!(filter.starts_with("drawtext=textfile='/tmp/cap_0.txt'"));
        assert!(filter.contains("fontcolor=white"));
        assert!(filter.contains("bordercolor=black"));
        assert!(filter.contains("x=(w-text_w)/2:y=(h-text_h)/2"));
        assert!(filter.contains("enable='between(t,0.48,0.52)'"));
    }

    #[test]
    fn test_escape_filter_path() {
        assert_eq!(escape_filter_path(Path::new("C:/a'b")), "C:/a'\\''b");
        assert_eq!(
            escape_filter_path(Path::new("/srv/files:v2/caption_0_0.txt")),
            "/srv/files:v2/caption_0_0.txt"
        );
    }

    #[test]
    fn test_chain_filters() {
        assert_eq!(chain_filters(&[]), None);
        assert_eq!(
            chain_filters(&["a".to_string(), "b".to_string()]),
            Some("a,b".to_string())
        );
    }

    #[test]
    fn test_font_size() {
        assert_eq!(caption_font_size(720), 30);
        assert_eq!(caption_font_size(100), 12);
    }
}
