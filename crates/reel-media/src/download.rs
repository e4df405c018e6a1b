//! Video download using yt-dlp.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::command::check_ytdlp;
use crate::error::{MediaError, MediaResult};

/// Output template relative to the download directory.
const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Options for a single download.
#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    /// Also fetch subtitles (manual and automatic) in this language as WebVTT
    pub subtitles_language: Option<String>,
}

impl DownloadOptions {
    /// Request subtitles in the given language.
    pub fn with_subtitles(mut self, language: impl Into<String>) -> Self {
        self.subtitles_language = Some(language.into());
        self
    }
}

/// Rewrite a YouTube Shorts link into the regular watch form.
pub fn convert_youtube_url(url: &str) -> String {
    if url.contains("shorts/") {
        url.replacen("shorts/", "watch?v=", 1)
    } else {
        url.to_string()
    }
}

/// Download a video from URL using yt-dlp.
///
/// The file is named after the video title inside `dir`. Returns the final
/// path reported by yt-dlp once all post-processing has moved it into place.
pub async fn download_video(
    url: &str,
    dir: impl AsRef<Path>,
    options: &DownloadOptions,
) -> MediaResult<PathBuf> {
    let dir = dir.as_ref();
    let url = convert_youtube_url(url);

    check_ytdlp()?;
    tokio::fs::create_dir_all(dir).await?;

    info!(url = %url, dir = %dir.display(), "Downloading video");

    let args = build_args(&url, dir, options);
    debug!("Running yt-dlp {}", args.join(" "));

    let output = Command::new("yt-dlp")
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("yt-dlp stderr: {}", stderr);

        let error_msg = stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("Unknown error");

        if stderr.contains("429") || stderr.contains("Too Many Requests") {
            warn!(url = %url, "Source rate limit detected");
        }

        return Err(MediaError::download_failed(format!("yt-dlp failed: {}", error_msg)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let path = parse_printed_path(&stdout)
        .ok_or_else(|| MediaError::download_failed("yt-dlp did not report an output file"))?;

    if !path.exists() {
        return Err(MediaError::download_failed(format!(
            "Output file not created: {}",
            path.display()
        )));
    }

    let file_size = path.metadata()?.len();
    info!(
        output = %path.display(),
        size_mb = file_size as f64 / (1024.0 * 1024.0),
        "Downloaded video successfully"
    );

    Ok(path)
}

fn build_args(url: &str, dir: &Path, options: &DownloadOptions) -> Vec<String> {
    let template = dir.join(OUTPUT_TEMPLATE);

    let mut args: Vec<String> = vec![
        "--no-playlist".into(),
        "--no-progress".into(),
        "-f".into(),
        "best".into(),
        "-o".into(),
        template.to_string_lossy().to_string(),
        "--no-simulate".into(),
        "--print".into(),
        "after_move:filepath".into(),
    ];

    if let Some(lang) = &options.subtitles_language {
        args.extend([
            "--write-subs".to_string(),
            "--write-auto-subs".to_string(),
            "--sub-langs".to_string(),
            lang.clone(),
            "--sub-format".to_string(),
            "vtt".to_string(),
        ]);
    }

    args.push(url.to_string());
    args
}

/// The last non-empty stdout line is the moved file path.
fn parse_printed_path(stdout: &str) -> Option<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_shorts_url() {
        assert_eq!(
            convert_youtube_url("https://www.youtube.com/shorts/abc123"),
            "https://www.youtube.com/watch?v=abc123"
        );
        assert_eq!(
            convert_youtube_url("https://www.youtube.com/watch?v=abc123"),
            "https://www.youtube.com/watch?v=abc123"
        );
        assert_eq!(convert_youtube_url("https://vimeo.com/42"), "https://vimeo.com/42");
    }

    #[test]
    fn test_build_args_with_subtitles() {
        let options = DownloadOptions::default().with_subtitles("en");
        let args = build_args("https://example.com/v", Path::new("files"), &options);

        assert!(args.contains(&"--no-playlist".to_string()));
        let f = args.iter().position(|a| a == "-f").unwrap();
        assert_eq!(args[f + 1], "best");
        let o = args.iter().position(|a| a == "-o").unwrap();
        assert_eq!(args[o + 1], Path::new("files").join("%(title)s.%(ext)s").to_string_lossy());
        let langs = args.iter().position(|a| a == "--sub-langs").unwrap();
        assert_eq!(args[langs + 1], "en");
        assert_eq!(args.last().map(String::as_str), Some("https://example.com/v"));
    }

    #[test]
    fn test_build_args_without_subtitles() {
        let args = build_args("https://example.com/v", Path::new("files"), &DownloadOptions::default());
        assert!(!args.iter().any(|a| a.starts_with("--write")));
    }

    #[test]
    fn test_parse_printed_path() {
        let stdout = "files/My Video.mp4\n\n";
        assert_eq!(parse_printed_path(stdout), Some(PathBuf::from("files/My Video.mp4")));
        assert_eq!(parse_printed_path("  \n"), None);
    }
}
