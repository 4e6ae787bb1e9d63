//! yt-dlp subtitle download.
//!
//! Second acquisition strategy. Works from the full URL rather than the
//! video ID and uses whatever manual or auto-generated subtitles yt-dlp finds.

use super::{AcquisitionOutcome, StrategyReport, TranscriptSource, TranscriptStrategy};
use crate::config::SubtitleSettings;
use crate::error::{BriefError, Result};
use crate::status::StatusMessage;
use crate::video::VideoReference;
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;
use tokio::process::Command;
use tracing::{debug, info, instrument};

static INLINE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid regex"));

/// Fetches subtitles with yt-dlp.
pub struct SubtitleStrategy {
    binary: String,
    languages: String,
}

impl SubtitleStrategy {
    pub fn new(binary: &str, languages: &str) -> Self {
        Self {
            binary: binary.to_string(),
            languages: languages.to_string(),
        }
    }

    pub fn from_settings(settings: &SubtitleSettings) -> Self {
        Self::new(&settings.binary, &settings.languages)
    }

    /// Download subtitles into `dir` and return the first VTT file written.
    #[instrument(skip(self, dir))]
    async fn download(&self, url: &str, dir: &Path) -> Result<Option<PathBuf>> {
        let template = dir.join("%(id)s.%(ext)s");

        info!("Downloading subtitles for {}", url);

        let result = Command::new(&self.binary)
            .arg("--skip-download")
            .arg("--write-subs")
            .arg("--write-auto-subs")
            .arg("--sub-langs").arg(&self.languages)
            .arg("--sub-format").arg("vtt")
            .arg("--output").arg(&template)
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--no-warnings")
            .arg(url)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BriefError::ToolNotFound(self.binary.clone()));
            }
            Err(e) => {
                return Err(BriefError::ToolFailed(format!("{} execution failed: {e}", self.binary)));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last = stderr.lines().last().unwrap_or("unknown error").trim();
            return Err(BriefError::ToolFailed(format!("{} failed: {last}", self.binary)));
        }

        find_vtt_file(dir)
    }
}

fn find_vtt_file(dir: &Path) -> Result<Option<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("vtt"))
        .collect();
    files.sort();
    Ok(files.into_iter().next())
}

#[async_trait]
impl TranscriptStrategy for SubtitleStrategy {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    fn source(&self) -> TranscriptSource {
        TranscriptSource::Subtitles
    }

    async fn fetch(&self, video: &VideoReference) -> StrategyReport {
        let dir = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                return StrategyReport::new(
                    AcquisitionOutcome::Unavailable(e.to_string()),
                    StatusMessage::warning(format!("yt-dlp method failed: {}", e)),
                )
            }
        };

        let path = match self.download(video.url(), dir.path()).await {
            Ok(Some(path)) => path,
            Ok(None) => {
                return StrategyReport::new(
                    AcquisitionOutcome::Empty,
                    StatusMessage::warning("yt-dlp returned empty data"),
                )
            }
            Err(BriefError::ToolNotFound(tool)) => {
                return StrategyReport::new(
                    AcquisitionOutcome::NotInstalled(tool.clone()),
                    StatusMessage::warning(format!("{} not installed", tool)),
                )
            }
            Err(e) => {
                return StrategyReport::new(
                    AcquisitionOutcome::Unavailable(e.to_string()),
                    StatusMessage::warning(format!("yt-dlp method failed: {}", e)),
                )
            }
        };

        debug!("Reading subtitles from {:?}", path);

        match tokio::fs::read_to_string(&path).await {
            Ok(vtt) => {
                let text = vtt_to_text(&vtt);
                if text.is_empty() {
                    StrategyReport::new(
                        AcquisitionOutcome::Empty,
                        StatusMessage::warning("yt-dlp returned empty data"),
                    )
                } else {
                    StrategyReport::new(
                        AcquisitionOutcome::Success(text),
                        StatusMessage::success("Transcript loaded via yt-dlp!"),
                    )
                }
            }
            Err(e) => StrategyReport::new(
                AcquisitionOutcome::Unavailable(e.to_string()),
                StatusMessage::warning(format!("yt-dlp method failed: {}", e)),
            ),
        }
    }
}

/// Convert WebVTT subtitles to plain text.
///
/// Drops the header, cue ids, timing lines and inline tags. Auto-generated
/// captions repeat each line in the next cue, so consecutive duplicates are
/// skipped.
pub fn vtt_to_text(vtt: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut in_header = true;

    for line in vtt.lines() {
        let l = line.trim();

        if in_header {
            // Header block runs until the first blank line.
            if l.is_empty() {
                in_header = false;
            }
            continue;
        }

        if l.is_empty() || l.contains("-->") || l.starts_with("NOTE") {
            continue;
        }
        if l.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        let stripped = INLINE_TAG_RE.replace_all(l, "");
        let cleaned = stripped
            .replace("&nbsp;", " ")
            .replace("&amp;", "&")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        if cleaned.is_empty() || lines.last() == Some(&cleaned) {
            continue;
        }
        lines.push(cleaned);
    }

    lines.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vtt_to_text_drops_timings() {
        let vtt = "WEBVTT\nKind: captions\nLanguage: en\n\n1\n00:00:00.000 --> 00:00:01.000\nHello   world\n\n2\n00:00:01.000 --> 00:00:02.000\nSecond line\n";
        let text = vtt_to_text(vtt);
        assert_eq!(text, "Hello world Second line");
    }

    #[test]
    fn test_vtt_to_text_rolling_auto_captions() {
        let vtt = r#"WEBVTT
Kind: captions
Language: en

00:00:00.000 --> 00:00:02.000 align:start position:0%
we're<00:00:00.500><c> no</c><00:00:00.900><c> strangers</c>

00:00:02.000 --> 00:00:02.010 align:start position:0%
we're no strangers

00:00:02.010 --> 00:00:04.000 align:start position:0%
we're no strangers
to<00:00:02.500><c> love</c>
"#;
        let text = vtt_to_text(vtt);
        assert_eq!(text, "we're no strangers to love");
    }

    #[test]
    fn test_vtt_to_text_empty() {
        assert_eq!(vtt_to_text("WEBVTT\n\n"), "");
        assert_eq!(vtt_to_text(""), "");
    }

    #[test]
    fn test_find_vtt_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(find_vtt_file(dir.path()).unwrap(), None);

        std::fs::write(dir.path().join("abc.info.json"), "{}").unwrap();
        std::fs::write(dir.path().join("abc.en.vtt"), "WEBVTT\n").unwrap();
        let found = find_vtt_file(dir.path()).unwrap().unwrap();
        assert!(found.ends_with("abc.en.vtt"));
    }

    #[tokio::test]
    async fn test_missing_binary_reports_not_installed() {
        let strategy = SubtitleStrategy::new("ytbrief-definitely-missing-binary", "en");
        let video = VideoReference::parse("https://youtu.be/dQw4w9WgXcQ").unwrap();

        let report = strategy.fetch(&video).await;
        assert_eq!(
            report.outcome,
            AcquisitionOutcome::NotInstalled("ytbrief-definitely-missing-binary".to_string())
        );
    }
}
