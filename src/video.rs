//! YouTube URL validation and video ID extraction.

use crate::error::{BriefError, Result};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Length of a YouTube video identifier.
pub const VIDEO_ID_LEN: usize = 11;

static PARSER: LazyLock<VideoUrlParser> = LazyLock::new(VideoUrlParser::new);

/// Compiled URL patterns.
pub struct VideoUrlParser {
    /// Accepted URL shapes, anchored at the start of the input.
    shapes: Vec<Regex>,
    /// ID extraction patterns, tried in order.
    id_patterns: Vec<Regex>,
}

impl VideoUrlParser {
    pub fn new() -> Self {
        let shapes = [
            r"^(https?://)?(www\.)?youtube\.com/watch\?v=[a-zA-Z0-9_-]{11}",
            r"^(https?://)?(www\.)?youtu\.be/[a-zA-Z0-9_-]{11}",
            r"^(https?://)?(www\.)?youtube\.com/embed/[a-zA-Z0-9_-]{11}",
        ]
        .into_iter()
        .map(|p| Regex::new(p).expect("Invalid regex"))
        .collect();

        let id_patterns = [
            r"(?:v=|/)([0-9A-Za-z_-]{11})",
            r"(?:embed/|v/|.+\?v=|watch\?.*v=)([A-Za-z0-9_-]{11})",
            r"(?:youtu\.be/)([A-Za-z0-9_-]{11})",
        ]
        .into_iter()
        .map(|p| Regex::new(p).expect("Invalid regex"))
        .collect();

        Self { shapes, id_patterns }
    }

    /// Check the input against the accepted URL shapes.
    pub fn is_valid(&self, input: &str) -> bool {
        self.shapes.iter().any(|re| re.is_match(input))
    }

    /// Extract the video ID, first matching pattern wins.
    pub fn extract_id(&self, input: &str) -> Option<String> {
        self.id_patterns
            .iter()
            .filter_map(|re| re.captures(input))
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .find(|id| id.len() == VIDEO_ID_LEN)
            .map(str::to_string)
    }
}

impl Default for VideoUrlParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `input` is a watch, short or embed YouTube URL.
pub fn is_valid_url(input: &str) -> bool {
    PARSER.is_valid(input)
}

/// Extract the 11-character video ID from a YouTube URL.
pub fn extract_video_id(input: &str) -> Option<String> {
    PARSER.extract_id(input)
}

/// A validated YouTube URL and its video ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoReference {
    url: String,
    video_id: String,
}

impl VideoReference {
    /// Validate `input` and extract its video ID.
    pub fn parse(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Err(BriefError::InvalidInput(
                "Please enter a YouTube URL first.".to_string(),
            ));
        }
        if !is_valid_url(input) {
            return Err(BriefError::InvalidInput(
                "Please enter a valid YouTube URL.".to_string(),
            ));
        }
        let video_id = extract_video_id(input).ok_or_else(|| {
            BriefError::InvalidInput("Could not extract video ID from URL.".to_string())
        })?;

        Ok(Self {
            url: input.to_string(),
            video_id,
        })
    }

    /// The URL exactly as the user supplied it.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }

    pub fn embed_url(&self) -> String {
        format!("https://www.youtube.com/embed/{}", self.video_id)
    }

    /// File name offered for the downloadable summary.
    pub fn summary_file_name(&self) -> String {
        summary_file_name(&self.video_id)
    }
}

/// `youtube_summary_<id>.txt`
pub fn summary_file_name(video_id: &str) -> String {
    format!("youtube_summary_{}.txt", video_id)
}

/// Whether `s` looks like a bare video ID.
pub fn is_video_id(s: &str) -> bool {
    s.len() == VIDEO_ID_LEN
        && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_shapes() {
        assert!(is_valid_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_valid_url("http://youtube.com/watch?v=dQw4w9WgXcQ&t=42s"));
        assert!(is_valid_url("youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_valid_url("https://youtu.be/dQw4w9WgXcQ"));
        assert!(is_valid_url("www.youtu.be/dQw4w9WgXcQ"));
        assert!(is_valid_url("https://www.youtube.com/embed/dQw4w9WgXcQ"));
    }

    #[test]
    fn test_invalid_shapes() {
        assert!(!is_valid_url(""));
        assert!(!is_valid_url("https://vimeo.com/12345"));
        assert!(!is_valid_url("dQw4w9WgXcQ"));
        assert!(!is_valid_url("https://youtu.be/short"));
        assert!(!is_valid_url("https://www.youtube.com/shorts/dQw4w9WgXcQ"));
        assert!(!is_valid_url("https://m.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(!is_valid_url(" https://youtu.be/dQw4w9WgXcQ"));
        assert!(!is_valid_url("https://www.youtube.com/watch?list=PL1&v=dQw4w9WgXcQ"));
    }

    #[test]
    fn test_extract_video_id() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=120"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_extract_without_token() {
        assert_eq!(extract_video_id("https://youtu.be/short"), None);
        assert_eq!(extract_video_id("https://vimeo.com/12345"), None);
        assert_eq!(extract_video_id(""), None);
    }

    #[test]
    fn test_parse_reference() {
        let video = VideoReference::parse("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(video.video_id(), "dQw4w9WgXcQ");
        assert_eq!(video.url(), "https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(video.watch_url(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(video.embed_url(), "https://www.youtube.com/embed/dQw4w9WgXcQ");
        assert_eq!(video.summary_file_name(), "youtube_summary_dQw4w9WgXcQ.txt");
    }

    #[test]
    fn test_parse_fails_closed() {
        assert!(matches!(VideoReference::parse(""), Err(BriefError::InvalidInput(_))));
        assert!(matches!(
            VideoReference::parse("https://vimeo.com/12345"),
            Err(BriefError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_is_video_id() {
        assert!(is_video_id("dQw4w9WgXcQ"));
        assert!(is_video_id("a-b_c123456"));
        assert!(!is_video_id("dQw4w9WgXc"));
        assert!(!is_video_id("dQw4w9WgX\r\n"));
    }
}
