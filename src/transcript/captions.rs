//! YouTube captions API client.
//!
//! Reads the InnerTube API key from the watch page, asks the InnerTube
//! `player` endpoint for the caption track list and downloads the chosen
//! track as timed-text XML.

use super::{AcquisitionOutcome, StrategyReport, TranscriptSource, TranscriptStrategy};
use crate::config::CaptionSettings;
use crate::error::Result;
use crate::status::StatusMessage;
use crate::video::VideoReference;
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

const WATCH_URL: &str = "https://www.youtube.com/watch";
const PLAYER_URL: &str = "https://www.youtube.com/youtubei/v1/player";
const CLIENT_NAME: &str = "ANDROID";
const CLIENT_VERSION: &str = "20.10.38";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).expect("Invalid regex")
});

/// Errors from the captions API.
#[derive(Error, Debug)]
pub enum CaptionError {
    #[error("Transcripts are disabled for this video")]
    TranscriptsDisabled,

    #[error("No transcript found for languages: {}", .0.join(", "))]
    NoTranscriptFound(Vec<String>),

    #[error("Video is unavailable: {0}")]
    VideoUnavailable(String),

    #[error("YouTube is blocking requests from this IP or requires consent")]
    Blocked,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    Parse(String),
}

/// A caption track listed in the player response.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
    /// `"asr"` for auto-generated tracks.
    #[serde(default)]
    pub kind: Option<String>,
}

impl CaptionTrack {
    pub fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }

    /// Track URL returning the classic `<transcript><text>` format.
    fn download_url(&self) -> String {
        self.base_url.replace("&fmt=srv3", "")
    }
}

/// Caption tracks available for one video.
#[derive(Debug, Clone)]
pub struct TranscriptList {
    pub tracks: Vec<CaptionTrack>,
}

impl TranscriptList {
    /// First track matching the languages in order, manual tracks before generated ones.
    pub fn find(&self, languages: &[String]) -> std::result::Result<&CaptionTrack, CaptionError> {
        for language in languages {
            let mut matching = self.tracks.iter().filter(|t| &t.language_code == language);
            let manual = matching.clone().find(|t| !t.is_generated());
            if let Some(track) = manual.or_else(|| matching.next()) {
                return Ok(track);
            }
        }
        Err(CaptionError::NoTranscriptFound(languages.to_vec()))
    }

    /// The track YouTube lists first, whatever its language.
    pub fn auto_detected(&self) -> std::result::Result<&CaptionTrack, CaptionError> {
        self.tracks
            .first()
            .ok_or_else(|| CaptionError::NoTranscriptFound(Vec::new()))
    }
}

/// HTTP client for the captions API.
pub struct CaptionClient {
    http: reqwest::Client,
}

impl CaptionClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { http })
    }

    /// List the caption tracks of a video.
    #[instrument(skip(self))]
    pub async fn list(&self, video_id: &str) -> std::result::Result<TranscriptList, CaptionError> {
        let html = self
            .http
            .get(WATCH_URL)
            .query(&[("v", video_id)])
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let api_key = extract_api_key(&html)?;
        debug!("Found InnerTube API key");

        let endpoint = url::Url::parse_with_params(PLAYER_URL, &[("key", api_key.as_str())])
            .map_err(|e| CaptionError::Parse(e.to_string()))?;

        let body = json!({
            "context": {
                "client": {
                    "clientName": CLIENT_NAME,
                    "clientVersion": CLIENT_VERSION,
                }
            },
            "videoId": video_id,
        });

        let player: Value = self
            .http
            .post(endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(TranscriptList {
            tracks: parse_player_response(&player)?,
        })
    }

    /// Download a track and flatten it to plain text.
    #[instrument(skip(self, track), fields(language = %track.language_code))]
    pub async fn fetch_text(&self, track: &CaptionTrack) -> std::result::Result<String, CaptionError> {
        let xml = self
            .http
            .get(track.download_url())
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_timedtext(&xml)
    }
}

fn extract_api_key(html: &str) -> std::result::Result<String, CaptionError> {
    if html.contains("action=\"https://consent.youtube.com/s\"") || html.contains("class=\"g-recaptcha\"") {
        return Err(CaptionError::Blocked);
    }

    API_KEY_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| CaptionError::Parse("INNERTUBE_API_KEY not found in watch page".to_string()))
}

/// Pull the caption track list out of an InnerTube player response.
pub fn parse_player_response(player: &Value) -> std::result::Result<Vec<CaptionTrack>, CaptionError> {
    let playability = &player["playabilityStatus"];
    match playability["status"].as_str() {
        Some("OK") | None => {}
        Some(status) => {
            let reason = playability["reason"].as_str().unwrap_or(status);
            return Err(CaptionError::VideoUnavailable(reason.to_string()));
        }
    }

    let tracks = player
        .pointer("/captions/playerCaptionsTracklistRenderer/captionTracks")
        .ok_or(CaptionError::TranscriptsDisabled)?;

    let tracks: Vec<CaptionTrack> = serde_json::from_value(tracks.clone())
        .map_err(|e| CaptionError::Parse(format!("Invalid caption track list: {}", e)))?;

    if tracks.is_empty() {
        return Err(CaptionError::TranscriptsDisabled);
    }

    Ok(tracks)
}

/// Flatten timed-text XML into a single line of text.
pub fn parse_timedtext(xml: &str) -> std::result::Result<String, CaptionError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut parts: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| CaptionError::Parse(format!("Bad caption text: {}", e)))?;
                let text = decode_leftover_entities(&text);
                let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
                if !cleaned.is_empty() {
                    parts.push(cleaned);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(CaptionError::Parse(format!("Error reading caption XML: {}", e))),
            _ => {}
        }
    }

    Ok(parts.join(" "))
}

/// Caption text is often escaped twice; undo the second layer.
fn decode_leftover_entities(text: &str) -> String {
    text.replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// First acquisition strategy: the captions API.
pub struct CaptionsStrategy {
    client: CaptionClient,
    languages: Vec<String>,
}

impl CaptionsStrategy {
    pub fn new(client: CaptionClient, languages: Vec<String>) -> Self {
        Self { client, languages }
    }

    pub fn from_settings(settings: &CaptionSettings) -> Result<Self> {
        let client = CaptionClient::new(Duration::from_secs(settings.timeout_secs))?;
        Ok(Self::new(client, settings.preferred_languages.clone()))
    }
}

/// Pick the track to download and the message reported once it loads.
///
/// Preferred languages win; otherwise the auto-detected track is used.
pub fn select_track<'a>(
    list: &'a TranscriptList,
    languages: &[String],
) -> std::result::Result<(&'a CaptionTrack, String), CaptionError> {
    match list.find(languages) {
        Ok(track) => {
            let message = match languages.first().map(String::as_str) {
                Some("en") | None => "English transcript loaded!".to_string(),
                Some(code) => format!("Transcript loaded ({})!", code),
            };
            Ok((track, message))
        }
        Err(CaptionError::NoTranscriptFound(_)) => list
            .auto_detected()
            .map(|track| (track, "Transcript loaded (auto-detected language)!".to_string())),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl TranscriptStrategy for CaptionsStrategy {
    fn name(&self) -> &'static str {
        "captions"
    }

    fn source(&self) -> TranscriptSource {
        TranscriptSource::Captions
    }

    async fn fetch(&self, video: &VideoReference) -> StrategyReport {
        let list = match self.client.list(video.video_id()).await {
            Ok(list) => list,
            Err(e) => return failure_report(e),
        };

        let (track, loaded) = match select_track(&list, &self.languages) {
            Ok(selected) => selected,
            Err(e) => return failure_report(e),
        };

        match self.client.fetch_text(track).await {
            Ok(text) if text.trim().is_empty() => StrategyReport::new(
                AcquisitionOutcome::Empty,
                StatusMessage::warning("Captions API returned an empty transcript"),
            ),
            Ok(text) => StrategyReport::new(
                AcquisitionOutcome::Success(text),
                StatusMessage::success(loaded),
            ),
            Err(e) => failure_report(e),
        }
    }
}

fn failure_report(error: CaptionError) -> StrategyReport {
    match error {
        CaptionError::TranscriptsDisabled => StrategyReport::new(
            AcquisitionOutcome::Disabled,
            StatusMessage::warning("Transcripts disabled for this video"),
        ),
        CaptionError::NoTranscriptFound(_) => StrategyReport::new(
            AcquisitionOutcome::NotFound,
            StatusMessage::warning("No transcripts found via API"),
        ),
        other => StrategyReport::new(
            AcquisitionOutcome::Unavailable(other.to_string()),
            StatusMessage::warning(format!("API method failed: {}", other)),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(code: &str, kind: Option<&str>) -> CaptionTrack {
        CaptionTrack {
            base_url: format!("https://www.youtube.com/api/timedtext?v=x&lang={}&fmt=srv3", code),
            language_code: code.to_string(),
            kind: kind.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_player_response_tracks() {
        let player = json!({
            "playabilityStatus": {"status": "OK"},
            "captions": {
                "playerCaptionsTracklistRenderer": {
                    "captionTracks": [
                        {"baseUrl": "https://example/a", "languageCode": "de", "kind": "asr", "name": {"runs": []}},
                        {"baseUrl": "https://example/b", "languageCode": "en"}
                    ]
                }
            }
        });

        let tracks = parse_player_response(&player).unwrap();
        assert_eq!(tracks.len(), 2);
        assert!(tracks[0].is_generated());
        assert_eq!(tracks[1].language_code, "en");
    }

    #[test]
    fn test_missing_captions_means_disabled() {
        let player = json!({"playabilityStatus": {"status": "OK"}});
        assert!(matches!(
            parse_player_response(&player),
            Err(CaptionError::TranscriptsDisabled)
        ));
    }

    #[test]
    fn test_unplayable_video() {
        let player = json!({
            "playabilityStatus": {"status": "LOGIN_REQUIRED", "reason": "Sign in to confirm your age"}
        });
        match parse_player_response(&player) {
            Err(CaptionError::VideoUnavailable(reason)) => {
                assert_eq!(reason, "Sign in to confirm your age")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_find_prefers_manual_tracks() {
        let list = TranscriptList {
            tracks: vec![track("en", Some("asr")), track("en", None), track("fr", None)],
        };

        let found = list.find(&["en".to_string()]).unwrap();
        assert!(!found.is_generated());
    }

    #[test]
    fn test_find_falls_back_to_auto_detected() {
        let list = TranscriptList {
            tracks: vec![track("es", Some("asr")), track("fr", None)],
        };

        assert!(matches!(
            list.find(&["en".to_string()]),
            Err(CaptionError::NoTranscriptFound(_))
        ));
        assert_eq!(list.auto_detected().unwrap().language_code, "es");
    }

    #[test]
    fn test_select_track_english() {
        let list = TranscriptList {
            tracks: vec![track("de", None), track("en", Some("asr"))],
        };

        let (found, message) = select_track(&list, &["en".to_string()]).unwrap();
        assert_eq!(found.language_code, "en");
        assert_eq!(message, "English transcript loaded!");
    }

    #[test]
    fn test_select_track_other_preferred_language() {
        let list = TranscriptList {
            tracks: vec![track("en", None), track("de", None)],
        };

        let (found, message) = select_track(&list, &["de".to_string(), "en".to_string()]).unwrap();
        assert_eq!(found.language_code, "de");
        assert_eq!(message, "Transcript loaded (de)!");
    }

    #[test]
    fn test_select_track_auto_detected() {
        let list = TranscriptList {
            tracks: vec![track("es", Some("asr")), track("fr", None)],
        };

        let (found, message) = select_track(&list, &["en".to_string()]).unwrap();
        assert_eq!(found.language_code, "es");
        assert_eq!(message, "Transcript loaded (auto-detected language)!");
    }

    #[test]
    fn test_select_track_empty_list() {
        let list = TranscriptList { tracks: Vec::new() };

        let err = select_track(&list, &["en".to_string()]).unwrap_err();
        assert!(matches!(err, CaptionError::NoTranscriptFound(_)));
        assert_eq!(failure_report(err).outcome, AcquisitionOutcome::NotFound);
    }

    #[test]
    fn test_download_url_drops_srv3() {
        let t = track("en", None);
        assert!(!t.download_url().contains("fmt=srv3"));
        assert!(t.download_url().ends_with("lang=en"));
    }

    #[test]
    fn test_parse_timedtext() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?><transcript>
<text start="0.0" dur="1.5">Hey there,
everyone</text>
<text start="1.5" dur="2.0">it&amp;#39;s a &quot;test&quot;</text>
<text start="3.5" dur="1.0">   </text>
</transcript>"#;

        let text = parse_timedtext(xml).unwrap();
        assert_eq!(text, "Hey there, everyone it's a \"test\"");
    }

    #[test]
    fn test_extract_api_key() {
        let html = r#"<script>ytcfg.set({"INNERTUBE_API_KEY": "AIzaSyA-test_key","OTHER":1});</script>"#;
        assert_eq!(extract_api_key(html).unwrap(), "AIzaSyA-test_key");

        assert!(matches!(extract_api_key("<html></html>"), Err(CaptionError::Parse(_))));
        assert!(matches!(
            extract_api_key(r#"<form action="https://consent.youtube.com/s">"#),
            Err(CaptionError::Blocked)
        ));
    }

    #[test]
    fn test_failure_report_outcomes() {
        assert_eq!(
            failure_report(CaptionError::TranscriptsDisabled).outcome,
            AcquisitionOutcome::Disabled
        );
        assert_eq!(
            failure_report(CaptionError::NoTranscriptFound(vec!["en".to_string()])).outcome,
            AcquisitionOutcome::NotFound
        );
        assert!(matches!(
            failure_report(CaptionError::Blocked).outcome,
            AcquisitionOutcome::Unavailable(_)
        ));
    }
}
