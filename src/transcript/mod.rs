//! Transcript acquisition.
//!
//! Strategies are tried in a fixed order until one yields text:
//!
//! 1. **Captions** - the YouTube captions API, English first, then whatever
//!    language YouTube auto-detected.
//! 2. **Subtitles** - yt-dlp subtitle download for the full URL.
//! 3. **Manual** - text pasted by the user, offered once both fail.

mod captions;
mod subtitles;

pub use captions::{
    parse_player_response, parse_timedtext, select_track, CaptionClient, CaptionError,
    CaptionTrack, CaptionsStrategy, TranscriptList,
};
pub use subtitles::{vtt_to_text, SubtitleStrategy};

use crate::config::Settings;
use crate::error::Result;
use crate::status::StatusMessage;
use crate::video::VideoReference;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Where a transcript came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptSource {
    Captions,
    Subtitles,
    Manual,
}

impl std::fmt::Display for TranscriptSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptSource::Captions => write!(f, "captions"),
            TranscriptSource::Subtitles => write!(f, "subtitles"),
            TranscriptSource::Manual => write!(f, "manual"),
        }
    }
}

/// Plain transcript text from exactly one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcript {
    pub text: String,
    pub source: TranscriptSource,
}

/// Result of a single acquisition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionOutcome {
    Success(String),
    /// The source answered but had no text.
    Empty,
    /// Transcripts are turned off for the video.
    Disabled,
    /// No transcript exists in any acceptable language.
    NotFound,
    /// The source failed for another reason.
    Unavailable(String),
    /// A required external tool is missing.
    NotInstalled(String),
}

/// Outcome plus the status lines produced while getting it.
#[derive(Debug, Clone)]
pub struct StrategyReport {
    pub outcome: AcquisitionOutcome,
    pub statuses: Vec<StatusMessage>,
}

impl StrategyReport {
    pub fn new(outcome: AcquisitionOutcome, status: StatusMessage) -> Self {
        Self {
            outcome,
            statuses: vec![status],
        }
    }
}

/// One way of obtaining a transcript.
#[async_trait]
pub trait TranscriptStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Source recorded on transcripts this strategy produces.
    fn source(&self) -> TranscriptSource;

    /// Try to fetch the transcript. Failures are reported, never raised.
    async fn fetch(&self, video: &VideoReference) -> StrategyReport;
}

/// Result of running the automated strategies.
#[derive(Debug, Clone)]
pub struct Acquisition {
    pub transcript: Option<Transcript>,
    pub statuses: Vec<StatusMessage>,
    /// All automated strategies failed; manual entry should be offered.
    pub manual_required: bool,
}

/// Runs transcript strategies in order until one succeeds.
pub struct TranscriptAcquirer {
    strategies: Vec<Arc<dyn TranscriptStrategy>>,
}

impl TranscriptAcquirer {
    pub fn new(strategies: Vec<Arc<dyn TranscriptStrategy>>) -> Self {
        Self { strategies }
    }

    /// Build the default chain: captions API, then yt-dlp subtitles if enabled.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut strategies: Vec<Arc<dyn TranscriptStrategy>> =
            vec![Arc::new(CaptionsStrategy::from_settings(&settings.captions)?)];

        if settings.subtitles.enabled {
            strategies.push(Arc::new(SubtitleStrategy::from_settings(&settings.subtitles)));
        }

        Ok(Self::new(strategies))
    }

    /// Names of the configured strategies, in order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    #[instrument(skip(self, video), fields(video_id = %video.video_id()))]
    pub async fn acquire(&self, video: &VideoReference) -> Acquisition {
        let mut statuses = Vec::new();

        for strategy in &self.strategies {
            debug!("Trying transcript strategy: {}", strategy.name());
            let report = strategy.fetch(video).await;
            statuses.extend(report.statuses);

            match report.outcome {
                AcquisitionOutcome::Success(text) if !text.trim().is_empty() => {
                    return Acquisition {
                        transcript: Some(Transcript {
                            text: text.trim().to_string(),
                            source: strategy.source(),
                        }),
                        statuses,
                        manual_required: false,
                    };
                }
                other => debug!("Strategy {} gave {:?}", strategy.name(), other),
            }
        }

        statuses.push(StatusMessage::error("Automatic transcript loading failed."));

        Acquisition {
            transcript: None,
            statuses,
            manual_required: true,
        }
    }
}

/// Accept text pasted by the user as the transcript.
///
/// Blank input is rejected with a warning and yields no transcript.
pub fn accept_manual_transcript(text: &str) -> (Option<Transcript>, StatusMessage) {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return (None, StatusMessage::warning("Please paste a transcript first."));
    }

    (
        Some(Transcript {
            text: trimmed.to_string(),
            source: TranscriptSource::Manual,
        }),
        StatusMessage::success("Manual transcript accepted!"),
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::status::StatusLevel;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Strategy returning a fixed outcome and counting calls.
    pub(crate) struct FixedStrategy {
        pub outcome: AcquisitionOutcome,
        pub source: TranscriptSource,
        pub calls: AtomicUsize,
    }

    impl FixedStrategy {
        pub(crate) fn new(outcome: AcquisitionOutcome, source: TranscriptSource) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                source,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TranscriptStrategy for FixedStrategy {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn source(&self) -> TranscriptSource {
            self.source
        }

        async fn fetch(&self, _video: &VideoReference) -> StrategyReport {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let status = match &self.outcome {
                AcquisitionOutcome::Success(_) => StatusMessage::success("loaded"),
                AcquisitionOutcome::Disabled => {
                    StatusMessage::warning("Transcripts disabled for this video")
                }
                other => StatusMessage::warning(format!("{:?}", other)),
            };
            StrategyReport::new(self.outcome.clone(), status)
        }
    }

    fn video() -> VideoReference {
        VideoReference::parse("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap()
    }

    #[tokio::test]
    async fn test_disabled_falls_through_to_next_strategy() {
        let captions = FixedStrategy::new(AcquisitionOutcome::Disabled, TranscriptSource::Captions);
        let subtitles = FixedStrategy::new(
            AcquisitionOutcome::Success("  hello from subtitles \n".to_string()),
            TranscriptSource::Subtitles,
        );
        let acquirer = TranscriptAcquirer::new(vec![captions.clone(), subtitles.clone()]);

        let result = acquirer.acquire(&video()).await;

        let transcript = result.transcript.unwrap();
        assert_eq!(transcript.text, "hello from subtitles");
        assert_eq!(transcript.source, TranscriptSource::Subtitles);
        assert!(!result.manual_required);
        assert_eq!(captions.calls.load(Ordering::SeqCst), 1);
        assert_eq!(subtitles.calls.load(Ordering::SeqCst), 1);
        assert!(result.statuses.iter().all(|s| s.level != StatusLevel::Error));
    }

    #[tokio::test]
    async fn test_first_success_stops_chain() {
        let captions = FixedStrategy::new(
            AcquisitionOutcome::Success("caption text".to_string()),
            TranscriptSource::Captions,
        );
        let subtitles = FixedStrategy::new(
            AcquisitionOutcome::Success("unused".to_string()),
            TranscriptSource::Subtitles,
        );
        let acquirer = TranscriptAcquirer::new(vec![captions, subtitles.clone()]);

        let result = acquirer.acquire(&video()).await;
        assert_eq!(result.transcript.unwrap().source, TranscriptSource::Captions);
        assert_eq!(subtitles.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_exhaustion_requires_manual_entry() {
        let acquirer = TranscriptAcquirer::new(vec![
            FixedStrategy::new(AcquisitionOutcome::NotFound, TranscriptSource::Captions),
            FixedStrategy::new(
                AcquisitionOutcome::NotInstalled("yt-dlp".to_string()),
                TranscriptSource::Subtitles,
            ),
        ]);

        let result = acquirer.acquire(&video()).await;
        assert!(result.transcript.is_none());
        assert!(result.manual_required);
        assert_eq!(result.statuses.len(), 3);
        assert_eq!(result.statuses.last().unwrap().level, StatusLevel::Error);
    }

    #[tokio::test]
    async fn test_whitespace_success_counts_as_empty() {
        let acquirer = TranscriptAcquirer::new(vec![FixedStrategy::new(
            AcquisitionOutcome::Success("   ".to_string()),
            TranscriptSource::Captions,
        )]);

        let result = acquirer.acquire(&video()).await;
        assert!(result.transcript.is_none());
        assert!(result.manual_required);
    }

    #[test]
    fn test_manual_blank_is_rejected() {
        let (transcript, status) = accept_manual_transcript(" \n\t ");
        assert!(transcript.is_none());
        assert_eq!(status.level, StatusLevel::Warning);
    }

    #[test]
    fn test_manual_text_is_trimmed() {
        let (transcript, status) = accept_manual_transcript("\n  pasted words  \n");
        let transcript = transcript.unwrap();
        assert_eq!(transcript.text, "pasted words");
        assert_eq!(transcript.source, TranscriptSource::Manual);
        assert_eq!(status.level, StatusLevel::Success);
    }

    #[test]
    fn test_default_chain_order() {
        let acquirer = TranscriptAcquirer::from_settings(&Settings::default()).unwrap();
        assert_eq!(acquirer.strategy_names(), vec!["captions", "yt-dlp"]);

        let mut settings = Settings::default();
        settings.subtitles.enabled = false;
        let acquirer = TranscriptAcquirer::from_settings(&settings).unwrap();
        assert_eq!(acquirer.strategy_names(), vec!["captions"]);
    }
}
