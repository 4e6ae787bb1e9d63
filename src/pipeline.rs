//! Request pipeline: validate the URL, acquire a transcript, summarize it.

use crate::config::{Prompts, Settings};
use crate::error::{BriefError, Result};
use crate::llm::{LanguageModel, ModelClient};
use crate::status::StatusMessage;
use crate::summarize::{SummaryResult, Summarizer};
use crate::transcript::{accept_manual_transcript, Transcript, TranscriptAcquirer};
use crate::video::VideoReference;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// Everything produced for one request.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub video: VideoReference,
    pub statuses: Vec<StatusMessage>,
    pub transcript: Option<Transcript>,
    pub summary: Option<SummaryResult>,
    /// Automated acquisition failed and the user should paste a transcript.
    pub manual_required: bool,
}

impl PipelineReport {
    fn new(video: VideoReference) -> Self {
        Self {
            video,
            statuses: Vec::new(),
            transcript: None,
            summary: None,
            manual_required: false,
        }
    }

    /// Convert a finished report into a terminal error when no summary was produced.
    pub fn into_summary(self) -> Result<(Transcript, SummaryResult)> {
        match (self.transcript, self.summary) {
            (Some(t), Some(s)) => Ok((t, s)),
            (None, _) => Err(BriefError::NoTranscript(format!(
                "no transcript for video {}",
                self.video.video_id()
            ))),
            (Some(_), None) => Err(BriefError::Summarization(
                self.statuses
                    .last()
                    .map(|s| s.text.clone())
                    .unwrap_or_else(|| "no summary produced".to_string()),
            )),
        }
    }
}

/// Wires the acquirer and summarizer together.
pub struct Pipeline {
    acquirer: TranscriptAcquirer,
    summarizer: Summarizer,
}

impl Pipeline {
    /// Build the pipeline from settings using the shared model client.
    ///
    /// Fails with a configuration error when no API key is set.
    pub fn new(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let model: Arc<dyn LanguageModel> = ModelClient::shared(&settings.llm)?;
        let acquirer = TranscriptAcquirer::from_settings(settings)?;
        info!("Transcript strategies: {}", acquirer.strategy_names().join(" -> "));

        Ok(Self::with_components(acquirer, Summarizer::new(model, prompts)))
    }

    /// Create a pipeline with custom components.
    pub fn with_components(acquirer: TranscriptAcquirer, summarizer: Summarizer) -> Self {
        Self { acquirer, summarizer }
    }

    pub fn model_name(&self) -> &str {
        self.summarizer.model_name()
    }

    /// Run the automated path for a URL.
    ///
    /// Input errors are returned as `Err`; everything after validation is
    /// reported through the returned statuses.
    #[instrument(skip(self))]
    pub async fn run(&self, url: &str) -> Result<PipelineReport> {
        let video = VideoReference::parse(url)?;
        let mut report = PipelineReport::new(video);

        let acquisition = self.acquirer.acquire(&report.video).await;
        report.statuses.extend(acquisition.statuses);
        report.manual_required = acquisition.manual_required;

        if let Some(transcript) = acquisition.transcript {
            self.summarize_into(&mut report, transcript).await;
        }

        Ok(report)
    }

    /// Summarize a transcript pasted by the user.
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn run_manual(&self, url: &str, text: &str) -> Result<PipelineReport> {
        let video = VideoReference::parse(url)?;
        let mut report = PipelineReport::new(video);

        let (transcript, status) = accept_manual_transcript(text);
        report.statuses.push(status);

        match transcript {
            Some(transcript) => self.summarize_into(&mut report, transcript).await,
            None => report.manual_required = true,
        }

        Ok(report)
    }

    async fn summarize_into(&self, report: &mut PipelineReport, transcript: Transcript) {
        info!("Summarizing {} transcript ({} chars)", transcript.source, transcript.text.len());
        match self.summarizer.summarize(&report.video, &transcript).await {
            Ok(summary) => report.summary = Some(summary),
            Err(e) => report
                .statuses
                .push(StatusMessage::error(format!("Error generating summary: {}", e.detail()))),
        }
        report.transcript = Some(transcript);
    }
}
