//! Transcript summarization.

use crate::config::Prompts;
use crate::error::{BriefError, Result};
use crate::llm::{InvocationStyle, LanguageModel};
use crate::transcript::Transcript;
use crate::video::VideoReference;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Model-written summary of one video.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryResult {
    pub video_id: String,
    /// Free-form markdown.
    pub text: String,
    pub style: InvocationStyle,
    pub generated_at: DateTime<Utc>,
}

/// Renders the summary prompt and sends it to the model.
pub struct Summarizer {
    model: Arc<dyn LanguageModel>,
    prompts: Prompts,
}

impl Summarizer {
    pub fn new(model: Arc<dyn LanguageModel>, prompts: Prompts) -> Self {
        Self { model, prompts }
    }

    pub fn model_name(&self) -> &str {
        self.model.model()
    }

    /// Summarize a transcript.
    ///
    /// Tries chat completions first and falls back to the legacy completions
    /// call with the same rendered prompt. The transcript is sent whole.
    #[instrument(skip(self, video, transcript), fields(video_id = %video.video_id(), chars = transcript.text.len()))]
    pub async fn summarize(&self, video: &VideoReference, transcript: &Transcript) -> Result<SummaryResult> {
        let prompt = self.prompts.render_summary(&transcript.text);

        let (output, style) = match self.model.invoke_chat(&self.prompts.summary.system, &prompt).await {
            Ok(output) => (output, InvocationStyle::Chat),
            Err(chat_err) => {
                warn!("Chat invocation failed, trying completion: {}", chat_err);
                let legacy_prompt = if self.prompts.summary.system.trim().is_empty() {
                    prompt
                } else {
                    format!("{}\n\n{}", self.prompts.summary.system, prompt)
                };
                match self.model.invoke_completion(&legacy_prompt).await {
                    Ok(output) => (output, InvocationStyle::Completion),
                    Err(completion_err) => {
                        return Err(BriefError::Summarization(format!(
                            "{} (fallback: {})",
                            chat_err.detail(),
                            completion_err.detail()
                        )))
                    }
                }
            }
        };

        let text = output.into_text();
        if text.trim().is_empty() {
            return Err(BriefError::Summarization("Model returned an empty summary".to_string()));
        }

        info!("Summary generated via {} ({} chars)", style, text.len());

        Ok(SummaryResult {
            video_id: video.video_id().to_string(),
            text: text.trim().to_string(),
            style,
            generated_at: Utc::now(),
        })
    }
}
