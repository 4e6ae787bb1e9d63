//! Configuration module for ytbrief.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, SummaryPrompts, TRANSCRIPT_SLOT};
pub use settings::{
    CaptionSettings, GeneralSettings, LlmSettings, PromptSettings, ServerSettings, Settings,
    SubtitleSettings, PLACEHOLDER_API_KEY,
};
