//! Prompt templates for ytbrief.
//!
//! The summary prompt can be customized by placing a `summary.toml` file in the
//! custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Name of the single slot the summary template must contain.
pub const TRANSCRIPT_SLOT: &str = "video_transcript";

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub summary: SummaryPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for video summarization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    /// Optional instructions sent in the system role (or merged into the
    /// user message). Empty by default; the user template is the whole prompt.
    pub system: String,
    /// User template. `{{video_transcript}}` is replaced with the transcript.
    pub user: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            system: String::new(),
            user: r#"Read through the entire transcript carefully.
Provide a concise summary of the video's main topic and purpose.
Extract and list the five most interesting or important points from the transcript.

- Ensure your summary and key points capture the essence of the video without including unnecessary details.
- Use clear, engaging language that is accessible to a general audience.
- If the transcript includes any statistical data, expert opinion, or unique insights,
  prioritize including these in your summary or key points.

Video transcript: {{video_transcript}}"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }
        }

        if !prompts.summary.user.contains(&format!("{{{{{}}}}}", TRANSCRIPT_SLOT)) {
            return Err(crate::error::BriefError::Config(format!(
                "Summary prompt must contain {{{{{}}}}}",
                TRANSCRIPT_SLOT
            )));
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render the summary prompt for a transcript.
    ///
    /// Custom config variables are substituted first, so text inside the
    /// transcript is never treated as a template.
    pub fn render_summary(&self, transcript: &str) -> String {
        let mut vars = self.variables.clone();
        vars.remove(TRANSCRIPT_SLOT);
        Self::render(&self.summary.user, &vars).replace(&format!("{{{{{}}}}}", TRANSCRIPT_SLOT), transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.summary.system.is_empty());
        assert_eq!(prompts.summary.user.matches("{{video_transcript}}").count(), 1);
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_render_summary_passes_transcript_verbatim() {
        let mut prompts = Prompts::default();
        prompts.summary.user = "Audience: {{audience}}\n{{video_transcript}}".to_string();
        prompts.variables.insert("audience".to_string(), "engineers".to_string());

        let long = "word {{audience}} ".repeat(10_000);
        let rendered = prompts.render_summary(&long);
        assert!(rendered.starts_with("Audience: engineers\n"));
        assert!(rendered.ends_with(&long));
    }

    #[test]
    fn test_custom_dir_override() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("summary.toml"),
            "system = \"Be brief.\"\nuser = \"TL;DR: {{video_transcript}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.summary.system, "Be brief.");
        assert_eq!(prompts.render_summary("abc"), "TL;DR: abc");
    }

    #[test]
    fn test_custom_template_without_slot_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("summary.toml"), "user = \"Summarize it\"\n").unwrap();

        let err = Prompts::load(dir.path().to_str(), None).unwrap_err();
        assert!(matches!(err, crate::error::BriefError::Config(_)));
    }
}
