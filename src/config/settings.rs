//! Configuration settings for ytbrief.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Value shipped in sample `.env` files; treated the same as a missing key.
pub const PLACEHOLDER_API_KEY: &str = "your_actual_api_key_here";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub captions: CaptionSettings,
    pub subtitles: SubtitleSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level used when no `-v` flag or RUST_LOG is given.
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Hosted model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL of an OpenAI-compatible API.
    pub api_base: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Model used for summaries.
    pub model: String,
    /// Sampling temperature. 0.0 keeps output deterministic.
    pub temperature: f32,
    /// Merge system instructions into the user message, for models
    /// without a system role.
    pub system_as_user: bool,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            api_key_env: "GOOGLE_API_KEY".to_string(),
            model: "gemini-1.5-flash".to_string(),
            temperature: 0.0,
            system_as_user: true,
            timeout_secs: 300,
        }
    }
}

impl LlmSettings {
    /// Human-readable provider name derived from the API base.
    pub fn provider(&self) -> &'static str {
        if self.api_base.contains("googleapis.com") {
            "Google AI"
        } else if self.api_base.contains("openai.com") {
            "OpenAI"
        } else {
            "OpenAI-compatible"
        }
    }
}

/// Captions API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionSettings {
    /// Languages requested first, in order of preference.
    pub preferred_languages: Vec<String>,
    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            preferred_languages: vec!["en".to_string()],
            timeout_secs: 30,
        }
    }
}

/// yt-dlp subtitle fallback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleSettings {
    /// Whether the yt-dlp strategy is attempted at all.
    pub enabled: bool,
    /// Path or name of the yt-dlp binary.
    pub binary: String,
    /// Value passed to `--sub-langs`.
    pub languages: String,
}

impl Default for SubtitleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            binary: "yt-dlp".to_string(),
            languages: "en,en-US,en-GB".to_string(),
        }
    }
}

/// Web UI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in the prompt as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::BriefError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ytbrief")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.llm.model, "gemini-1.5-flash");
        assert_eq!(settings.llm.temperature, 0.0);
        assert!(settings.llm.system_as_user);
        assert_eq!(settings.captions.preferred_languages, vec!["en".to_string()]);
        assert_eq!(settings.llm.provider(), "Google AI");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[llm]\nmodel = \"gpt-4o-mini\"\n\n[server]\nport = 9000\n").unwrap();

        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.llm.model, "gpt-4o-mini");
        assert_eq!(settings.llm.api_key_env, "GOOGLE_API_KEY");
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert!(settings.subtitles.enabled);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.server.port, 8501);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut settings = Settings::default();
        settings.subtitles.enabled = false;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert!(!loaded.subtitles.enabled);
    }
}
