//! Error types for ytbrief.

use thiserror::Error;

/// Library-level error type for ytbrief operations.
#[derive(Error, Debug)]
pub enum BriefError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No transcript available: {0}")]
    NoTranscript(String),

    #[error("Summarization failed: {0}")]
    Summarization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),
}

impl BriefError {
    /// Whether this error should stop the whole session rather than a single request.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BriefError::Config(_))
    }

    /// Message without the variant prefix, for status lines that add their own.
    pub fn detail(&self) -> String {
        match self {
            BriefError::Summarization(msg) | BriefError::NoTranscript(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for ytbrief operations.
pub type Result<T> = std::result::Result<T, BriefError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_drops_variant_prefix() {
        let err = BriefError::Summarization("Chat completion failed: timeout".to_string());
        assert_eq!(err.to_string(), "Summarization failed: Chat completion failed: timeout");
        assert_eq!(err.detail(), "Chat completion failed: timeout");

        let err = BriefError::Config("missing key".to_string());
        assert_eq!(err.detail(), "Configuration error: missing key");
    }
}
