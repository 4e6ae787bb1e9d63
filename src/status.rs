//! Human-readable status messages reported by each pipeline step.

use serde::Serialize;

/// Severity of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusLevel::Info => write!(f, "info"),
            StatusLevel::Success => write!(f, "success"),
            StatusLevel::Warning => write!(f, "warning"),
            StatusLevel::Error => write!(f, "error"),
        }
    }
}

/// A status line shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

impl StatusMessage {
    pub fn new(level: StatusLevel, text: impl Into<String>) -> Self {
        let message = Self {
            level,
            text: text.into(),
        };
        message.trace();
        message
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(StatusLevel::Info, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(StatusLevel::Success, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(StatusLevel::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(StatusLevel::Error, text)
    }

    fn trace(&self) {
        match self.level {
            StatusLevel::Info | StatusLevel::Success => tracing::info!("{}", self.text),
            StatusLevel::Warning => tracing::warn!("{}", self.text),
            StatusLevel::Error => tracing::error!("{}", self.text),
        }
    }
}
