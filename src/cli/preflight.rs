//! Pre-flight checks before starting a session.
//!
//! A missing credential stops the session before the first request.
//! A missing yt-dlp only removes one acquisition strategy, so it is
//! reported as a warning.

use crate::config::Settings;
use crate::error::{BriefError, Result};
use crate::llm::credential_from_env;
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Terminal summary needs the model credential.
    Summarize,
    /// The web UI needs the model credential.
    Serve,
}

/// Run pre-flight checks for the given operation.
///
/// Returns the warnings to show the user, or the error that blocks the session.
pub fn check(operation: Operation, settings: &Settings) -> Result<Vec<String>> {
    match operation {
        Operation::Summarize | Operation::Serve => {
            credential_from_env(&settings.llm)?;
        }
    }

    let mut warnings = Vec::new();
    if settings.subtitles.enabled {
        if let Err(e) = check_tool(&settings.subtitles.binary) {
            warnings.push(format!("{} (subtitle fallback disabled)", e));
        }
    }
    Ok(warnings)
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(BriefError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(BriefError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(BriefError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with_key_env(var: &str) -> Settings {
        let mut settings = Settings::default();
        settings.llm.api_key_env = var.to_string();
        settings.subtitles.binary = "ytbrief-definitely-missing-binary".to_string();
        settings
    }

    #[test]
    fn test_missing_credential_blocks() {
        let settings = settings_with_key_env("YTBRIEF_PREFLIGHT_UNSET_KEY");
        let err = check(Operation::Serve, &settings).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_missing_tool_only_warns() {
        std::env::set_var("YTBRIEF_PREFLIGHT_KEY", "real-key");
        let settings = settings_with_key_env("YTBRIEF_PREFLIGHT_KEY");

        let warnings = check(Operation::Summarize, &settings).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("ytbrief-definitely-missing-binary"));
    }

    #[test]
    fn test_disabled_subtitles_skip_tool_check() {
        std::env::set_var("YTBRIEF_PREFLIGHT_KEY_2", "real-key");
        let mut settings = settings_with_key_env("YTBRIEF_PREFLIGHT_KEY_2");
        settings.subtitles.enabled = false;

        assert!(check(Operation::Summarize, &settings).unwrap().is_empty());
    }
}
