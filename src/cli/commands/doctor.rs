//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::{LlmSettings, Settings, PLACEHOLDER_API_KEY};
use console::style;
use std::path::Path;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("ytbrief Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("Language Model").bold());
    let key_check = check_api_key(&settings.llm, std::env::var(&settings.llm.api_key_env).ok());
    key_check.print();
    checks.push(key_check);
    Output::kv("Model", &settings.llm.model);
    Output::kv("Provider", settings.llm.provider());
    Output::kv("Endpoint", &settings.llm.api_base);

    println!();

    println!("{}", style("Transcript Sources").bold());
    let captions = CheckResult::ok(
        "Captions API",
        &format!("languages: {}", settings.captions.preferred_languages.join(", ")),
    );
    captions.print();
    checks.push(captions);

    let subtitles = if settings.subtitles.enabled {
        check_tool(&settings.subtitles.binary, install_hint_ytdlp())
    } else {
        CheckResult::ok(&settings.subtitles.binary, "disabled in config")
    };
    subtitles.print();
    checks.push(subtitles);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(config_path);
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using ytbrief.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! ytbrief is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str, hint: &str) -> CheckResult {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();
            CheckResult::ok(name, &version)
        }
        Ok(_) => CheckResult::warning(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::warning(name, "not found (subtitle fallback unavailable)", hint)
        }
        Err(e) => CheckResult::warning(name, &format!("error: {}", e), hint),
    }
}

/// Check the model API key named in settings.
fn check_api_key(settings: &LlmSettings, value: Option<String>) -> CheckResult {
    let var = settings.api_key_env.as_str();
    let hint = format!("Set {} in your environment or .env file", var);

    match value.as_deref().map(str::trim) {
        None => CheckResult::error(var, "not set", &hint),
        Some("") => CheckResult::error(var, "empty", &hint),
        Some(PLACEHOLDER_API_KEY) => CheckResult::error(var, "still the sample placeholder", &hint),
        Some(key) => CheckResult::ok(var, &format!("configured ({})", mask_key(key))),
    }
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: ytbrief config edit",
        )
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}
