//! ytbrief CLI entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use ytbrief::cli::commands::{self, SummarizeOptions};
use ytbrief::cli::{Cli, Commands};
use ytbrief::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // Values from .env win over the inherited environment
    let _ = dotenvy::dotenv_override();

    let cli = Cli::parse();

    // Load configuration
    let config_path = match &cli.config {
        Some(path) => Settings::expand_path(path),
        None => Settings::default_config_path(),
    };
    let settings = Settings::load_from(Some(&config_path))?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("ytbrief={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Execute command
    match &cli.command {
        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Summarize {
            url,
            transcript_file,
            save,
            output,
            show_transcript,
        } => {
            let options = SummarizeOptions {
                transcript_file: transcript_file.clone(),
                save: *save,
                output: output.clone(),
                show_transcript: *show_transcript,
            };
            commands::run_summarize(url, options, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, &config_path)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, &config_path)?;
        }
    }

    Ok(())
}
