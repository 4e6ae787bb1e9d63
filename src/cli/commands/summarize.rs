//! Summarize command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{content_preview, Output};
use crate::config::Settings;
use crate::pipeline::{Pipeline, PipelineReport};
use crate::status::StatusMessage;
use anyhow::{Context, Result};
use std::io::IsTerminal;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tracing::info;

/// Options for a terminal summary run.
#[derive(Debug, Default)]
pub struct SummarizeOptions {
    /// Transcript to fall back on; "-" reads stdin.
    pub transcript_file: Option<String>,
    pub save: bool,
    pub output: Option<String>,
    pub show_transcript: bool,
}

/// Run the summarize command.
pub async fn run_summarize(url: &str, options: SummarizeOptions, settings: Settings) -> Result<()> {
    for warning in preflight::check(Operation::Summarize, &settings)? {
        Output::warning(&warning);
    }

    let pipeline = Pipeline::new(&settings)?;
    info!("Summarizing {} with {}", url, pipeline.model_name());

    let spinner = Output::spinner("Loading transcript and generating summary...");
    let result = pipeline.run(url.trim()).await;
    spinner.finish_and_clear();
    let mut report = result?;
    print_statuses(&report.statuses);

    if report.manual_required {
        let text = read_manual_transcript(options.transcript_file.as_deref()).await?;

        let spinner = Output::spinner("Generating summary...");
        let result = pipeline.run_manual(report.video.url(), &text).await;
        spinner.finish_and_clear();
        report = result?;
        print_statuses(&report.statuses);
    }

    present(report, &options)
}

fn print_statuses(statuses: &[StatusMessage]) {
    for status in statuses {
        Output::status(status);
    }
}

/// Read a manually supplied transcript from a file or stdin.
async fn read_manual_transcript(source: Option<&str>) -> Result<String> {
    match source {
        Some(path) if path != "-" => {
            let path = Settings::expand_path(path);
            tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read transcript file {:?}", path))
        }
        _ => {
            if std::io::stdin().is_terminal() {
                Output::header("Manual Transcript Input");
                Output::list_item("Go to the YouTube video");
                Output::list_item("Click \"Show transcript\" below the video");
                Output::list_item("Copy the transcript text");
                Output::list_item("Paste it here, then press Ctrl-D");
                println!();
            }
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("Failed to read transcript from stdin")?;
            Ok(text)
        }
    }
}

fn present(report: PipelineReport, options: &SummarizeOptions) -> Result<()> {
    let file_name = report.video.summary_file_name();
    let watch_url = report.video.watch_url();
    let (transcript, summary) = report.into_summary()?;

    Output::kv("Video", &watch_url);
    Output::kv("Model output", &summary.style.to_string());
    if !options.show_transcript {
        Output::kv("Transcript", &content_preview(&transcript.text, 120));
    }

    Output::header("AI-Generated Summary");
    println!();
    println!("{}", summary.text);
    println!();

    let mut targets: Vec<PathBuf> = Vec::new();
    if let Some(output) = &options.output {
        targets.push(Settings::expand_path(output));
    }
    if options.save {
        targets.push(PathBuf::from(&file_name));
    }
    for path in targets {
        std::fs::write(&path, &summary.text)
            .with_context(|| format!("Failed to write summary to {:?}", path))?;
        Output::success(&format!("Summary saved to {}", path.display()));
    }

    if options.show_transcript {
        Output::header(&format!("Full Transcript ({})", transcript.source));
        println!();
        println!("{}", transcript.text);
    }

    Ok(())
}
