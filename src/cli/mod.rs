//! CLI module for ytbrief.

pub mod commands;
mod output;
pub mod preflight;

pub use output::{content_preview, Output};

use clap::{Parser, Subcommand};

/// ytbrief - YouTube Video Summarizer
///
/// Fetches a video's transcript and turns it into a structured summary
/// with a hosted language model.
#[derive(Parser, Debug)]
#[command(name = "ytbrief")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "YTBRIEF_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the web UI
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Summarize a video in the terminal
    Summarize {
        /// YouTube video URL
        url: String,

        /// Transcript file to use when automatic loading fails ("-" for stdin)
        #[arg(short, long)]
        transcript_file: Option<String>,

        /// Save the summary as youtube_summary_<id>.txt in the current directory
        #[arg(short, long)]
        save: bool,

        /// Write the summary to this file
        #[arg(short, long)]
        output: Option<String>,

        /// Print the full transcript after the summary
        #[arg(long)]
        show_transcript: bool,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
