//! ytbrief - YouTube video summaries from a hosted language model
//!
//! Give it a YouTube URL and it fetches the transcript, asks a hosted
//! chat model for a structured summary and shows the result in a browser
//! or the terminal.
//!
//! # Overview
//!
//! A request runs through three stages:
//! - Validate the URL and extract the 11-character video ID
//! - Acquire a transcript from the captions API, then yt-dlp subtitles,
//!   then text pasted by the user
//! - Render the summary prompt and send it to the model, falling back from
//!   chat completions to legacy completions
//!
//! # Architecture
//!
//! - `config` - Settings file and prompt templates
//! - `video` - URL validation and video ID extraction
//! - `transcript` - Ordered transcript acquisition strategies
//! - `llm` - Process-wide model client
//! - `summarize` - Prompt rendering and model invocation
//! - `pipeline` - Request coordination
//! - `cli` - Terminal commands and the web UI
//!
//! # Example
//!
//! ```rust,no_run
//! use ytbrief::config::Settings;
//! use ytbrief::pipeline::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::new(&settings)?;
//!
//!     let report = pipeline.run("https://youtu.be/dQw4w9WgXcQ").await?;
//!     if let Some(summary) = report.summary {
//!         println!("{}", summary.text);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod status;
pub mod summarize;
pub mod transcript;
pub mod video;

pub use error::{BriefError, Result};
