//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::Provider;
use crate::models::{MAX_PAPERS, MIN_PAPERS};
use clap::Parser;
use std::path::PathBuf;

/// litrev - two-agent literature review assistant
///
/// A retriever agent searches arXiv for candidate papers and picks the most
/// relevant ones; a writer agent turns them into a short Markdown review.
///
/// Examples:
///   litrev --serve
///   litrev --topic "graph neural networks" --papers 3
///   litrev --topic "protein folding" --provider ollama --model llama3.2:latest
///   litrev --topic "diffusion models" --dry-run
///   litrev --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Research topic to review from the terminal
    #[arg(short, long, value_name = "TOPIC", conflicts_with = "serve")]
    pub topic: Option<String>,

    /// Number of papers in the review (1-10)
    ///
    /// With --serve, sets the form's preselected count.
    #[arg(short, long, value_name = "COUNT")]
    pub papers: Option<u32>,

    /// Serve the interactive review form
    #[arg(long)]
    pub serve: bool,

    /// Address to serve the form on
    #[arg(long, value_name = "ADDR", env = "LITREV_BIND")]
    pub bind: Option<String>,

    /// Model identifier passed to the provider
    ///
    /// Can also be set via LITREV_MODEL env var or .litrev.toml config.
    #[arg(short, long, env = "LITREV_MODEL")]
    pub model: Option<String>,

    /// Chat API provider
    #[arg(long, value_name = "PROVIDER")]
    pub provider: Option<Provider>,

    /// Chat API base URL
    #[arg(long, value_name = "URL")]
    pub model_url: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .litrev.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: search arXiv without calling the model
    ///
    /// Prints the candidate papers the retriever would choose from and exits.
    #[arg(long, requires = "topic")]
    pub dry_run: bool,

    /// Generate a default .litrev.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if !self.serve && self.topic.is_none() {
            return Err("Either --topic or --serve is required".to_string());
        }

        if let Some(ref topic) = self.topic {
            if topic.trim().is_empty() {
                return Err("Topic must not be empty".to_string());
            }
        }

        if let Some(papers) = self.papers {
            if !(MIN_PAPERS..=MAX_PAPERS).contains(&papers) {
                return Err(format!(
                    "Paper count must be between {} and {}",
                    MIN_PAPERS, MAX_PAPERS
                ));
            }
        }

        if let Some(ref url) = self.model_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Model URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
