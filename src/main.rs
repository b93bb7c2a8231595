//! litrev - two-agent literature review assistant
//!
//! A retriever agent queries arXiv through a search tool and picks the most
//! relevant papers; a writer agent turns them into a short Markdown review.
//! The exchange is shown on a web form or printed in the terminal.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing credential, search or model failure, etc.)

mod agent;
mod cli;
mod config;
mod error;
mod llm;
mod models;
mod pipeline;
mod runtime;
mod search;
mod shell;
mod team;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use models::ReviewRequest;
use search::ArxivClient;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    init_logging(&args);

    info!("litrev v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args) {
        error!("Review failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Handle --init-config: generate a default .litrev.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
    }

    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to choose the model provider, search endpoint, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: a tracing subscriber was already installed");
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let search = Arc::new(
        ArxivClient::new(
            config.search.base_url.clone(),
            config.search.timeout_seconds.map(Duration::from_secs),
        )
        .context("Failed to create arXiv client")?,
    );

    if args.dry_run {
        let request = request_from_args(&args, &config)?;
        return handle_dry_run(&config, search.as_ref(), &request);
    }

    let model = llm::build_client(&config.model)?;
    let team = pipeline::build_team(&config, model, search)?;

    if args.serve {
        println!("🤖 Model: {} ({})", config.model.name, config.model.provider);
        let state = Arc::new(shell::web::AppState::new(team, config.review.default_papers));
        let bind = config.server.bind.clone();
        return runtime::block_on(shell::web::serve(state, &bind))?;
    }

    let request = request_from_args(&args, &config)?;
    println!(
        "🔎 Reviewing \"{}\" with {} papers using {}\n",
        request.topic(),
        request.num_papers(),
        config.model.name
    );
    runtime::block_on(shell::terminal::run(&team, &request, !args.quiet))?
}

fn request_from_args(args: &Args, config: &Config) -> Result<ReviewRequest> {
    let topic = args.topic.as_deref().unwrap_or_default();
    ReviewRequest::new(topic, config.review.default_papers).context("Topic must not be empty")
}

/// Handle --dry-run: search only, print the candidates, exit.
fn handle_dry_run(config: &Config, search: &ArxivClient, request: &ReviewRequest) -> Result<()> {
    println!("\n🔍 Dry run: searching arXiv (no model calls)...\n");

    let papers = runtime::block_on(pipeline::dry_run(config, search, request))??;
    shell::terminal::print_papers(&papers, &mut std::io::stdout())?;

    println!("\n✅ Dry run complete. No model calls were made.");
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
