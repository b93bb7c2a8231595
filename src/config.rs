//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.litrev.toml` files. Credentials never live here: the model section
//! only names the environment variable the key is read from.

use crate::models::{clamp_papers, DEFAULT_PAPERS};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".litrev.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Paper search settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Web form settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Review pipeline settings.
    #[serde(default)]
    pub review: ReviewConfig,
}

/// Which chat API the agents talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI-compatible `/chat/completions` endpoint (default)
    #[default]
    Openai,
    /// Ollama `/api/chat` endpoint
    Ollama,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Openai => write!(f, "openai"),
            Provider::Ollama => write!(f, "ollama"),
        }
    }
}

impl Provider {
    /// Base URL used when the config does not set one.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Openai => "https://api.openai.com/v1",
            Provider::Ollama => "http://localhost:11434",
        }
    }
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Chat API flavour.
    #[serde(default)]
    pub provider: Provider,

    /// Model identifier passed to the provider.
    #[serde(default = "default_model")]
    pub name: String,

    /// API base URL. Falls back to the provider's default when unset.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Temperature for generation. Provider default when unset.
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Request timeout in seconds. No local timeout when unset.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            name: default_model(),
            base_url: None,
            api_key_env: default_api_key_env(),
            temperature: None,
            timeout_seconds: None,
        }
    }
}

impl ModelConfig {
    pub fn effective_base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.provider.default_base_url().to_string())
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

/// arXiv search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// arXiv query endpoint.
    #[serde(default = "default_search_url")]
    pub base_url: String,

    /// Result count when the model does not pass `max_results`.
    #[serde(default = "default_max_results")]
    pub default_max_results: u32,

    /// How many candidates to fetch per requested paper.
    #[serde(default = "default_over_fetch")]
    pub over_fetch_factor: u32,

    /// Request timeout in seconds. No local timeout when unset.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_search_url(),
            default_max_results: default_max_results(),
            over_fetch_factor: default_over_fetch(),
            timeout_seconds: None,
        }
    }
}

fn default_search_url() -> String {
    "http://export.arxiv.org/api/query".to_string()
}

fn default_max_results() -> u32 {
    5
}

fn default_over_fetch() -> u32 {
    5
}

/// Web form settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the form is served on.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8501".to_string()
}

/// Review pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Paper count preselected on the form.
    #[serde(default = "default_papers")]
    pub default_papers: u32,

    /// Conversation turns before the team stops.
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            default_papers: default_papers(),
            max_turns: default_max_turns(),
        }
    }
}

fn default_papers() -> u32 {
    DEFAULT_PAPERS
}

fn default_max_turns() -> usize {
    2
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.review.default_papers = clamp_papers(config.review.default_papers);

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.litrev.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(provider) = args.provider {
            self.model.provider = provider;
        }
        if let Some(ref base_url) = args.model_url {
            self.model.base_url = Some(base_url.clone());
        }
        if let Some(ref bind) = args.bind {
            self.server.bind = bind.clone();
        }
        if let Some(papers) = args.papers {
            self.review.default_papers = clamp_papers(papers);
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
