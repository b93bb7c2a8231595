//! Chat model clients.
//!
//! Agents talk to the hosted model through [`ModelClient`]. Two providers are
//! supported: OpenAI-compatible `/chat/completions` and Ollama `/api/chat`.
//! Both support function tools, which the retriever needs for paper search.

pub mod ollama;
pub mod openai;

use crate::agent::tools::ToolDefinition;
use crate::config::{ModelConfig, Provider};
use crate::error::{LitrevError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// Message in the chat history sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Speaker name for user messages relayed from other participants.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::plain(Role::User, content)
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    pub fn assistant_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::plain(Role::Assistant, content)
        }
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::plain(Role::Tool, content)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModelRequest {
    pub messages: Vec<ChatMessage>,
    /// Tools offered for this call. Empty means plain completion.
    pub tools: Vec<ToolDefinition>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, request: ModelRequest) -> Result<ModelReply>;
    fn model_name(&self) -> &str;
}

/// Build the configured client, reading the API key from the environment.
pub fn build_client(config: &ModelConfig) -> Result<Arc<dyn ModelClient>> {
    let api_key = std::env::var(&config.api_key_env)
        .ok()
        .filter(|key| !key.trim().is_empty());
    build_client_with_key(config, api_key)
}

/// Build the configured client with an already-resolved API key.
pub fn build_client_with_key(
    config: &ModelConfig,
    api_key: Option<String>,
) -> Result<Arc<dyn ModelClient>> {
    let base_url = config.effective_base_url();
    let timeout = config.timeout_seconds.map(Duration::from_secs);

    info!(
        "Using {} model {} at {}",
        config.provider, config.name, base_url
    );

    let client: Arc<dyn ModelClient> = match config.provider {
        Provider::Openai => {
            let api_key = api_key
                .ok_or_else(|| LitrevError::MissingCredential(config.api_key_env.clone()))?;
            Arc::new(OpenAiClient::new(
                base_url,
                config.name.clone(),
                api_key,
                timeout,
            )?)
        }
        Provider::Ollama => Arc::new(OllamaClient::new(base_url, config.name.clone(), timeout)?),
    };

    Ok(client)
}

fn http_client(timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| LitrevError::ModelTransport(format!("Failed to create HTTP client: {}", e)))
}

fn transport_error(e: reqwest::Error, base_url: &str) -> LitrevError {
    if e.is_timeout() {
        LitrevError::ModelTransport("Request timed out".to_string())
    } else if e.is_connect() {
        LitrevError::ModelTransport(format!("Cannot connect to model API at {}", base_url))
    } else {
        LitrevError::ModelTransport(format!("Failed to send request: {}", e))
    }
}

/// Turn a non-2xx response into a model error carrying the body.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(LitrevError::Model { status, body })
}
