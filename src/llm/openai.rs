use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{check_status, http_client, transport_error};
use super::{ChatMessage, ModelClient, ModelReply, ModelRequest, Role, ToolCall};
use crate::agent::tools::ToolDefinition;
use crate::error::{LitrevError, Result};

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [ToolDefinition],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct OpenAiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAiToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct OpenAiToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: OpenAiFunction,
}

/// OpenAI carries tool arguments as a JSON-encoded string.
#[derive(Serialize, Deserialize, Debug, Clone)]
struct OpenAiFunction {
    name: String,
    arguments: String,
}

fn no_tools(tools: &&[ToolDefinition]) -> bool {
    tools.is_empty()
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

/// Client for OpenAI-compatible chat completion APIs.
pub struct OpenAiClient {
    base_url: String,
    model: String,
    api_key: String,
    http_client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: String,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            http_client: http_client(timeout)?,
        })
    }

    fn convert_message(message: &ChatMessage) -> OpenAiMessage {
        let tool_calls = (!message.tool_calls.is_empty()).then(|| {
            message
                .tool_calls
                .iter()
                .map(|call| OpenAiToolCall {
                    id: call.id.clone(),
                    call_type: function_type(),
                    function: OpenAiFunction {
                        name: call.name.clone(),
                        arguments: call.arguments.to_string(),
                    },
                })
                .collect()
        });

        // An assistant turn that only calls tools has null content
        let content = if tool_calls.is_some() && message.content.is_empty() {
            None
        } else {
            Some(message.content.clone())
        };

        OpenAiMessage {
            role: message.role.as_str().to_string(),
            content,
            name: match message.role {
                Role::User => message.name.clone(),
                _ => None,
            },
            tool_calls,
            tool_call_id: message.tool_call_id.clone(),
        }
    }

    fn build_request_body<'a>(&'a self, request: &'a ModelRequest) -> OpenAiRequest<'a> {
        OpenAiRequest {
            model: &self.model,
            messages: request.messages.iter().map(Self::convert_message).collect(),
            tools: &request.tools,
            temperature: request.temperature,
        }
    }

    fn convert_reply(message: OpenAiMessage) -> ModelReply {
        let tool_calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCall {
                id: call.id,
                name: call.function.name,
                // Unparseable arguments are passed through for the tool to reject
                arguments: serde_json::from_str(&call.function.arguments)
                    .unwrap_or(Value::String(call.function.arguments)),
            })
            .collect();

        ModelReply {
            content: message.content.unwrap_or_default(),
            tool_calls,
        }
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn complete(&self, request: ModelRequest) -> Result<ModelReply> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_request_body(&request);

        debug!(
            "Sending chat request with {} messages and {} tools",
            body.messages.len(),
            body.tools.len()
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, &self.base_url))?;

        let response: OpenAiResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| {
                LitrevError::MalformedResponse(format!("Failed to parse OpenAI response: {}", e))
            })?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(LitrevError::EmptyReply)?;

        Ok(Self::convert_reply(choice.message))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
