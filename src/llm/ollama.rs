//! Ollama chat client.
//!
//! Ollama's `/api/chat` takes tool arguments as JSON objects and does not
//! assign ids to tool calls, so ids are synthesized per reply.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{check_status, http_client, transport_error};
use super::{ChatMessage, ModelClient, ModelReply, ModelRequest, ToolCall};
use crate::agent::tools::ToolDefinition;
use crate::error::{LitrevError, Result};

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<&'a ToolDefinition>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OllamaToolCall>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaFunction {
    name: String,
    arguments: Value,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

/// Client for a local or remote Ollama server.
pub struct OllamaClient {
    base_url: String,
    model: String,
    http_client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            http_client: http_client(timeout)?,
        })
    }

    fn convert_message(message: &ChatMessage) -> OllamaMessage {
        let tool_calls = (!message.tool_calls.is_empty()).then(|| {
            message
                .tool_calls
                .iter()
                .map(|call| OllamaToolCall {
                    function: OllamaFunction {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                })
                .collect()
        });

        OllamaMessage {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
            tool_calls,
        }
    }

    fn build_request_body<'a>(&'a self, request: &'a ModelRequest) -> OllamaChatRequest<'a> {
        OllamaChatRequest {
            model: &self.model,
            messages: request.messages.iter().map(Self::convert_message).collect(),
            tools: request.tools.iter().collect(),
            stream: false,
            options: request
                .temperature
                .map(|temperature| OllamaOptions { temperature }),
        }
    }

    fn convert_reply(message: OllamaMessage) -> ModelReply {
        let tool_calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, call)| ToolCall {
                id: format!("call_{}", i),
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        ModelReply {
            content: message.content,
            tool_calls,
        }
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    async fn complete(&self, request: ModelRequest) -> Result<ModelReply> {
        let url = format!("{}/api/chat", self.base_url);
        let body = self.build_request_body(&request);

        debug!("Sending chat request with {} messages", body.messages.len());

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, &self.base_url))?;

        let chat_response: OllamaChatResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| {
                LitrevError::MalformedResponse(format!("Failed to parse Ollama response: {}", e))
            })?;

        Ok(Self::convert_reply(chat_response.message))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tools::arxiv_search_definition;
    use crate::testing::serve_router;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    #[test]
    fn test_request_body_format() {
        let client = OllamaClient::new("http://localhost:11434/", "llama3.2:latest", None).unwrap();
        let request = ModelRequest {
            messages: vec![
                ChatMessage::system("Find papers."),
                ChatMessage::user("GNNs", "user"),
            ],
            tools: vec![arxiv_search_definition()],
            temperature: None,
        };

        let json = serde_json::to_value(client.build_request_body(&request)).unwrap();
        assert_eq!(json["model"], "llama3.2:latest");
        assert_eq!(json["stream"], false);
        assert!(json.get("options").is_none());
        assert_eq!(json["tools"][0]["function"]["name"], "arxiv_search");
        assert_eq!(json["messages"][1]["role"], "user");
        assert!(json["messages"][1].get("name").is_none());
        assert_eq!(client.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_reply_synthesizes_call_ids() {
        let message: OllamaMessage = serde_json::from_value(json!({
            "role": "assistant",
            "content": "",
            "tool_calls": [
                {"function": {"name": "arxiv_search", "arguments": {"query": "gnn"}}},
                {"function": {"name": "arxiv_search", "arguments": {"query": "gcn"}}}
            ]
        }))
        .unwrap();

        let reply = OllamaClient::convert_reply(message);
        assert_eq!(reply.tool_calls.len(), 2);
        assert_eq!(reply.tool_calls[0].id, "call_0");
        assert_eq!(reply.tool_calls[1].id, "call_1");
        assert_eq!(reply.tool_calls[1].arguments["query"], "gcn");
    }

    #[tokio::test]
    async fn test_complete_against_server() {
        async fn handler(Json(body): Json<Value>) -> Json<Value> {
            assert_eq!(body["options"]["temperature"], 0.25);
            Json(json!({
                "model": "llama3.2:latest",
                "message": {"role": "assistant", "content": "A short review."},
                "done": true
            }))
        }

        let base = serve_router(Router::new().route("/api/chat", post(handler))).await;
        let client = OllamaClient::new(base, "llama3.2:latest", None).unwrap();

        let reply = client
            .complete(ModelRequest {
                messages: vec![ChatMessage::user("Hello", "user")],
                tools: vec![],
                temperature: Some(0.25),
            })
            .await
            .unwrap();

        assert_eq!(reply.content, "A short review.");
        assert!(reply.tool_calls.is_empty());
    }
}
