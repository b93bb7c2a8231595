//! Tool definitions for the retriever agent.
//!
//! This module defines the tools that the LLM can call and the executor
//! that runs them against the paper search backend.

use crate::error::Result;
use crate::llm::ToolCall;
use crate::search::PaperSearch;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Name under which the paper search is offered to the model.
pub const ARXIV_SEARCH: &str = "arxiv_search";

/// Tool definition in the function-calling format shared by OpenAI and Ollama.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Result of executing a tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(output: String) -> Self {
        Self {
            success: true,
            output,
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(message),
        }
    }

    /// Text handed back to the model as the tool message.
    pub fn into_content(self) -> String {
        if self.success {
            self.output
        } else {
            format!("Error: {}", self.error.unwrap_or_default())
        }
    }
}

/// Runs tool calls made by the model.
pub struct ToolExecutor {
    search: Arc<dyn PaperSearch>,
    /// Result count when the model leaves `max_results` out.
    default_max_results: u32,
}

impl ToolExecutor {
    pub fn new(search: Arc<dyn PaperSearch>, default_max_results: u32) -> Self {
        Self {
            search,
            default_max_results: default_max_results.max(1),
        }
    }

    /// Tools this executor can run.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        vec![arxiv_search_definition()]
    }

    /// Execute a tool call.
    ///
    /// Bad arguments and unknown tools come back as an error result for the
    /// model to read. A failing search is returned as `Err` and ends the run.
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        debug!("Executing tool: {} with args: {:?}", call.name, call.arguments);

        match call.name.as_str() {
            ARXIV_SEARCH => self.arxiv_search(&call.arguments).await,
            _ => Ok(ToolResult::error(format!("Unknown tool: {}", call.name))),
        }
    }

    async fn arxiv_search(&self, args: &Value) -> Result<ToolResult> {
        let query = match args.get("query").and_then(|v| v.as_str()) {
            Some(q) if !q.trim().is_empty() => q.trim(),
            _ => {
                return Ok(ToolResult::error(
                    "Missing required parameter: query".to_string(),
                ))
            }
        };

        let max_results = match parse_max_results(args.get("max_results")) {
            Ok(n) => n.unwrap_or(self.default_max_results),
            Err(message) => return Ok(ToolResult::error(message)),
        };

        let papers = self.search.search(query, max_results).await?;
        info!("Tool {} returned {} papers", ARXIV_SEARCH, papers.len());

        Ok(ToolResult::success(serde_json::to_string(&papers)?))
    }
}

/// Read `max_results`, accepting integers and numeric strings.
fn parse_max_results(value: Option<&Value>) -> std::result::Result<Option<u32>, String> {
    let n = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        Some(_) => None,
    };

    match n {
        Some(n) if n >= 1 => Ok(Some(u32::try_from(n).unwrap_or(u32::MAX))),
        _ => Err("max_results must be a positive integer".to_string()),
    }
}

/// Definition of the `arxiv_search` tool.
pub fn arxiv_search_definition() -> ToolDefinition {
    ToolDefinition {
        tool_type: "function".to_string(),
        function: FunctionDefinition {
            name: ARXIV_SEARCH.to_string(),
            description: "Searches arXiv and returns up to max_results papers. Each paper includes: title, authors, published date, abstract, and PDF link.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "arXiv search query"
                    },
                    "max_results": {
                        "type": "integer",
                        "description": "Maximum number of papers to return (default: 5)"
                    }
                },
                "required": ["query"]
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LitrevError;
    use crate::testing::{sample_papers, RecordingSearch};

    fn call(arguments: Value) -> ToolCall {
        ToolCall {
            id: "call_1".to_string(),
            name: ARXIV_SEARCH.to_string(),
            arguments,
        }
    }

    #[tokio::test]
    async fn test_arxiv_search_returns_paper_json() {
        let search = Arc::new(RecordingSearch::new(sample_papers(7)));
        let executor = ToolExecutor::new(search.clone(), 5);

        let result = executor
            .execute(&call(json!({"query": "graph neural networks", "max_results": 15})))
            .await
            .unwrap();

        assert!(result.success);
        let papers: Vec<Value> = serde_json::from_str(&result.output).unwrap();
        assert_eq!(papers.len(), 7);
        assert!(papers[0]["title"].is_string());
        assert!(papers[0]["pdf_url"].is_string());
        assert_eq!(search.calls(), vec![("graph neural networks".to_string(), 15)]);
    }

    #[tokio::test]
    async fn test_arxiv_search_default_max_results() {
        let search = Arc::new(RecordingSearch::new(sample_papers(2)));
        let executor = ToolExecutor::new(search.clone(), 5);

        executor.execute(&call(json!({"query": "gnn"}))).await.unwrap();
        executor
            .execute(&call(json!({"query": "gnn", "max_results": "8"})))
            .await
            .unwrap();

        assert_eq!(
            search.calls(),
            vec![("gnn".to_string(), 5), ("gnn".to_string(), 8)]
        );
    }

    #[tokio::test]
    async fn test_bad_arguments_are_tool_errors() {
        let search = Arc::new(RecordingSearch::new(sample_papers(2)));
        let executor = ToolExecutor::new(search.clone(), 5);

        let missing = executor.execute(&call(json!({}))).await.unwrap();
        assert!(!missing.success);
        assert_eq!(
            missing.into_content(),
            "Error: Missing required parameter: query"
        );

        let zero = executor
            .execute(&call(json!({"query": "gnn", "max_results": 0})))
            .await
            .unwrap();
        assert!(!zero.success);

        let garbled = executor
            .execute(&call(Value::String("{not json".to_string())))
            .await
            .unwrap();
        assert!(!garbled.success);

        assert!(search.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let executor = ToolExecutor::new(Arc::new(RecordingSearch::new(vec![])), 5);
        let result = executor
            .execute(&ToolCall {
                id: "call_1".to_string(),
                name: "read_file".to_string(),
                arguments: json!({}),
            })
            .await
            .unwrap();
        assert_eq!(result.into_content(), "Error: Unknown tool: read_file");
    }

    #[tokio::test]
    async fn test_search_failure_propagates() {
        let executor = ToolExecutor::new(Arc::new(RecordingSearch::failing()), 5);
        let err = executor
            .execute(&call(json!({"query": "gnn"})))
            .await
            .unwrap_err();
        assert!(matches!(err, LitrevError::Search(_)));
    }

    #[test]
    fn test_tool_definitions() {
        let executor = ToolExecutor::new(Arc::new(RecordingSearch::new(vec![])), 5);
        let tools = executor.definitions();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].function.name, "arxiv_search");
        assert_eq!(tools[0].function.parameters["required"][0], "query");
    }
}
