//! Assistant agent: one participant in the review conversation.
//!
//! A turn is a short loop: the model either answers with text, which becomes
//! the turn's frame, or asks for tools. Tool results are fed back and the
//! agent then either reflects on them with a second model call or hands the
//! raw tool output on as its frame.

use crate::agent::tools::{ToolDefinition, ToolExecutor};
use crate::error::{LitrevError, Result};
use crate::llm::{ChatMessage, ModelClient, ModelReply, ModelRequest, ToolCall};
use crate::models::Frame;
use std::sync::Arc;
use tracing::{debug, info};

/// What the model decided to do with its reply.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentAction {
    /// Final text for this turn.
    EmitText(String),
    /// Run these tools, then continue the turn.
    InvokeTools {
        content: String,
        calls: Vec<ToolCall>,
    },
}

impl AgentAction {
    /// Classify a reply. Tool calls are ignored when the agent has no tools.
    pub fn from_reply(reply: ModelReply, tools_enabled: bool) -> Self {
        if tools_enabled && !reply.tool_calls.is_empty() {
            AgentAction::InvokeTools {
                content: reply.content,
                calls: reply.tool_calls,
            }
        } else {
            AgentAction::EmitText(reply.content)
        }
    }
}

/// An LLM-backed conversation participant.
pub struct AssistantAgent {
    name: String,
    description: String,
    system_message: String,
    model: Arc<dyn ModelClient>,
    tools: Option<ToolExecutor>,
    reflect_on_tool_use: bool,
    max_tool_iterations: usize,
    temperature: Option<f32>,
}

impl AssistantAgent {
    /// Create an agent without tools.
    ///
    /// The name labels every frame the agent produces and is sent to the
    /// model as a speaker name, so it must be a non-empty identifier.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        system_message: impl Into<String>,
        model: Arc<dyn ModelClient>,
    ) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;

        Ok(Self {
            name,
            description: description.into(),
            system_message: system_message.into(),
            model,
            tools: None,
            reflect_on_tool_use: false,
            max_tool_iterations: 1,
            temperature: None,
        })
    }

    pub fn with_tools(mut self, tools: ToolExecutor) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn reflect_on_tool_use(mut self, reflect: bool) -> Self {
        self.reflect_on_tool_use = reflect;
        self
    }

    pub fn with_max_tool_iterations(mut self, iterations: usize) -> Self {
        self.max_tool_iterations = iterations.max(1);
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .as_ref()
            .map(|t| t.definitions())
            .unwrap_or_default()
    }

    /// Chat history as this agent sees it.
    ///
    /// Its own frames are assistant messages; everyone else's are user
    /// messages tagged with the speaker.
    fn context(&self, transcript: &[Frame]) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(transcript.len() + 1);
        messages.push(ChatMessage::system(self.system_message.clone()));

        for frame in transcript {
            if frame.is_from(&self.name) {
                messages.push(ChatMessage::assistant(frame.content.clone()));
            } else {
                messages.push(ChatMessage::user(frame.content.clone(), frame.source.clone()));
            }
        }

        messages
    }

    /// Take one turn given the conversation so far.
    pub async fn on_turn(&self, transcript: &[Frame]) -> Result<Frame> {
        let mut messages = self.context(transcript);
        let tools = self.tool_definitions();
        let mut tool_outputs = Vec::new();

        for iteration in 0..self.max_tool_iterations {
            debug!("{} model call {}", self.name, iteration + 1);

            let reply = self
                .model
                .complete(ModelRequest {
                    messages: messages.clone(),
                    tools: tools.clone(),
                    temperature: self.temperature,
                })
                .await?;

            let (content, calls) = match AgentAction::from_reply(reply, self.tools.is_some()) {
                AgentAction::EmitText(text) => return Ok(Frame::new(&self.name, text)),
                AgentAction::InvokeTools { content, calls } => (content, calls),
            };

            // from_reply only yields InvokeTools when tools are configured
            let Some(executor) = self.tools.as_ref() else {
                break;
            };

            messages.push(ChatMessage::assistant_tool_calls(content, calls.clone()));
            for call in &calls {
                info!("{} calling tool {}", self.name, call.name);
                let output = executor.execute(call).await?.into_content();
                messages.push(ChatMessage::tool(call.id.clone(), output.clone()));
                tool_outputs.push(output);
            }
        }

        if self.reflect_on_tool_use {
            debug!("{} reflecting on tool results", self.name);
            let reply = self
                .model
                .complete(ModelRequest {
                    messages,
                    tools: Vec::new(),
                    temperature: self.temperature,
                })
                .await?;
            return Ok(Frame::new(&self.name, reply.content));
        }

        Ok(Frame::new(&self.name, tool_outputs.join("\n")))
    }
}

fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(LitrevError::InvalidArgument(format!(
            "Agent name must be a non-empty identifier, got {:?}",
            name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tools::ARXIV_SEARCH;
    use crate::llm::Role;
    use crate::testing::{sample_papers, text_reply, tool_reply, RecordingSearch, ScriptedModel};
    use serde_json::json;

    fn transcript() -> Vec<Frame> {
        vec![Frame::task("Conduct a literature review on **GNNs** and return exactly 2 papers.")]
    }

    fn retriever(model: Arc<ScriptedModel>, search: Arc<RecordingSearch>) -> AssistantAgent {
        AssistantAgent::new("search_agent", "finds papers", "Find papers.", model)
            .unwrap()
            .with_tools(ToolExecutor::new(search, 5))
    }

    #[test]
    fn test_action_classification() {
        let text = ModelReply {
            content: "hello".to_string(),
            tool_calls: vec![],
        };
        assert_eq!(
            AgentAction::from_reply(text, true),
            AgentAction::EmitText("hello".to_string())
        );

        let calls = tool_reply(ARXIV_SEARCH, json!({"query": "gnn"})).unwrap();
        assert!(matches!(
            AgentAction::from_reply(calls.clone(), true),
            AgentAction::InvokeTools { .. }
        ));
        assert_eq!(
            AgentAction::from_reply(calls, false),
            AgentAction::EmitText(String::new())
        );
    }

    #[test]
    fn test_name_validation() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        assert!(AssistantAgent::new("", "d", "s", model.clone()).is_err());
        assert!(AssistantAgent::new("search agent", "d", "s", model.clone()).is_err());
        assert!(AssistantAgent::new("search_agent", "d", "s", model).is_ok());
    }

    #[tokio::test]
    async fn test_text_turn() {
        let model = Arc::new(ScriptedModel::new(vec![text_reply("# Review")]));
        let agent =
            AssistantAgent::new("summarizer_agent", "writes", "Write.", model.clone()).unwrap();

        let frame = agent.on_turn(&transcript()).await.unwrap();
        assert_eq!(frame, Frame::new("summarizer_agent", "# Review"));

        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].tools.is_empty());
        assert_eq!(requests[0].messages[0].role, Role::System);
        assert_eq!(requests[0].messages[1].role, Role::User);
        assert_eq!(requests[0].messages[1].name.as_deref(), Some("user"));
    }

    #[tokio::test]
    async fn test_tool_turn_with_reflection() {
        let model = Arc::new(ScriptedModel::new(vec![
            tool_reply(ARXIV_SEARCH, json!({"query": "gnn", "max_results": 10})),
            text_reply("[{\"title\": \"Graph Paper 1\"}]"),
        ]));
        let search = Arc::new(RecordingSearch::new(sample_papers(10)));
        let agent = retriever(model.clone(), search.clone()).reflect_on_tool_use(true);

        let frame = agent.on_turn(&transcript()).await.unwrap();
        assert_eq!(frame.source, "search_agent");
        assert_eq!(frame.content, "[{\"title\": \"Graph Paper 1\"}]");
        assert_eq!(search.calls(), vec![("gnn".to_string(), 10)]);

        let requests = model.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tools.len(), 1);
        // reflection call offers no tools and sees the tool result
        assert!(requests[1].tools.is_empty());
        let last = requests[1].messages.last().unwrap();
        assert_eq!(last.role, Role::Tool);
        assert_eq!(last.tool_call_id.as_deref(), Some("call_1"));
        assert!(last.content.contains("Graph Paper 10"));
    }

    #[tokio::test]
    async fn test_tool_turn_without_reflection_forwards_output() {
        let model = Arc::new(ScriptedModel::new(vec![tool_reply(
            ARXIV_SEARCH,
            json!({"query": "gnn", "max_results": 2}),
        )]));
        let search = Arc::new(RecordingSearch::new(sample_papers(5)));
        let agent = retriever(model.clone(), search);

        let frame = agent.on_turn(&transcript()).await.unwrap();
        let papers: Vec<serde_json::Value> = serde_json::from_str(&frame.content).unwrap();
        assert_eq!(papers.len(), 2);
        assert_eq!(model.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_tool_error_is_fed_back() {
        let model = Arc::new(ScriptedModel::new(vec![
            tool_reply(ARXIV_SEARCH, json!({"max_results": 2})),
            text_reply("I could not search."),
        ]));
        let search = Arc::new(RecordingSearch::new(sample_papers(5)));
        let agent = retriever(model.clone(), search.clone()).reflect_on_tool_use(true);

        let frame = agent.on_turn(&transcript()).await.unwrap();
        assert_eq!(frame.content, "I could not search.");
        assert!(search.calls().is_empty());

        let tool_message = model.requests()[1].messages.last().unwrap().clone();
        assert!(tool_message.content.starts_with("Error:"));
    }

    #[tokio::test]
    async fn test_own_frames_are_assistant_messages() {
        let model = Arc::new(ScriptedModel::new(vec![text_reply("again")]));
        let agent = AssistantAgent::new("search_agent", "d", "s", model.clone()).unwrap();

        let mut history = transcript();
        history.push(Frame::new("search_agent", "earlier answer"));
        history.push(Frame::new("summarizer_agent", "a review"));
        agent.on_turn(&history).await.unwrap();

        let messages = &model.requests()[0].messages;
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[3].role, Role::User);
        assert_eq!(messages[3].name.as_deref(), Some("summarizer_agent"));
    }

    #[tokio::test]
    async fn test_empty_reply_yields_empty_frame() {
        let model = Arc::new(ScriptedModel::new(vec![text_reply("")]));
        let agent = AssistantAgent::new("summarizer_agent", "d", "s", model).unwrap();

        let frame = agent.on_turn(&transcript()).await.unwrap();
        assert_eq!(frame.source, "summarizer_agent");
        assert!(frame.content.is_empty());
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let model = Arc::new(ScriptedModel::new(vec![Err(LitrevError::Model {
            status: 500,
            body: "boom".to_string(),
        })]));
        let agent = AssistantAgent::new("summarizer_agent", "d", "s", model).unwrap();

        let err = agent.on_turn(&transcript()).await.unwrap_err();
        assert!(matches!(err, LitrevError::Model { status: 500, .. }));
    }
}
