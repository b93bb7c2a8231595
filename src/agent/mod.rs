//! Review agents.
//!
//! This module provides the assistant agent, its tool surface and the
//! instructions for the two review participants.

pub mod assistant;
pub mod prompts;
pub mod tools;

pub use assistant::{AgentAction, AssistantAgent};
pub use tools::ToolExecutor;
