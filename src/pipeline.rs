//! The literature review pipeline.
//!
//! Wires the retriever and writer agents into a two-turn team and runs a
//! validated request through it.

use crate::agent::prompts::{
    search_agent_prompt, SEARCH_AGENT_DESCRIPTION, SEARCH_AGENT_NAME, SUMMARIZER_AGENT_DESCRIPTION,
    SUMMARIZER_AGENT_NAME, SUMMARIZER_PROMPT,
};
use crate::agent::{AssistantAgent, ToolExecutor};
use crate::config::Config;
use crate::error::Result;
use crate::llm::ModelClient;
use crate::models::{Frame, Paper, ReviewRequest};
use crate::search::PaperSearch;
use crate::team::RoundRobinTeam;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tracing::{info, warn};

/// Build the retriever/writer team from configuration.
pub fn build_team(
    config: &Config,
    model: Arc<dyn ModelClient>,
    search: Arc<dyn PaperSearch>,
) -> Result<RoundRobinTeam> {
    let temperature = config.model.temperature;

    let retriever = AssistantAgent::new(
        SEARCH_AGENT_NAME,
        SEARCH_AGENT_DESCRIPTION,
        search_agent_prompt(config.search.over_fetch_factor),
        model.clone(),
    )?
    .with_tools(ToolExecutor::new(
        search,
        config.search.default_max_results,
    ))
    .reflect_on_tool_use(true)
    .with_temperature(temperature);

    let writer = AssistantAgent::new(
        SUMMARIZER_AGENT_NAME,
        SUMMARIZER_AGENT_DESCRIPTION,
        SUMMARIZER_PROMPT,
        model,
    )?
    .with_temperature(temperature);

    RoundRobinTeam::new(
        vec![Arc::new(retriever), Arc::new(writer)],
        config.review.max_turns,
    )
}

/// Run one review and stream its frames.
///
/// The writer's output is not validated, but a bullet count that differs
/// from the requested paper count is logged.
pub fn run_review(
    team: &RoundRobinTeam,
    request: &ReviewRequest,
) -> impl Stream<Item = Result<Frame>> + Send + 'static {
    run_review_holding(team, request, ())
}

/// Run one review, keeping `held` alive until the conversation finishes
/// even if the returned stream is dropped early.
pub fn run_review_holding<H>(
    team: &RoundRobinTeam,
    request: &ReviewRequest,
    held: H,
) -> impl Stream<Item = Result<Frame>> + Send + 'static
where
    H: Send + 'static,
{
    info!(
        "Starting review of '{}' with {} papers",
        request.topic(),
        request.num_papers()
    );

    let expected = request.num_papers() as usize;
    team.run_stream_holding(request.task_prompt(), held).inspect(move |item| {
        if let Ok(frame) = item {
            if frame.is_from(SUMMARIZER_AGENT_NAME) {
                let found = count_bullets(&frame.content);
                if found != expected {
                    warn!(
                        "Review lists {} papers but {} were requested",
                        found, expected
                    );
                }
            }
        }
    })
}

/// Search only, with the count the retriever is told to fetch.
pub async fn dry_run(
    config: &Config,
    search: &dyn PaperSearch,
    request: &ReviewRequest,
) -> Result<Vec<Paper>> {
    let max_results = request
        .num_papers()
        .saturating_mul(config.search.over_fetch_factor.max(1));
    info!(
        "Dry run: searching '{}' for {} candidates",
        request.topic(),
        max_results
    );
    search.search(request.topic(), max_results).await
}

/// Count top-level Markdown list items.
///
/// Indented sub-bullets (authors, contribution, ...) do not count.
pub fn count_bullets(markdown: &str) -> usize {
    markdown
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            let indent = line.len() - trimmed.len();
            indent < 2 && is_list_item(trimmed)
        })
        .count()
}

fn is_list_item(line: &str) -> bool {
    if ["- ", "* ", "+ "].iter().any(|m| line.starts_with(m)) {
        return true;
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && line[digits..].starts_with(". ")
}
