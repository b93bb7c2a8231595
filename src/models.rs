//! Data models for the literature review assistant.
//!
//! This module contains the transient, per-request structures that flow
//! between the retriever, the writer, and the presentation layer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source label used for the task frame that opens every conversation.
pub const USER_SOURCE: &str = "user";

/// Smallest number of papers a review may ask for.
pub const MIN_PAPERS: u32 = 1;

/// Largest number of papers a review may ask for.
pub const MAX_PAPERS: u32 = 10;

/// Paper count used when the caller does not pick one.
pub const DEFAULT_PAPERS: u32 = 5;

/// A paper returned by the bibliographic search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    /// Title with line-wrapping whitespace collapsed.
    pub title: String,
    /// Author names in publication order.
    pub authors: Vec<String>,
    /// Date of the first published version, serialized as `YYYY-MM-DD`.
    pub published: NaiveDate,
    /// The abstract.
    pub summary: String,
    /// Link to the PDF.
    pub pdf_url: String,
}

/// One rendered transcript line: who spoke and what they said.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub source: String,
    pub content: String,
}

impl Frame {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
        }
    }

    /// The frame that opens a conversation with the user's task.
    pub fn task(content: impl Into<String>) -> Self {
        Self::new(USER_SOURCE, content)
    }

    pub fn is_from(&self, source: &str) -> bool {
        self.source == source
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.content)
    }
}

/// A validated review request: non-empty topic, paper count in range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewRequest {
    topic: String,
    num_papers: u32,
}

impl ReviewRequest {
    /// Build a request, returning `None` for a blank topic.
    ///
    /// The paper count is clamped into `MIN_PAPERS..=MAX_PAPERS` the same way
    /// the slider on the form bounds it.
    pub fn new(topic: &str, num_papers: u32) -> Option<Self> {
        let topic = topic.trim();
        if topic.is_empty() {
            return None;
        }

        Some(Self {
            topic: topic.to_string(),
            num_papers: clamp_papers(num_papers),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn num_papers(&self) -> u32 {
        self.num_papers
    }

    /// The task handed to the team as its opening message.
    pub fn task_prompt(&self) -> String {
        format!(
            "Conduct a literature review on **{}** and return exactly {} papers.",
            self.topic, self.num_papers
        )
    }
}

/// Clamp a requested paper count into the supported range.
pub fn clamp_papers(n: u32) -> u32 {
    n.clamp(MIN_PAPERS, MAX_PAPERS)
}
