//! Test doubles shared by the unit tests.

use crate::error::{LitrevError, Result};
use crate::llm::{ModelClient, ModelReply, ModelRequest, ToolCall};
use crate::models::Paper;
use crate::search::PaperSearch;
use async_trait::async_trait;
use axum::Router;
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Serve `router` on a random loopback port and return its base URL.
pub async fn serve_router(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}", addr)
}

/// `n` distinct papers with plausible fields.
pub fn sample_papers(n: usize) -> Vec<Paper> {
    (1..=n)
        .map(|i| Paper {
            title: format!("Graph Paper {}", i),
            authors: vec![format!("Author {}", i), "Co Author".to_string()],
            published: NaiveDate::from_ymd_opt(2020, 1, i.clamp(1, 28) as u32).unwrap(),
            summary: format!("Abstract of paper {}.", i),
            pdf_url: format!("http://arxiv.org/pdf/2001.{:05}v1", i),
        })
        .collect()
}

/// In-memory search that records every call.
pub struct RecordingSearch {
    papers: Vec<Paper>,
    fail: bool,
    calls: Mutex<Vec<(String, u32)>>,
}

impl RecordingSearch {
    pub fn new(papers: Vec<Paper>) -> Self {
        Self {
            papers,
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaperSearch for RecordingSearch {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<Paper>> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), max_results));

        if self.fail {
            return Err(LitrevError::Search("connection refused".to_string()));
        }

        Ok(self
            .papers
            .iter()
            .take(max_results as usize)
            .cloned()
            .collect())
    }
}

/// Model that replays scripted replies in order and records each request.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<ModelReply>>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Result<ModelReply>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn complete(&self, request: ModelRequest) -> Result<ModelReply> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LitrevError::ModelTransport("script exhausted".to_string())))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Model that takes `delay` per call and tracks how many calls overlap.
pub struct SlowModel {
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl SlowModel {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelClient for SlowModel {
    async fn complete(&self, _request: ModelRequest) -> Result<ModelReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        text_reply("slow reply")
    }

    fn model_name(&self) -> &str {
        "slow"
    }
}

pub fn text_reply(content: &str) -> Result<ModelReply> {
    Ok(ModelReply {
        content: content.to_string(),
        tool_calls: Vec::new(),
    })
}

pub fn tool_reply(name: &str, arguments: Value) -> Result<ModelReply> {
    Ok(ModelReply {
        content: String::new(),
        tool_calls: vec![ToolCall {
            id: "call_1".to_string(),
            name: name.to_string(),
            arguments,
        }],
    })
}
