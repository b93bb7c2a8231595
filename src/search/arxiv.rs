//! arXiv search backend.
//!
//! Queries the public arXiv API, which answers with an Atom feed, and
//! reshapes each entry into a [`Paper`].

use crate::error::{LitrevError, Result};
use crate::models::Paper;
use crate::search::PaperSearch;
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Atom feed as returned by `export.arxiv.org/api/query`.
#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    id: String,
    title: String,
    summary: String,
    #[serde(default)]
    published: Option<String>,
    #[serde(rename = "author", default)]
    authors: Vec<Author>,
    #[serde(rename = "link", default)]
    links: Vec<Link>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Link {
    #[serde(rename = "@href")]
    href: String,
    #[serde(rename = "@title", default)]
    title: Option<String>,
}

/// Client for the arXiv query API.
pub struct ArxivClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl ArxivClient {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| LitrevError::Search(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into(),
            http_client,
        })
    }

    async fn fetch_feed(&self, query: &str, max_results: u32) -> Result<String> {
        let max_results = max_results.to_string();
        let params = [
            ("search_query", query),
            ("start", "0"),
            ("max_results", max_results.as_str()),
            ("sortBy", "relevance"),
            ("sortOrder", "descending"),
        ];

        debug!("GET {} with {:?}", self.base_url, params);

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LitrevError::Search("arXiv request timed out".to_string())
                } else if e.is_connect() {
                    LitrevError::Search(format!("Cannot connect to arXiv at {}", self.base_url))
                } else {
                    LitrevError::Search(format!("Failed to send request: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LitrevError::Search(format!(
                "arXiv API error {}: {}",
                status, body
            )));
        }

        response
            .text()
            .await
            .map_err(|e| LitrevError::Search(format!("Failed to read arXiv response: {}", e)))
    }
}

#[async_trait]
impl PaperSearch for ArxivClient {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<Paper>> {
        if max_results == 0 {
            return Err(LitrevError::InvalidArgument(
                "max_results must be at least 1".to_string(),
            ));
        }

        info!("Searching arXiv for \"{}\" (max {})", query, max_results);

        let body = self.fetch_feed(query, max_results).await?;
        let mut papers = parse_feed(&body)?;
        papers.truncate(max_results as usize);

        info!("arXiv returned {} papers", papers.len());
        Ok(papers)
    }
}

/// Parse an arXiv Atom feed into papers, keeping feed order.
fn parse_feed(xml: &str) -> Result<Vec<Paper>> {
    let feed: Feed = quick_xml::de::from_str(xml)
        .map_err(|e| LitrevError::MalformedResponse(format!("Invalid arXiv feed: {}", e)))?;

    // arXiv reports query errors as a single entry under /api/errors
    if let Some(error) = feed.entries.iter().find(|e| e.id.contains("/api/errors")) {
        return Err(LitrevError::Search(format!(
            "arXiv rejected the query: {}",
            error.summary.trim()
        )));
    }

    feed.entries.into_iter().map(entry_to_paper).collect()
}

fn entry_to_paper(entry: Entry) -> Result<Paper> {
    let published = entry.published.as_deref().ok_or_else(|| {
        LitrevError::MalformedResponse(format!("Entry {} has no published date", entry.id))
    })?;
    let published = DateTime::parse_from_rfc3339(published.trim())
        .map_err(|e| {
            LitrevError::MalformedResponse(format!(
                "Entry {} has invalid published date {:?}: {}",
                entry.id, published, e
            ))
        })?
        .date_naive();

    let pdf_url = entry
        .links
        .iter()
        .find(|link| link.title.as_deref() == Some("pdf"))
        .map(|link| link.href.clone())
        .unwrap_or_else(|| entry.id.trim().replacen("/abs/", "/pdf/", 1));

    Ok(Paper {
        title: collapse_whitespace(&entry.title),
        authors: entry
            .authors
            .into_iter()
            .map(|a| collapse_whitespace(&a.name))
            .collect(),
        published,
        summary: entry.summary.trim().to_string(),
        pdf_url,
    })
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
