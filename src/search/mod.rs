//! Bibliographic search.
//!
//! The retriever agent reaches papers only through [`PaperSearch`], so the
//! pipeline can be pointed at a different backend (or a test double) without
//! touching the agents.

pub mod arxiv;

use crate::error::Result;
use crate::models::Paper;
use async_trait::async_trait;

pub use arxiv::ArxivClient;

#[async_trait]
pub trait PaperSearch: Send + Sync {
    /// Return up to `max_results` papers for `query`, best match first.
    ///
    /// Every call goes to the backend; nothing is cached.
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<Paper>>;
}
