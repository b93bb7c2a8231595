//! Presentation surfaces: the web form and the terminal.

pub mod terminal;
pub mod web;

use crate::models::{ReviewRequest, DEFAULT_PAPERS};
use serde::Deserialize;

/// Values collected from the user before a review starts.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub topic: String,
    #[serde(default = "default_num_papers")]
    pub num_papers: u32,
}

fn default_num_papers() -> u32 {
    DEFAULT_PAPERS
}

impl ReviewForm {
    /// Turn the form into a request. A blank topic submits nothing.
    pub fn submit(&self) -> Option<ReviewRequest> {
        ReviewRequest::new(&self.topic, self.num_papers)
    }
}
