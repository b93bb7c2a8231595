//! Error types for the review pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LitrevError {
    /// The paper search service could not be reached or answered with a failure.
    #[error("Search error: {0}")]
    Search(String),

    /// An external service answered with a body we could not interpret.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Model API error {status}: {body}")]
    Model { status: u16, body: String },

    #[error("Model request failed: {0}")]
    ModelTransport(String),

    #[error("Model returned no choices")]
    EmptyReply,

    #[error("Missing credential: environment variable {0} is not set")]
    MissingCredential(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LitrevError>;
