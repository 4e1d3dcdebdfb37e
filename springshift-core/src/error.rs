//! Error types for springshift-core

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the springshift-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// LLM transport error
    #[error("LLM error: {0}")]
    Llm(String),

    /// The LLM answered, but not with a usable record
    #[error("malformed LLM response: {0}")]
    MalformedResponse(String),

    /// Source root missing or unreadable
    #[error("cannot walk {}: {message}", path.display())]
    Discovery { path: PathBuf, message: String },
}

/// Result type alias for springshift-core
pub type Result<T> = std::result::Result<T, Error>;
