use std::path::PathBuf;
use thiserror::Error;

/// Failure taxonomy shared by every stage of the helpdesk pipeline.
///
/// Only `Validation` and `ArtifactMismatch` are meant to reach a caller as-is;
/// retrieval and generative failures are recovered inside the routing engine.
#[derive(Debug, Error)]
pub enum HelpdeskError {
    #[error("{0}")]
    Validation(String),

    #[error("classifier artifact mismatch: {0}")]
    ArtifactMismatch(String),

    #[error("feature vector has length {actual}, classifier expects {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("source document not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    #[error("generative service failure: {0}")]
    GenerativeServiceFailure(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl HelpdeskError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True when the caller sent something unusable (4xx class).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::InvalidArgument(_))
    }

    /// Text safe to put in an outward error body.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::InvalidArgument(msg) => format!("Invalid request: {}", msg),
            _ => "Internal server error".to_string(),
        }
    }
}

pub type Result<T, E = HelpdeskError> = std::result::Result<T, E>;
