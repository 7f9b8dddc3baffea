//! Summarization port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::record::Summary;

/// Summarization errors
#[derive(Debug, Clone, Error)]
pub enum SummarizeError {
    #[error("Missing API key")]
    MissingApiKey,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Server error: HTTP {0}")]
    ServerError(u16),

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("API error: {0}")]
    ApiError(String),
}

impl SummarizeError {
    /// Whether the owning task should be retried rather than failed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::ServerError(_) | Self::RequestFailed(_)
        )
    }
}

/// Port for transcript summarization
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize a transcript into a short title and a body.
    async fn summarize(&self, transcript: &str) -> Result<Summary, SummarizeError>;
}
