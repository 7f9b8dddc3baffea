//! Transcription port interface

use async_trait::async_trait;
use thiserror::Error;

/// Transcription errors
#[derive(Debug, Clone, Error)]
pub enum TranscribeError {
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

impl TranscribeError {
    /// Whether the owning task should be retried rather than failed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::ServerError(_) | Self::RequestFailed(_)
        )
    }
}

/// Port for audio transcription
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one audio segment to text.
    ///
    /// # Arguments
    /// * `audio` - Encoded audio bytes
    /// * `file_name` - Original segment file name, forwarded to the service
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str)
        -> Result<String, TranscribeError>;
}
