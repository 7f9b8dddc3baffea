//! Remote file store port interface

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

/// Remote store errors
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    #[error("Not signed in to the remote store")]
    NoToken,

    #[error("Remote authorization rejected")]
    Unauthorized,

    #[error("Remote request failed: {0}")]
    RequestFailed(String),

    #[error("Remote API error: HTTP {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse remote response: {0}")]
    ParseError(String),
}

/// Opaque identifier of a file on the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileId(pub String);

impl fmt::Display for RemoteFileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Port for the cloud-drive file store.
///
/// At most one remote file should exist per logical name; callers cache
/// resolved ids to avoid repeated lookups.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Find a non-trashed remote file by name.
    async fn find_file(&self, name: &str) -> Result<Option<RemoteFileId>, RemoteError>;

    /// Create an empty plain-text file and return its id.
    async fn create_file(&self, name: &str) -> Result<RemoteFileId, RemoteError>;

    /// Download the file's full content.
    async fn download(&self, id: &RemoteFileId) -> Result<String, RemoteError>;

    /// Replace the file's content in place.
    async fn upload(&self, id: &RemoteFileId, content: &str) -> Result<(), RemoteError>;
}

/// Port for obtaining a bearer token for the remote store.
///
/// The sign-in flow itself is an external collaborator; this only hands
/// out whatever credential it produced.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self) -> Result<String, RemoteError>;
}
