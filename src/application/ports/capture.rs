//! Audio capture port interface

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

/// Capture errors
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("No audio input device available")]
    NoAudioDevice,

    #[error("Failed to start capture: {0}")]
    StartFailed(String),

    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    #[error("Failed to write segment file: {0}")]
    WriteFailed(String),
}

/// Result of one completed capture.
#[derive(Debug, Clone, Copy)]
pub struct CaptureStats {
    /// Wall-clock time actually spent recording
    pub elapsed: Duration,
}

/// Port for recording one audio segment to a file.
#[async_trait]
pub trait AudioCapture: Send + Sync {
    /// Record mono audio into `path` until `limit` elapses or `stop`
    /// flips to true, whichever comes first. The segment file is fully
    /// written when this returns.
    async fn capture(
        &self,
        path: &Path,
        limit: Duration,
        stop: watch::Receiver<bool>,
    ) -> Result<CaptureStats, CaptureError>;
}
