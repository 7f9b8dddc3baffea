//! Durable segment job queue
//!
//! At-least-once execution: the audio file on disk is the durable state,
//! so the queue can be re-hydrated after a crash from whatever segments
//! are still there. Each enqueued segment runs as its own independent
//! task; ordering across segments is not guaranteed. Transient failures
//! retry with exponential backoff; permanent failures (and exhausted
//! retries) quarantine the audio under `failed/` for operator recovery
//! instead of silently deleting it.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Job execution errors
#[derive(Debug, Clone, Error)]
pub enum JobError {
    /// Network or server-side failure; the whole task is retried
    #[error("transient failure: {0}")]
    Transient(String),

    /// Non-recoverable failure; the task fails without retry
    #[error("permanent failure: {0}")]
    Permanent(String),
}

/// One pending segment-processing unit. The path is the identity.
#[derive(Debug, Clone)]
pub struct Job {
    pub audio_path: PathBuf,
}

/// Handler invoked once per attempt.
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    async fn run(&self, job: &Job) -> Result<(), JobError>;
}

/// Retry policy for the queue.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_base: Duration::from_secs(1),
            backoff_cap: Duration::from_secs(60),
        }
    }
}

/// Handle for scheduling segment jobs.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<Job>,
}

impl JobQueue {
    /// Spawn the queue worker with the given handler.
    pub fn spawn<H: JobHandler>(handler: Arc<H>, config: QueueConfig) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let worker = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let handler = Arc::clone(&handler);
                let config = config.clone();
                tokio::spawn(async move {
                    run_job(handler, config, job).await;
                });
            }
        });
        (Self { tx }, worker)
    }

    /// Schedule one segment for processing.
    pub fn enqueue(&self, audio_path: impl Into<PathBuf>) {
        let job = Job {
            audio_path: audio_path.into(),
        };
        if self.tx.send(job).is_err() {
            // The file stays on disk; re-hydration picks it up next start.
            warn!("job queue is shut down; segment left for next run");
        }
    }

    /// Re-enqueue segments that survived a previous process. Returns how
    /// many were found. The `failed/` quarantine is not touched.
    pub async fn rehydrate(&self, audio_dir: &Path) -> io::Result<usize> {
        let mut entries = match tokio::fs::read_dir(audio_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let mut found = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_segment = entry.file_type().await?.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some("flac");
            if is_segment {
                found += 1;
                self.enqueue(path);
            }
        }
        if found > 0 {
            info!(count = found, "re-enqueued segments from a previous run");
        }
        Ok(found)
    }
}

async fn run_job<H: JobHandler>(handler: Arc<H>, config: QueueConfig, job: Job) {
    let path = job.audio_path.display().to_string();
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match handler.run(&job).await {
            Ok(()) => {
                debug!(%path, attempt, "segment task completed");
                return;
            }
            Err(JobError::Permanent(reason)) => {
                error!(%path, %reason, "segment task failed permanently");
                quarantine(&job.audio_path).await;
                return;
            }
            Err(JobError::Transient(reason)) => {
                if attempt >= config.max_attempts {
                    error!(%path, %reason, attempt, "segment task exhausted retries");
                    quarantine(&job.audio_path).await;
                    return;
                }
                let delay = backoff_delay(&config, attempt);
                warn!(%path, %reason, attempt, ?delay, "segment task failed; retrying");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

fn backoff_delay(config: &QueueConfig, attempt: u32) -> Duration {
    let factor = 1u32 << attempt.saturating_sub(1).min(16);
    config.backoff_base.saturating_mul(factor).min(config.backoff_cap)
}

/// Retain failed audio under `failed/` so re-hydration skips it and an
/// operator can recover it.
async fn quarantine(audio_path: &Path) {
    let (Some(parent), Some(name)) = (audio_path.parent(), audio_path.file_name()) else {
        return;
    };
    let failed_dir = parent.join("failed");
    if let Err(e) = tokio::fs::create_dir_all(&failed_dir).await {
        warn!(error = %e, "could not create quarantine directory");
        return;
    }
    match tokio::fs::rename(audio_path, failed_dir.join(name)).await {
        Ok(()) => {}
        // Already gone (e.g. the handler deleted it before failing)
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(error = %e, "could not quarantine failed segment"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::Notify;

    struct FlakyHandler {
        failures: u32,
        attempts: AtomicU32,
        done: Notify,
    }

    impl FlakyHandler {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                attempts: AtomicU32::new(0),
                done: Notify::new(),
            }
        }
    }

    #[async_trait]
    impl JobHandler for FlakyHandler {
        async fn run(&self, _job: &Job) -> Result<(), JobError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt <= self.failures {
                Err(JobError::Transient("boom".into()))
            } else {
                self.done.notify_one();
                Ok(())
            }
        }
    }

    struct PermanentHandler {
        done: Notify,
    }

    #[async_trait]
    impl JobHandler for PermanentHandler {
        async fn run(&self, _job: &Job) -> Result<(), JobError> {
            self.done.notify_one();
            Err(JobError::Permanent("bad input".into()))
        }
    }

    fn fast_config(max_attempts: u32) -> QueueConfig {
        QueueConfig {
            max_attempts,
            backoff_base: Duration::from_millis(1),
            backoff_cap: Duration::from_millis(4),
        }
    }

    #[tokio::test]
    async fn transient_failures_retry_until_success() {
        let handler = Arc::new(FlakyHandler::new(2));
        let (queue, _worker) = JobQueue::spawn(Arc::clone(&handler), fast_config(5));

        queue.enqueue("/tmp/rec_1.flac");
        handler.done.notified().await;

        assert_eq!(handler.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_failure_quarantines_audio() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("rec_42.flac");
        tokio::fs::write(&audio, b"data").await.unwrap();

        let handler = Arc::new(PermanentHandler { done: Notify::new() });
        let (queue, _worker) = JobQueue::spawn(Arc::clone(&handler), fast_config(5));

        queue.enqueue(&audio);
        handler.done.notified().await;
        // Give the quarantine rename a moment to land.
        for _ in 0..50 {
            if !audio.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(!audio.exists());
        assert!(dir.path().join("failed").join("rec_42.flac").exists());
    }

    #[tokio::test]
    async fn exhausted_retries_quarantine_audio() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("rec_7.flac");
        tokio::fs::write(&audio, b"data").await.unwrap();

        let handler = Arc::new(FlakyHandler::new(u32::MAX));
        let (queue, _worker) = JobQueue::spawn(Arc::clone(&handler), fast_config(2));

        queue.enqueue(&audio);
        for _ in 0..100 {
            if !audio.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(handler.attempts.load(Ordering::SeqCst), 2);
        assert!(dir.path().join("failed").join("rec_7.flac").exists());
    }

    #[tokio::test]
    async fn rehydrate_enqueues_leftover_segments_only() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("rec_1.flac"), b"a")
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("rec_2.flac"), b"b")
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), b"c")
            .await
            .unwrap();
        tokio::fs::create_dir_all(dir.path().join("failed"))
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("failed").join("rec_3.flac"), b"d")
            .await
            .unwrap();

        let handler = Arc::new(FlakyHandler::new(0));
        let (queue, _worker) = JobQueue::spawn(handler, fast_config(1));

        let found = queue.rehydrate(dir.path()).await.unwrap();
        assert_eq!(found, 2);
    }

    #[tokio::test]
    async fn rehydrate_of_missing_dir_is_empty() {
        let handler = Arc::new(FlakyHandler::new(0));
        let (queue, _worker) = JobQueue::spawn(handler, fast_config(1));

        let found = queue
            .rehydrate(Path::new("/nonexistent/audio/dir"))
            .await
            .unwrap();
        assert_eq!(found, 0);
    }

    #[test]
    fn backoff_grows_and_caps() {
        let config = QueueConfig {
            max_attempts: 10,
            backoff_base: Duration::from_secs(1),
            backoff_cap: Duration::from_secs(60),
        };
        assert_eq!(backoff_delay(&config, 1), Duration::from_secs(1));
        assert_eq!(backoff_delay(&config, 2), Duration::from_secs(2));
        assert_eq!(backoff_delay(&config, 3), Duration::from_secs(4));
        assert_eq!(backoff_delay(&config, 30), Duration::from_secs(60));
    }
}
