//! Segment recorder
//!
//! While running, the recorder cuts capture into fixed-duration segments
//! and hands each completed segment file to the job queue, back to back.
//! On stop the in-flight segment is finalized; a trailing fragment below
//! the minimum viable duration is discarded instead of enqueued.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::application::ports::{AudioCapture, CaptureError, Clock};
use crate::application::queue::JobQueue;

/// Fixed duration of one audio segment
pub const SEGMENT_DURATION: Duration = Duration::from_secs(10 * 60);

/// Minimum viable duration of a trailing segment on forced stop
pub const MIN_SEGMENT_DURATION: Duration = Duration::from_secs(5);

/// Control surface the scheduler drives.
#[async_trait]
pub trait RecorderControl: Send + Sync {
    async fn start(&self) -> Result<(), CaptureError>;
    async fn stop(&self);
    fn is_running(&self) -> bool;
}

struct LoopHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Drives the capture port in a segment loop.
pub struct SegmentRecorder {
    capture: Arc<dyn AudioCapture>,
    clock: Arc<dyn Clock>,
    queue: JobQueue,
    audio_dir: PathBuf,
    running: Arc<AtomicBool>,
    current: Mutex<Option<LoopHandle>>,
    segment_duration: Duration,
    min_segment: Duration,
}

impl SegmentRecorder {
    pub fn new(
        capture: Arc<dyn AudioCapture>,
        clock: Arc<dyn Clock>,
        queue: JobQueue,
        audio_dir: impl Into<PathBuf>,
    ) -> Self {
        Self::with_durations(
            capture,
            clock,
            queue,
            audio_dir,
            SEGMENT_DURATION,
            MIN_SEGMENT_DURATION,
        )
    }

    /// Create with custom segment/minimum durations
    pub fn with_durations(
        capture: Arc<dyn AudioCapture>,
        clock: Arc<dyn Clock>,
        queue: JobQueue,
        audio_dir: impl Into<PathBuf>,
        segment_duration: Duration,
        min_segment: Duration,
    ) -> Self {
        Self {
            capture,
            clock,
            queue,
            audio_dir: audio_dir.into(),
            running: Arc::new(AtomicBool::new(false)),
            current: Mutex::new(None),
            segment_duration,
            min_segment,
        }
    }
}

#[async_trait]
impl RecorderControl for SegmentRecorder {
    /// Begin continuous capture. A no-op while already running.
    async fn start(&self) -> Result<(), CaptureError> {
        let mut current = self.current.lock().await;
        if self.running.load(Ordering::SeqCst) {
            return Ok(());
        }
        // Drop a handle left behind by a loop that died on its own
        current.take();

        fs::create_dir_all(&self.audio_dir)
            .await
            .map_err(|e| CaptureError::WriteFailed(e.to_string()))?;

        let (stop_tx, stop_rx) = watch::channel(false);
        self.running.store(true, Ordering::SeqCst);
        let task = tokio::spawn(segment_loop(
            Arc::clone(&self.capture),
            Arc::clone(&self.clock),
            self.queue.clone(),
            self.audio_dir.clone(),
            Arc::clone(&self.running),
            stop_rx,
            self.segment_duration,
            self.min_segment,
        ));
        *current = Some(LoopHandle { stop_tx, task });
        Ok(())
    }

    /// End capture, finalizing the in-flight segment.
    async fn stop(&self) {
        let handle = self.current.lock().await.take();
        if let Some(LoopHandle { stop_tx, task }) = handle {
            let _ = stop_tx.send(true);
            let _ = task.await;
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[allow(clippy::too_many_arguments)]
async fn segment_loop(
    capture: Arc<dyn AudioCapture>,
    clock: Arc<dyn Clock>,
    queue: JobQueue,
    audio_dir: PathBuf,
    running: Arc<AtomicBool>,
    stop_rx: watch::Receiver<bool>,
    segment_duration: Duration,
    min_segment: Duration,
) {
    info!("segment recorder started");
    loop {
        let path = audio_dir.join(format!("rec_{}.flac", clock.now_ms()));
        let result = capture
            .capture(&path, segment_duration, stop_rx.clone())
            .await;
        let stopping = *stop_rx.borrow();

        match result {
            Err(e) => {
                // Device busy, permission revoked: stop rather than spin
                error!(error = %e, "audio capture failed; stopping recorder");
                let _ = fs::remove_file(&path).await;
                break;
            }
            Ok(stats) => {
                if stopping && stats.elapsed < min_segment {
                    debug!(
                        elapsed_ms = stats.elapsed.as_millis() as u64,
                        "discarding trailing segment below minimum duration"
                    );
                    let _ = fs::remove_file(&path).await;
                } else {
                    queue.enqueue(path);
                }
            }
        }

        if stopping {
            break;
        }
    }
    running.store(false, Ordering::SeqCst);
    info!("segment recorder stopped");
}
