//! The per-segment processing task
//!
//! Steps run strictly in order: stability wait, transcribe, short-
//! transcript guard, persist transcript, summarize, persist summary,
//! window aggregation, cleanup. A segment's records all share one
//! timestamp so transcript and summary correlate; the timestamp is
//! derived from the segment file name, which makes retries idempotent:
//! a step whose record already exists is skipped instead of re-running
//! the network call.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::application::aggregate::{AggregateError, WindowAggregator};
use crate::application::ports::{Clock, SummarizeError, TranscribeError, Transcriber, Summarizer};
use crate::application::queue::{Job, JobError, JobHandler};
use crate::domain::record::{Record, RecordFamily, WINDOW_MINUTES};
use crate::infrastructure::store::{RecordStore, StoreError};

/// Transcripts shorter than this are treated as silence/noise
const MIN_TRANSCRIPT_CHARS: usize = 5;

/// File-size polling cadence for the stability wait
const STABILITY_POLL: Duration = Duration::from_millis(300);
const STABILITY_POLLS: u32 = 10;

/// Segment file names carry their creation time: `rec_<ms>.flac`
pub fn segment_timestamp(path: &Path) -> Option<u64> {
    path.file_stem()?
        .to_str()?
        .strip_prefix("rec_")?
        .parse()
        .ok()
}

/// Processes one recorded segment end to end.
pub struct SegmentPipeline {
    transcriber: Arc<dyn Transcriber>,
    summarizer: Arc<dyn Summarizer>,
    store: Arc<RecordStore>,
    aggregator: Arc<WindowAggregator>,
    clock: Arc<dyn Clock>,
}

impl SegmentPipeline {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        summarizer: Arc<dyn Summarizer>,
        store: Arc<RecordStore>,
        aggregator: Arc<WindowAggregator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transcriber,
            summarizer,
            store,
            aggregator,
            clock,
        }
    }

    /// Poll the file size until two consecutive reads are equal and
    /// non-zero. A file that never stabilizes is incomplete and fails the
    /// task without retry.
    async fn wait_for_stable(&self, path: &Path) -> Result<(), JobError> {
        let mut last_len: Option<u64> = None;
        for _ in 0..STABILITY_POLLS {
            let len = fs::metadata(path)
                .await
                .map(|m| m.len())
                .map_err(|e| JobError::Permanent(format!("segment file unreadable: {e}")))?;
            if len > 0 && last_len == Some(len) {
                return Ok(());
            }
            last_len = Some(len);
            tokio::time::sleep(STABILITY_POLL).await;
        }
        Err(JobError::Permanent(
            "segment file never stabilized or stayed empty".to_string(),
        ))
    }

    async fn delete_audio(&self, path: &Path) {
        match fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "could not delete segment"),
        }
    }
}

fn store_err(e: StoreError) -> JobError {
    JobError::Transient(e.to_string())
}

fn transcribe_err(e: TranscribeError) -> JobError {
    if e.is_transient() {
        JobError::Transient(e.to_string())
    } else {
        JobError::Permanent(e.to_string())
    }
}

fn summarize_err(e: SummarizeError) -> JobError {
    if e.is_transient() {
        JobError::Transient(e.to_string())
    } else {
        JobError::Permanent(e.to_string())
    }
}

fn aggregate_err(e: AggregateError) -> JobError {
    match e {
        AggregateError::Summarize(e) => summarize_err(e),
        AggregateError::Store(e) => store_err(e),
    }
}

#[async_trait]
impl JobHandler for SegmentPipeline {
    async fn run(&self, job: &Job) -> Result<(), JobError> {
        let path = job.audio_path.as_path();

        self.wait_for_stable(path).await?;

        let key = segment_timestamp(path).unwrap_or_else(|| self.clock.now_ms());

        // A retry after a late-stage failure reuses the transcript an
        // earlier attempt already persisted.
        let existing = self
            .store
            .read_records(RecordFamily::Transcripts)
            .await
            .map_err(store_err)?
            .into_iter()
            .find(|r| r.timestamp == key);

        let transcript = match existing {
            Some(record) => {
                debug!(key, "transcript already persisted; skipping transcription");
                record.payload
            }
            None => {
                let audio = fs::read(path)
                    .await
                    .map_err(|e| JobError::Permanent(format!("could not read segment: {e}")))?;
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "segment.flac".to_string());

                let text = self
                    .transcriber
                    .transcribe(audio, &file_name)
                    .await
                    .map_err(transcribe_err)?;
                let text = text.trim().to_string();

                if text.chars().count() < MIN_TRANSCRIPT_CHARS {
                    debug!(
                        key,
                        chars = text.chars().count(),
                        "transcript too short; treating segment as silence"
                    );
                    self.delete_audio(path).await;
                    return Ok(());
                }

                self.store
                    .append(RecordFamily::Transcripts, &Record::new(key, &text))
                    .await
                    .map_err(store_err)?;
                text
            }
        };

        let summary_exists = self
            .store
            .read_records(RecordFamily::Summaries)
            .await
            .map_err(store_err)?
            .iter()
            .any(|r| r.timestamp == key);
        if !summary_exists {
            let summary = self
                .summarizer
                .summarize(&transcript)
                .await
                .map_err(summarize_err)?;
            self.store
                .append(RecordFamily::Summaries, &Record::new(key, summary.to_payload()))
                .await
                .map_err(store_err)?;
        } else {
            debug!(key, "summary already persisted; skipping summarization");
        }

        for minutes in WINDOW_MINUTES {
            self.aggregator
                .maybe_summarize_window(key, minutes)
                .await
                .map_err(aggregate_err)?;
        }

        self.delete_audio(path).await;
        info!(key, "segment processed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn segment_timestamp_parses_file_name() {
        let path = PathBuf::from("/data/audio/rec_1700000000000.flac");
        assert_eq!(segment_timestamp(&path), Some(1700000000000));
    }

    #[test]
    fn segment_timestamp_rejects_other_names() {
        assert_eq!(segment_timestamp(Path::new("/data/audio/other.flac")), None);
        assert_eq!(segment_timestamp(Path::new("/data/audio/rec_abc.flac")), None);
        assert_eq!(segment_timestamp(Path::new("rec_.flac")), None);
    }
}
