//! Multi-window rollup aggregation
//!
//! After every new transcript, each trailing window (30/60/120/240
//! minutes) is checked: if enough transcript volume accumulated and the
//! previous rollup is not too recent, the window's transcripts are
//! summarized into one rollup record.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::application::ports::{SummarizeError, Summarizer};
use crate::domain::record::{Record, RecordFamily};
use crate::infrastructure::store::{RecordStore, StoreError};

const MS_PER_MINUTE: u64 = 60_000;

/// Aggregation errors
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error(transparent)]
    Summarize(#[from] SummarizeError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Generates rollup summaries over trailing transcript windows.
pub struct WindowAggregator {
    store: Arc<RecordStore>,
    summarizer: Arc<dyn Summarizer>,
}

impl WindowAggregator {
    pub fn new(store: Arc<RecordStore>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self { store, summarizer }
    }

    /// Roll up the trailing `window_minutes` if warranted. Returns true
    /// when a new rollup record was appended.
    ///
    /// Gating: at least one transcript per five minutes of window, and at
    /// least half the window since the previous rollup.
    pub async fn maybe_summarize_window(
        &self,
        now: u64,
        window_minutes: u32,
    ) -> Result<bool, AggregateError> {
        let window_start = now.saturating_sub(window_minutes as u64 * MS_PER_MINUTE);
        let transcripts: Vec<String> = self
            .store
            .read_records(RecordFamily::Transcripts)
            .await?
            .into_iter()
            .filter(|r| r.timestamp >= window_start)
            .map(|r| r.payload)
            .collect();

        let min_segments = (window_minutes / 5) as usize;
        if transcripts.len() < min_segments {
            debug!(
                window_minutes,
                have = transcripts.len(),
                need = min_segments,
                "window too sparse; skipping rollup"
            );
            return Ok(false);
        }

        let family = RecordFamily::Window(window_minutes);
        let last_rollup = self
            .store
            .read_records(family)
            .await?
            .last()
            .map(|r| r.timestamp)
            .unwrap_or(0);
        let min_gap = (window_minutes / 2) as u64 * MS_PER_MINUTE;
        if now.saturating_sub(last_rollup) < min_gap {
            debug!(window_minutes, "previous rollup too recent; skipping");
            return Ok(false);
        }

        let combined = transcripts.join("\n");
        let summary = self.summarizer.summarize(&combined).await?;
        self.store
            .append(family, &Record::new(now, summary.to_payload()))
            .await?;
        Ok(true)
    }
}
