//! Application wiring and command entry points

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::warn;

use crate::application::ports::{
    AudioCapture, Clock, RemoteStore, SettingsStore, Summarizer, Transcriber,
};
use crate::application::recorder::RecorderControl;
use crate::application::{
    ChangeFeed, JobQueue, MergeSync, QueueConfig, Scheduler, SegmentPipeline, SegmentRecorder,
    SyncOutcome, WindowAggregator,
};
use crate::domain::record::RecordFamily;
use crate::infrastructure::{
    CpalCapture, DriveStore, OpenAiSummarizer, OpenAiTranscriber, RecordStore, StaticTokenSource,
    SystemClock, TomlSettingsStore,
};

use super::presenter::Presenter;

/// Exit code for runtime failures
pub const EXIT_ERROR: u8 = 1;

/// Data root: one directory per record family, plus `audio/` for segments
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lifelog")
}

fn audio_dir() -> PathBuf {
    data_dir().join("audio")
}

/// Everything a running command needs, wired together.
struct Runtime {
    settings: Arc<TomlSettingsStore>,
    queue: JobQueue,
    recorder: Arc<SegmentRecorder>,
    sync: Arc<MergeSync>,
    clock: Arc<dyn Clock>,
}

async fn build_runtime() -> Result<Runtime, String> {
    let settings_store = Arc::new(
        TomlSettingsStore::open(TomlSettingsStore::default_path())
            .await
            .map_err(|e| e.to_string())?,
    );
    let settings = settings_store.load().await.map_err(|e| e.to_string())?;
    let api_key = settings.api_key.clone().unwrap_or_default();

    let store = Arc::new(RecordStore::new(data_dir()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let feed = ChangeFeed::new();

    let transcriber: Arc<dyn Transcriber> = Arc::new(OpenAiTranscriber::new(
        api_key.clone(),
        settings.transcribe_model.clone(),
    ));
    let summarizer: Arc<dyn Summarizer> = Arc::new(OpenAiSummarizer::new(
        api_key,
        settings.summary_model.clone(),
    ));
    let aggregator = Arc::new(WindowAggregator::new(
        Arc::clone(&store),
        Arc::clone(&summarizer),
    ));
    let pipeline = Arc::new(SegmentPipeline::new(
        transcriber,
        summarizer,
        Arc::clone(&store),
        aggregator,
        Arc::clone(&clock),
    ));
    let (queue, _worker) = JobQueue::spawn(pipeline, QueueConfig::default());

    let tokens = Arc::new(StaticTokenSource::new(settings.drive_token.clone()));
    let remote: Arc<dyn RemoteStore> = Arc::new(DriveStore::new(tokens));
    let sync = Arc::new(MergeSync::new(
        Arc::clone(&store),
        remote,
        Arc::clone(&settings_store) as Arc<dyn SettingsStore>,
        feed,
    ));

    let capture: Arc<dyn AudioCapture> = Arc::new(CpalCapture::new());
    let recorder = Arc::new(SegmentRecorder::new(
        capture,
        Arc::clone(&clock),
        queue.clone(),
        audio_dir(),
    ));

    Ok(Runtime {
        settings: settings_store,
        queue,
        recorder,
        sync,
        clock,
    })
}

async fn rehydrate(runtime: &Runtime, presenter: &Presenter) {
    match runtime.queue.rehydrate(&audio_dir()).await {
        Ok(0) => {}
        Ok(n) => presenter.info(&format!("Recovered {n} unprocessed segments")),
        Err(e) => presenter.warn(&format!("Could not scan for leftover segments: {e}")),
    }
}

/// Run the background daemon until interrupted.
pub async fn run_daemon(record_now: bool, presenter: &Presenter) -> ExitCode {
    let runtime = match build_runtime().await {
        Ok(runtime) => runtime,
        Err(e) => {
            presenter.error(&e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    rehydrate(&runtime, presenter).await;

    // Reconcile local and remote copies in the background at startup
    let sync = Arc::clone(&runtime.sync);
    tokio::spawn(async move { sync.sync_all().await });

    if record_now {
        if let Err(e) = runtime.recorder.start().await {
            presenter.error(&format!("Could not start recording: {e}"));
            return ExitCode::from(EXIT_ERROR);
        }
        presenter.info("Recording started");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = Scheduler::new(
        Arc::clone(&runtime.clock),
        Arc::clone(&runtime.settings) as Arc<dyn SettingsStore>,
        Arc::clone(&runtime.recorder) as Arc<dyn RecorderControl>,
    );
    let scheduler_task = tokio::spawn(async move {
        if let Err(e) = scheduler.run(shutdown_rx).await {
            warn!(error = %e, "scheduler exited with error");
        }
    });

    presenter.info("Daemon running; press Ctrl-C to stop");
    if tokio::signal::ctrl_c().await.is_err() {
        presenter.warn("Signal handling unavailable; stopping");
    }

    let _ = shutdown_tx.send(true);
    runtime.recorder.stop().await;
    let _ = scheduler_task.await;
    presenter.success("Stopped; unprocessed segments resume on next start");
    ExitCode::SUCCESS
}

/// Record until interrupted, ignoring the daily schedule.
pub async fn run_record(presenter: &Presenter) -> ExitCode {
    let runtime = match build_runtime().await {
        Ok(runtime) => runtime,
        Err(e) => {
            presenter.error(&e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    rehydrate(&runtime, presenter).await;

    if let Err(e) = runtime.recorder.start().await {
        presenter.error(&format!("Could not start recording: {e}"));
        return ExitCode::from(EXIT_ERROR);
    }
    presenter.info("Recording; press Ctrl-C to stop");

    if tokio::signal::ctrl_c().await.is_err() {
        presenter.warn("Signal handling unavailable; stopping");
    }
    runtime.recorder.stop().await;
    presenter.success("Recording stopped; queued segments resume on next start");
    ExitCode::SUCCESS
}

/// Merge-sync every record file once.
pub async fn run_sync(presenter: &Presenter) -> ExitCode {
    let runtime = match build_runtime().await {
        Ok(runtime) => runtime,
        Err(e) => {
            presenter.error(&e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mut failures = 0;
    for family in RecordFamily::all() {
        match runtime.sync.sync_and_merge(family).await {
            Ok(SyncOutcome::Disabled) => {
                presenter.warn("Sync is disabled; enable with: lifelog config set sync_enabled true");
                return ExitCode::SUCCESS;
            }
            Ok(SyncOutcome::Merged) => presenter.success(&format!("{family} merged")),
            Ok(SyncOutcome::NothingToSync) => {
                presenter.info(&format!("{family}: nothing to sync"))
            }
            Err(e) => {
                failures += 1;
                presenter.error(&format!("{family}: {e}"));
            }
        }
    }

    if failures > 0 {
        ExitCode::from(EXIT_ERROR)
    } else {
        ExitCode::SUCCESS
    }
}

/// Remove one timestamped entry from every record file.
pub async fn run_delete(timestamp: u64, presenter: &Presenter) -> ExitCode {
    let runtime = match build_runtime().await {
        Ok(runtime) => runtime,
        Err(e) => {
            presenter.error(&e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    match runtime.sync.delete_entry(timestamp).await {
        Ok(()) => {
            presenter.success(&format!("Entry {timestamp} removed from all record files"));
            ExitCode::SUCCESS
        }
        Err(e) => {
            presenter.error(&format!("Deletion incomplete: {e}"));
            ExitCode::from(EXIT_ERROR)
        }
    }
}
