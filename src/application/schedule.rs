//! Daily start/stop scheduler
//!
//! Arms the next start/stop pair computed from the stored "HH:MM" times,
//! fires them against the recorder, then re-arms for the next day. When
//! the clock cannot wake precisely, a coarse once-a-minute poll compares
//! wall-clock time against the window instead.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info};

use crate::application::ports::{Clock, SettingsStore};
use crate::application::recorder::RecorderControl;
use crate::domain::error::{ClockTimeParseError, SettingsError};

/// Poll cadence of the imprecise fallback
const FALLBACK_POLL: Duration = Duration::from_secs(60);

/// Scheduler errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Schedule(#[from] ClockTimeParseError),
}

/// Translates the daily schedule into recorder start/stop events.
pub struct Scheduler {
    clock: Arc<dyn Clock>,
    settings: Arc<dyn SettingsStore>,
    recorder: Arc<dyn RecorderControl>,
}

impl Scheduler {
    pub fn new(
        clock: Arc<dyn Clock>,
        settings: Arc<dyn SettingsStore>,
        recorder: Arc<dyn RecorderControl>,
    ) -> Self {
        Self {
            clock,
            settings,
            recorder,
        }
    }

    /// Run the daily schedule until `shutdown` flips true. Returns
    /// immediately when scheduling is disabled in settings.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), SchedulerError> {
        loop {
            let settings = self.settings.load().await?;
            if !settings.schedule_enabled {
                info!("schedule disabled; scheduler idle");
                return Ok(());
            }
            let schedule = settings.schedule()?;
            let (start_at, stop_at) = schedule.next_window(self.clock.now_local());
            info!(%start_at, %stop_at, "armed daily recording window");

            if self.clock.precise_wake() {
                tokio::select! {
                    _ = self.clock.wait_until(start_at) => {}
                    _ = signalled(&mut shutdown) => return Ok(()),
                }
                if let Err(e) = self.recorder.start().await {
                    error!(error = %e, "scheduled recorder start failed");
                }
                tokio::select! {
                    _ = self.clock.wait_until(stop_at) => {}
                    _ = signalled(&mut shutdown) => {
                        self.recorder.stop().await;
                        return Ok(());
                    }
                }
                self.recorder.stop().await;
            } else {
                // Imprecise fallback: repeatedly compare the wall clock
                // against the window.
                loop {
                    let now = self.clock.now_local();
                    if now >= stop_at {
                        if self.recorder.is_running() {
                            self.recorder.stop().await;
                        }
                        break;
                    }
                    if now >= start_at && !self.recorder.is_running() {
                        if let Err(e) = self.recorder.start().await {
                            error!(error = %e, "scheduled recorder start failed");
                        }
                    }
                    tokio::select! {
                        _ = tokio::time::sleep(FALLBACK_POLL) => {}
                        _ = signalled(&mut shutdown) => {
                            self.recorder.stop().await;
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}

/// Resolve once `rx` carries true (or its sender is gone).
async fn signalled(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}
