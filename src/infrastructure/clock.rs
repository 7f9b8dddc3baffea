//! System clock adapter

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};

use crate::application::ports::Clock;

/// Clock backed by the OS wall clock and tokio timers.
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    fn now_local(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    async fn wait_until(&self, instant: NaiveDateTime) {
        // Re-check at most hourly so suspend/resume or a DST shift cannot
        // leave us sleeping past the target.
        loop {
            let now = self.now_local();
            if now >= instant {
                return;
            }
            let remaining = (instant - now).to_std().unwrap_or(Duration::ZERO);
            tokio::time::sleep(remaining.min(Duration::from_secs(3600))).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_ms_is_plausible() {
        let clock = SystemClock;
        // Anything after 2020-01-01 and the two reads are monotonic-ish
        assert!(clock.now_ms() > 1_577_836_800_000);
        assert!(clock.now_ms() >= clock.now_ms() - 1);
    }

    #[tokio::test]
    async fn wait_until_past_instant_returns_immediately() {
        let clock = SystemClock;
        let past = clock.now_local() - chrono::Duration::hours(1);
        tokio::time::timeout(Duration::from_millis(100), clock.wait_until(past))
            .await
            .expect("waiting for a past instant must not block");
    }
}
