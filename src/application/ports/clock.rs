//! Clock and wake-scheduling port interface

use async_trait::async_trait;
use chrono::NaiveDateTime;

/// Port for wall-clock time and scheduled waking.
///
/// The platform's wake primitives are an external collaborator; this
/// abstracts the two capabilities the scheduler needs.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_ms(&self) -> u64;

    /// Current local wall-clock date-time
    fn now_local(&self) -> NaiveDateTime;

    /// Sleep until the given local instant. Returns immediately when the
    /// instant is already past.
    async fn wait_until(&self, instant: NaiveDateTime);

    /// Whether `wait_until` fires precisely. When false, the scheduler
    /// falls back to coarse periodic polling.
    fn precise_wake(&self) -> bool {
        true
    }
}
