//! Application layer: use cases, background tasks, and port interfaces

pub mod aggregate;
pub mod notify;
pub mod pipeline;
pub mod ports;
pub mod queue;
pub mod recorder;
pub mod schedule;
pub mod sync;

pub use aggregate::WindowAggregator;
pub use notify::{ChangeEvent, ChangeFeed};
pub use pipeline::SegmentPipeline;
pub use queue::{JobQueue, QueueConfig};
pub use recorder::{RecorderControl, SegmentRecorder};
pub use schedule::Scheduler;
pub use sync::{MergeSync, SyncOutcome};
