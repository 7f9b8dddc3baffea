//! Records, record files, and the merge that reconciles them

pub mod family;
pub mod merge;
pub mod record;

pub use family::{RecordFamily, WINDOW_MINUTES};
pub use merge::{merge_lines, remove_entry};
pub use record::{Record, Summary};
