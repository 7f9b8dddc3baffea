//! OpenAI-compatible API adapters

pub mod summarize;
pub mod transcribe;

pub use summarize::OpenAiSummarizer;
pub use transcribe::{OpenAiTranscriber, DEFAULT_BASE_URL};
