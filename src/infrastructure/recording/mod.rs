//! Microphone capture and segment encoding adapters

pub mod cpal;
pub mod flac;

pub use self::cpal::CpalCapture;
pub use flac::{encode_flac, FlacError, SEGMENT_SAMPLE_RATE};
