//! Lifelog - continuous personal audio journal
//!
//! This crate records microphone audio in timed segments, transcribes and
//! summarizes each segment through remote AI services, maintains rollup
//! summaries over trailing time windows, and reconciles the resulting
//! record files with a cloud-drive copy.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Value objects, pure merge/schedule logic, and errors
//! - **Application**: Use cases and port interfaces (traits): segment
//!   recorder, durable job queue, window aggregator, merge-sync engine,
//!   daily scheduler
//! - **Infrastructure**: Adapter implementations (cpal capture, OpenAI
//!   transcription/summarization, Google Drive, record file store, TOML
//!   settings)
//! - **CLI**: Command-line interface and daemon wiring

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
