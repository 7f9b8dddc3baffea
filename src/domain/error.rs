//! Domain error types

use thiserror::Error;

/// Error when parsing a "HH:MM" clock time string
#[derive(Debug, Clone, Error)]
#[error("Invalid clock time: \"{input}\". Expected 24-hour format HH:MM (e.g. 09:00, 22:30)")]
pub struct ClockTimeParseError {
    pub input: String,
}

/// Error when settings storage fails
#[derive(Debug, Clone, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    ReadError(String),

    #[error("Failed to parse settings file: {0}")]
    ParseError(String),

    #[error("Failed to write settings file: {0}")]
    WriteError(String),

    #[error("Invalid value for '{key}': {message}")]
    ValidationError { key: String, message: String },
}
