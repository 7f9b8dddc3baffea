//! Persisted user settings value object

use serde::{Deserialize, Serialize};

use crate::domain::error::ClockTimeParseError;
use crate::domain::schedule::DailySchedule;

/// Default model for the transcription endpoint
pub const DEFAULT_TRANSCRIBE_MODEL: &str = "gpt-4o-transcribe";

/// Default model for the summarization endpoint
pub const DEFAULT_SUMMARY_MODEL: &str = "gpt-4.1";

/// User configuration persisted by the settings store.
///
/// Every field has a serde default so a partially written file still
/// deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// API credential for the transcription/summarization services
    pub api_key: Option<String>,
    pub transcribe_model: String,
    pub summary_model: String,
    /// Whether the daily start/stop schedule is armed
    pub schedule_enabled: bool,
    pub schedule_start: String,
    pub schedule_end: String,
    /// Whether record files are reconciled with the remote store
    pub sync_enabled: bool,
    /// Bearer token for the remote store (sign-in flow is external)
    pub drive_token: Option<String>,
    /// Cached remote id of the base summaries file
    pub summaries_file_id: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            transcribe_model: DEFAULT_TRANSCRIBE_MODEL.to_string(),
            summary_model: DEFAULT_SUMMARY_MODEL.to_string(),
            schedule_enabled: false,
            schedule_start: "09:00".to_string(),
            schedule_end: "22:00".to_string(),
            sync_enabled: false,
            drive_token: None,
            summaries_file_id: None,
        }
    }
}

impl Settings {
    /// Parse the stored schedule times
    pub fn schedule(&self) -> Result<DailySchedule, ClockTimeParseError> {
        DailySchedule::parse(&self.schedule_start, &self.schedule_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_expected_values() {
        let settings = Settings::default();
        assert!(settings.api_key.is_none());
        assert_eq!(settings.transcribe_model, "gpt-4o-transcribe");
        assert_eq!(settings.summary_model, "gpt-4.1");
        assert!(!settings.schedule_enabled);
        assert!(!settings.sync_enabled);
        assert!(settings.summaries_file_id.is_none());
    }

    #[test]
    fn default_schedule_parses() {
        let settings = Settings::default();
        assert!(settings.schedule().is_ok());
    }

    #[test]
    fn partial_toml_deserializes_with_defaults() {
        let settings: Settings = toml::from_str("api_key = \"sk-test\"").unwrap();
        assert_eq!(settings.api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.summary_model, DEFAULT_SUMMARY_MODEL);
        assert_eq!(settings.schedule_start, "09:00");
    }
}
