//! Settings storage port interface

use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::error::SettingsError;
use crate::domain::settings::Settings;

/// Port for settings storage
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Load the current settings.
    async fn load(&self) -> Result<Settings, SettingsError>;

    /// Persist the given settings.
    async fn save(&self, settings: &Settings) -> Result<(), SettingsError>;

    /// Get the settings file path.
    fn path(&self) -> PathBuf;
}
