//! TOML settings store
//!
//! Settings live in one TOML file under the platform config dir. A file
//! that fails to parse is reset to defaults and rewritten instead of
//! failing the process.

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::warn;

use crate::application::ports::SettingsStore;
use crate::domain::error::SettingsError;
use crate::domain::settings::Settings;

/// Settings store backed by a TOML file.
pub struct TomlSettingsStore {
    path: PathBuf,
}

impl TomlSettingsStore {
    /// Default settings file location
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("lifelog")
            .join("config.toml")
    }

    /// Open the store, validating (and, if corrupt, resetting) what is on
    /// disk so later loads cannot surprise the caller.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let store = Self { path: path.into() };
        store.load().await?;
        Ok(store)
    }

    fn parse(content: &str) -> Result<Settings, SettingsError> {
        toml::from_str(content).map_err(|e| SettingsError::ParseError(e.to_string()))
    }

    fn to_toml(settings: &Settings) -> Result<String, SettingsError> {
        toml::to_string_pretty(settings).map_err(|e| SettingsError::WriteError(e.to_string()))
    }
}

#[async_trait]
impl SettingsStore for TomlSettingsStore {
    async fn load(&self) -> Result<Settings, SettingsError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Settings::default()),
            Err(e) => return Err(SettingsError::ReadError(e.to_string())),
        };

        match Self::parse(&content) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                // Trade the stored values for availability
                warn!(error = %e, "settings file unreadable; resetting to defaults");
                let defaults = Settings::default();
                self.save(&defaults).await?;
                Ok(defaults)
            }
        }
    }

    async fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SettingsError::WriteError(e.to_string()))?;
        }
        let content = Self::to_toml(settings)?;
        fs::write(&self.path, content)
            .await
            .map_err(|e| SettingsError::WriteError(e.to_string()))?;
        Ok(())
    }

    fn path(&self) -> PathBuf {
        self.path.clone()
    }
}
