//! Config command handler

use crate::application::ports::SettingsStore;
use crate::domain::error::SettingsError;
use crate::domain::schedule::ClockTime;
use crate::domain::settings::Settings;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

/// Handle config subcommand
pub async fn handle_config_command<S: SettingsStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), SettingsError> {
    match action {
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

fn unknown_key(key: &str) -> SettingsError {
    SettingsError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, SettingsError> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(SettingsError::ValidationError {
            key: key.to_string(),
            message: "Value must be 'true' or 'false'".to_string(),
        }),
    }
}

fn parse_clock(key: &str, value: &str) -> Result<(), SettingsError> {
    value
        .parse::<ClockTime>()
        .map(|_| ())
        .map_err(|e| SettingsError::ValidationError {
            key: key.to_string(),
            message: e.to_string(),
        })
}

async fn handle_set<S: SettingsStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), SettingsError> {
    if !is_valid_config_key(key) {
        return Err(unknown_key(key));
    }

    let mut settings = store.load().await?;
    match key {
        "api_key" => settings.api_key = Some(value.to_string()),
        "transcribe_model" => settings.transcribe_model = value.to_string(),
        "summary_model" => settings.summary_model = value.to_string(),
        "schedule_enabled" => settings.schedule_enabled = parse_bool(key, value)?,
        "schedule_start" => {
            parse_clock(key, value)?;
            settings.schedule_start = value.to_string();
        }
        "schedule_end" => {
            parse_clock(key, value)?;
            settings.schedule_end = value.to_string();
        }
        "sync_enabled" => settings.sync_enabled = parse_bool(key, value)?,
        "drive_token" => settings.drive_token = Some(value.to_string()),
        _ => unreachable!(), // Already validated
    }

    store.save(&settings).await?;
    presenter.success(&format!("{} = {}", key, value));
    Ok(())
}

fn value_of(settings: &Settings, key: &str) -> String {
    match key {
        "api_key" => settings.api_key.clone().unwrap_or_default(),
        "transcribe_model" => settings.transcribe_model.clone(),
        "summary_model" => settings.summary_model.clone(),
        "schedule_enabled" => settings.schedule_enabled.to_string(),
        "schedule_start" => settings.schedule_start.clone(),
        "schedule_end" => settings.schedule_end.clone(),
        "sync_enabled" => settings.sync_enabled.to_string(),
        "drive_token" => settings.drive_token.clone().unwrap_or_default(),
        _ => String::new(),
    }
}

async fn handle_get<S: SettingsStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), SettingsError> {
    if !is_valid_config_key(key) {
        return Err(unknown_key(key));
    }
    let settings = store.load().await?;
    presenter.output(&value_of(&settings, key));
    Ok(())
}

async fn handle_list<S: SettingsStore>(
    store: &S,
    presenter: &Presenter,
) -> Result<(), SettingsError> {
    let settings = store.load().await?;
    for key in VALID_CONFIG_KEYS {
        presenter.key_value(key, &value_of(&settings, key));
    }
    Ok(())
}

fn handle_path<S: SettingsStore>(store: &S, presenter: &Presenter) -> Result<(), SettingsError> {
    presenter.output(&store.path().display().to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::TomlSettingsStore;

    async fn store() -> (tempfile::TempDir, TomlSettingsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlSettingsStore::open(dir.path().join("config.toml"))
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn set_and_reload_api_key() {
        let (_dir, store) = store().await;
        let presenter = Presenter::new();

        handle_config_command(
            ConfigAction::Set {
                key: "api_key".to_string(),
                value: "sk-test".to_string(),
            },
            &store,
            &presenter,
        )
        .await
        .unwrap();

        let settings = store.load().await.unwrap();
        assert_eq!(settings.api_key.as_deref(), Some("sk-test"));
    }

    #[tokio::test]
    async fn set_rejects_unknown_key() {
        let (_dir, store) = store().await;
        let presenter = Presenter::new();

        let result = handle_set(&store, &presenter, "bogus", "x").await;
        assert!(matches!(
            result,
            Err(SettingsError::ValidationError { .. })
        ));
    }

    #[tokio::test]
    async fn set_rejects_malformed_schedule_time() {
        let (_dir, store) = store().await;
        let presenter = Presenter::new();

        let result = handle_set(&store, &presenter, "schedule_start", "nine am").await;
        assert!(matches!(
            result,
            Err(SettingsError::ValidationError { .. })
        ));
    }

    #[tokio::test]
    async fn set_parses_boolean_flags() {
        let (_dir, store) = store().await;
        let presenter = Presenter::new();

        handle_set(&store, &presenter, "sync_enabled", "true")
            .await
            .unwrap();
        assert!(store.load().await.unwrap().sync_enabled);

        let result = handle_set(&store, &presenter, "sync_enabled", "maybe").await;
        assert!(result.is_err());
    }
}
