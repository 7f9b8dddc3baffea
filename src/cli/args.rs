//! CLI argument definitions using Clap

use clap::{Parser, Subcommand};

/// Lifelog - continuous personal audio journal
#[derive(Parser, Debug)]
#[command(name = "lifelog")]
#[command(version)]
#[command(about = "Continuous audio journal: segmented recording, AI transcription and summaries, Drive sync")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the background daemon (schedule, job queue, merge-sync)
    Run {
        /// Start recording immediately instead of waiting for the schedule
        #[arg(long)]
        record: bool,
    },
    /// Record until interrupted, processing segments as they complete
    Record,
    /// Merge-sync every record file with the remote store once
    Sync,
    /// Remove the entry with the given timestamp from every record file
    Delete {
        /// Record key (milliseconds since epoch)
        timestamp: u64,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Settings keys exposed through `config get`/`config set`
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "api_key",
    "transcribe_model",
    "summary_model",
    "schedule_enabled",
    "schedule_start",
    "schedule_end",
    "sync_enabled",
    "drive_token",
];

pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_keys_are_valid() {
        for key in VALID_CONFIG_KEYS {
            assert!(is_valid_config_key(key));
        }
    }

    #[test]
    fn unknown_key_is_invalid() {
        assert!(!is_valid_config_key("summaries_file_id"));
        assert!(!is_valid_config_key("nope"));
    }

    #[test]
    fn cli_parses_run_with_record() {
        let cli = Cli::try_parse_from(["lifelog", "run", "--record"]).unwrap();
        assert!(matches!(cli.command, Commands::Run { record: true }));
    }

    #[test]
    fn cli_parses_delete_timestamp() {
        let cli = Cli::try_parse_from(["lifelog", "delete", "1700000000000"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Delete {
                timestamp: 1700000000000
            }
        ));
    }

    #[test]
    fn cli_rejects_missing_subcommand() {
        assert!(Cli::try_parse_from(["lifelog"]).is_err());
    }
}
