//! Lifelog CLI entry point

use std::process::ExitCode;

use clap::Parser;

use lifelog::cli::{
    app::{run_daemon, run_delete, run_record, run_sync, EXIT_ERROR},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    presenter::Presenter,
};
use lifelog::infrastructure::TomlSettingsStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let presenter = Presenter::new();

    match cli.command {
        Commands::Config { action } => {
            let store = match TomlSettingsStore::open(TomlSettingsStore::default_path()).await {
                Ok(store) => store,
                Err(e) => {
                    presenter.error(&e.to_string());
                    return ExitCode::from(EXIT_ERROR);
                }
            };
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            ExitCode::SUCCESS
        }
        Commands::Run { record } => run_daemon(record, &presenter).await,
        Commands::Record => run_record(&presenter).await,
        Commands::Sync => run_sync(&presenter).await,
        Commands::Delete { timestamp } => run_delete(timestamp, &presenter).await,
    }
}
