//! audio-toggle binary entry point
//!
//! Dispatches to daemon mode or subcommands based on CLI arguments.

use audio_toggle::classify::Category;
use audio_toggle::commands::{self, Action};
use audio_toggle::{cli::Args, cli::Command, config::Config, daemon};
use clap::Parser;
use color_eyre::eyre::Result;
use tracing::warn;

/// Initialize logging for CLI commands
///
/// Logs go to stderr; quiet by default, `RUST_LOG` overrides.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Config for read-only commands; an unreadable config falls back to defaults
fn load_config_or_default() -> Config {
    Config::load().unwrap_or_else(|e| {
        warn!("Using default keywords: {:#}", e);
        Config::default()
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    match args.command {
        // Daemon handles its own logging initialization (file vs stderr)
        Some(Command::Daemon {
            foreground,
            detached,
        }) => {
            if foreground || detached {
                let config = Config::load()?;
                daemon::run(config, detached).await
            } else {
                daemon::spawn_detached().await
            }
        }

        None => {
            init_logging();
            commands::status(&load_config_or_default(), false).await
        }

        Some(Command::Status { json }) => {
            init_logging();
            commands::status(&load_config_or_default(), json).await
        }

        Some(Command::ListSinks { json }) => {
            init_logging();
            commands::list_sinks(&load_config_or_default(), json).await
        }

        // Switch commands (daemon if running, otherwise local)
        Some(Command::Toggle) => {
            init_logging();
            commands::switch(&Config::load()?, Action::Toggle).await
        }

        Some(Command::Speaker) => {
            init_logging();
            commands::switch(&Config::load()?, Action::Switch(Category::Speaker)).await
        }

        Some(Command::Headset) => {
            init_logging();
            commands::switch(&Config::load()?, Action::Switch(Category::Headset)).await
        }

        Some(Command::Refresh) => {
            init_logging();
            commands::refresh(&Config::load()?).await
        }

        Some(Command::Validate) => {
            init_logging();
            let config = Config::load()?;
            config.print_summary();
            Ok(())
        }

        // IPC-based commands (require daemon)
        Some(Command::Reload) => {
            init_logging();
            commands::reload().await
        }

        Some(Command::Shutdown) => {
            init_logging();
            commands::shutdown().await
        }
    }
}
