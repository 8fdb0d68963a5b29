//! CLI commands
//!
//! Switch commands (toggle, speaker, headset, refresh) are hybrid: they go
//! through the daemon when it is running so its remembered output is used, and
//! otherwise run a one-shot local controller. `status` and `list-sinks` query
//! the audio server directly; `reload` and `shutdown` need the daemon.

use color_eyre::eyre::{self, Result};
use crossterm::style::Stylize;
use tracing::{debug, warn};

use crate::audio::{AudioServer, Pactl};
use crate::classify::{Category, Keywords, classify_name};
use crate::config::Config;
use crate::controller::{SwitchController, SwitchOutcome};
use crate::ipc::{self, Request, Response};
use crate::notification::{notify_outcome, outcome_message};
use crate::style::{self, ToggleStyle};

/// A switch the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Toggle,
    Switch(Category),
}

impl Action {
    fn request(self) -> Request {
        match self {
            Self::Toggle => Request::Toggle,
            Self::Switch(category) => Request::Switch { category },
        }
    }
}

// ============================================================================
// Switch Commands (hybrid)
// ============================================================================

/// Run a switch without a daemon
///
/// A fresh controller knows nothing about earlier switches, so it first
/// re-detects the current output from the default sink.
pub async fn local_switch<S: AudioServer>(
    server: S,
    keywords: Keywords,
    action: Action,
) -> SwitchOutcome {
    let mut controller = SwitchController::new(server, keywords);
    let current = controller.refresh().await;
    debug!("Local controller starts from {}", current);

    match action {
        Action::Toggle => controller.toggle().await,
        Action::Switch(category) => controller.switch_to(category).await,
    }
}

/// Toggle, or switch to a specific category
///
/// # Errors
/// Returns an error if `pactl` is missing, the daemon exchange fails, or the
/// audio server rejected the selected sink.
pub async fn switch(config: &Config, action: Action) -> Result<()> {
    let outcome = if ipc::is_daemon_running().await {
        match ipc::send_request(action.request()).await? {
            Response::Outcome { outcome } => outcome,
            Response::Error { message } => eyre::bail!("Error: {message}"),
            _ => eyre::bail!("Unexpected response from daemon"),
        }
    } else {
        let pactl = Pactl::new();
        pactl.validate_tools().await?;
        let outcome = local_switch(pactl, config.keywords.clone(), action).await;

        if config.settings.notify
            && let Err(e) = notify_outcome(&outcome)
        {
            warn!("Notification failed: {}", e);
        }
        outcome
    };

    print_outcome(&outcome)
}

fn print_outcome(outcome: &SwitchOutcome) -> Result<()> {
    match outcome {
        SwitchOutcome::Switched {
            category,
            sink,
            description,
            fallback,
            relocation,
        } => {
            println!("{} {}", "Switched to:".success(), description.as_str().bold());
            println!("  {} {}", "sink:".dim(), sink.name.as_str().technical());
            if *fallback {
                println!(
                    "  {}",
                    format!("No {category} matched; used the first available sink").warning()
                );
            }
            if relocation.is_partial() {
                println!(
                    "  {}",
                    format!(
                        "Moved {} of {} streams",
                        relocation.moved,
                        relocation.attempted()
                    )
                    .warning()
                );
            } else if relocation.moved > 0 {
                println!(
                    "  {}",
                    format!("Moved {} streams", relocation.moved).dim()
                );
            }
            Ok(())
        }
        SwitchOutcome::NoMatchingDevice { .. } => {
            println!("{}", outcome_message(outcome).warning());
            Ok(())
        }
        SwitchOutcome::DefaultSinkRejected { sink, reason, .. } => {
            eyre::bail!("Could not switch to {}: {reason}", sink.name)
        }
    }
}

/// Re-detect the current output from the default sink
///
/// # Errors
/// Returns an error if `pactl` is missing or the daemon exchange fails.
pub async fn refresh(config: &Config) -> Result<()> {
    let current = if ipc::is_daemon_running().await {
        match ipc::send_request(Request::Refresh).await? {
            Response::Refreshed { current_output } => current_output,
            Response::Error { message } => eyre::bail!("Error: {message}"),
            _ => eyre::bail!("Unexpected response from daemon"),
        }
    } else {
        let pactl = Pactl::new();
        pactl.validate_tools().await?;
        SwitchController::new(pactl, config.keywords.clone())
            .refresh()
            .await
    };

    println!("{} {}", "Current output:".dim(), style::category(current));
    Ok(())
}

// ============================================================================
// Query Commands
// ============================================================================

/// List all sinks with their classification
///
/// # Errors
/// Returns an error if JSON serialization fails.
pub async fn list_sinks(config: &Config, json_output: bool) -> Result<()> {
    let mut controller = SwitchController::new(Pactl::new(), config.keywords.clone());
    controller.refresh().await;
    let snapshot = controller.snapshot().await;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("{}", "SINKS:".header());
    println!("{}", "-".repeat(6));
    if snapshot.sinks.is_empty() {
        println!("  {}", "(none)".dim());
    } else {
        for entry in &snapshot.sinks {
            let marker = if entry.is_default { "* " } else { "  " };
            println!(
                "{}{} [{}]",
                marker,
                entry.sink.name.as_str().bold(),
                style::category(entry.category)
            );
            println!("    {}", entry.label.as_str().dim());
        }
        println!("\n  {} = current default", "*".dim());
    }

    println!("\n{}", "KEYWORDS:".header());
    println!("{}", "-".repeat(9));
    println!(
        "  speaker: {}",
        config.keywords.speaker().join(", ").technical()
    );
    println!(
        "  headset: {}",
        config.keywords.headset().join(", ").technical()
    );

    if let Ok(path) = Config::get_config_path() {
        println!("\n{} {}", "Config:".dim(), path.display());
    }

    Ok(())
}

/// Format uptime in human-readable form
fn format_uptime(secs: u64) -> String {
    const SECS_PER_MINUTE: u64 = 60;
    const SECS_PER_HOUR: u64 = 3600;

    if secs < SECS_PER_MINUTE {
        return format!("{secs}s");
    }
    if secs < SECS_PER_HOUR {
        return format!("{mins}m", mins = secs / SECS_PER_MINUTE);
    }
    let hours = secs / SECS_PER_HOUR;
    let mins = (secs % SECS_PER_HOUR) / SECS_PER_MINUTE;
    if mins > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{hours}h")
    }
}

struct DaemonStatus {
    version: String,
    uptime_secs: u64,
    current_output: Category,
}

/// Show the default sink, its category and daemon state (hybrid local+IPC command)
///
/// # Errors
/// Returns an error if JSON serialization fails.
pub async fn status(config: &Config, json_output: bool) -> Result<()> {
    // Always ask the audio server directly (works with or without daemon)
    let default_sink = Pactl::new().default_sink_name().await.unwrap_or_else(|e| {
        warn!("Could not query default sink: {}", e);
        None
    });
    let detected = default_sink
        .as_deref()
        .map(|name| classify_name(name, &config.keywords));

    // Daemon status is optional
    let daemon = if ipc::is_daemon_running().await {
        match ipc::send_request(Request::Status).await {
            Ok(Response::Status {
                version,
                uptime_secs,
                current_output,
            }) => Some(DaemonStatus {
                version,
                uptime_secs,
                current_output,
            }),
            Ok(_) => None,
            Err(e) => {
                warn!("Daemon status query failed: {:#}", e);
                None
            }
        }
    } else {
        None
    };

    if json_output {
        let daemon_json = match &daemon {
            Some(d) => serde_json::json!({
                "running": true,
                "version": d.version,
                "uptime_secs": d.uptime_secs,
                "uptime_human": format_uptime(d.uptime_secs),
                "current_output": d.current_output,
            }),
            None => serde_json::json!({ "running": false }),
        };

        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "default_sink": default_sink,
                "category": detected,
                "daemon": daemon_json,
            }))?
        );
        return Ok(());
    }

    println!("{}", "Audio Output".header());
    println!("{}", "-".repeat(12));
    match (&default_sink, detected) {
        (Some(name), Some(category)) => {
            println!("{} {}", "Default sink:".dim(), name.as_str().bold());
            println!("{} {}", "Category:".dim(), style::category(category));
        }
        _ => println!("{} {}", "Default sink:".dim(), "unavailable".error()),
    }
    println!();
    println!("{}", "Daemon".header());
    println!("{}", "-".repeat(6));

    if let Some(d) = daemon {
        println!(
            "{} {}",
            "Status:".dim(),
            format!("Running (uptime: {})", format_uptime(d.uptime_secs)).success()
        );
        println!("{} {}", "Version:".dim(), d.version);
        println!("{} {}", "Remembered output:".dim(), style::category(d.current_output));
    } else {
        println!("{} {}", "Status:".dim(), "Not running".error());
        println!("  Start with: {}", "audio-toggle daemon".technical());
    }

    Ok(())
}

// ============================================================================
// IPC-only Commands (require daemon)
// ============================================================================

async fn daemon_request(request: Request) -> Result<()> {
    if !ipc::is_daemon_running().await {
        eyre::bail!("Daemon is not running. Start it with: audio-toggle daemon");
    }

    match ipc::send_request(request).await? {
        Response::Ok { message } => {
            println!("{}", message.success());
            Ok(())
        }
        Response::Error { message } => eyre::bail!("Error: {message}"),
        _ => eyre::bail!("Unexpected response from daemon"),
    }
}

/// Tell the daemon to reload its config
///
/// # Errors
/// Returns an error if no daemon is running, IPC fails, or the new config is invalid.
pub async fn reload() -> Result<()> {
    daemon_request(Request::Reload).await
}

/// Gracefully shutdown the daemon
///
/// # Errors
/// Returns an error if no daemon is running or IPC communication fails.
pub async fn shutdown() -> Result<()> {
    daemon_request(Request::Shutdown).await
}
