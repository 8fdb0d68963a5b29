//! Command-line interface definitions
//!
//! Uses clap for argument parsing with derive macros.

use clap::{Parser, Subcommand};

/// Audio Toggle
///
/// Flip the default audio output between speakers and a headset.
#[derive(Parser)]
#[command(name = "audio-toggle")]
#[command(version)]
#[command(about = "Toggle the default audio output between speakers and a headset")]
#[command(after_help = "\
BEHAVIOR:
  - Sinks are classified by keyword: headset keywords win over speaker keywords
  - toggle switches to headset from speakers, otherwise to speakers
  - If no headset is present, nothing changes
  - If no speaker matches, the first listed sink is used instead
  - Playing streams are moved to the new default sink

SWITCH COMMANDS:
  audio-toggle toggle            Flip between speakers and headset
  audio-toggle speaker           Switch to speakers
  audio-toggle headset           Switch to headset
  audio-toggle refresh           Re-detect the output from the default sink

DAEMON MANAGEMENT:
  audio-toggle daemon              Run the daemon in background (detached)
  audio-toggle daemon --foreground Run in foreground with logs to stderr
  audio-toggle status              Query output and daemon status (or just: audio-toggle)
  audio-toggle reload              Tell daemon to reload config
  audio-toggle shutdown            Gracefully stop the daemon

  Switch commands go through the daemon when it is running, so the
  remembered output survives between invocations.

QUERY COMMANDS:
  audio-toggle list-sinks        List sinks and how they are classified
  audio-toggle validate          Validate config file (local, no daemon needed)

IPC SOCKET:
  $XDG_RUNTIME_DIR/audio-toggle.sock (or /tmp/audio-toggle-$UID.sock)

AUDIO SERVER:
  Uses pactl, so PulseAudio and PipeWire (pipewire-pulse) both work.")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Toggle between speakers and headset
    Toggle,

    /// Switch to the speakers
    Speaker,

    /// Switch to the headset
    Headset,

    /// Re-detect the current output from the default sink
    Refresh,

    /// Show the current output and daemon status
    Status {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List sinks with their classification
    ListSinks {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Validate config file
    Validate,

    /// Run the daemon (keeps the remembered output between commands)
    Daemon {
        /// Run in foreground with logs to stderr
        #[arg(short, long)]
        foreground: bool,

        /// Started by `daemon` itself; log to file instead of stderr
        #[arg(long, hide = true, conflicts_with = "foreground")]
        detached: bool,
    },

    /// Tell daemon to reload config file
    Reload,

    /// Gracefully shutdown the daemon
    Shutdown,
}
