//! Audio server integration
//!
//! The audio server is an opaque command-execution collaborator. [`AudioServer`]
//! captures the handful of query/command primitives the switcher needs, and
//! [`Pactl`] implements them by running `pactl`, which works against both
//! `PulseAudio` and `PipeWire` (via `pipewire-pulse`).
//!
//! Every invocation is asynchronous and bounded by a timeout. Arguments are
//! passed directly as argv, never through a shell.

use std::collections::HashMap;
use std::future::Future;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::inventory::{self, StreamRecord};

// ============================================================================
// Constants
// ============================================================================

/// Default time limit for a single `pactl` call (ms)
/// Override with `AUDIO_TOGGLE_PACTL_TIMEOUT_MS` env var
const DEFAULT_PACTL_TIMEOUT_MS: u64 = 5000;

/// Get pactl timeout from env var or default
pub(crate) fn pactl_timeout_ms() -> u64 {
    std::env::var("AUDIO_TOGGLE_PACTL_TIMEOUT_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|ms| *ms > 0)
        .unwrap_or(DEFAULT_PACTL_TIMEOUT_MS)
}

// ============================================================================
// Errors
// ============================================================================

/// The audio server could not be reached or refused a command
#[derive(thiserror::Error, Debug)]
pub enum AudioError {
    /// The control utility could not be started
    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The control utility did not finish in time
    #[error("'{command}' timed out after {timeout_ms}ms")]
    Timeout { command: String, timeout_ms: u64 },

    /// The control utility exited unsuccessfully
    #[error("'{command}' failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// The control utility produced output that is not UTF-8
    #[error("'{command}' produced non-UTF-8 output")]
    InvalidOutput { command: String },
}

// ============================================================================
// Collaborator Interface
// ============================================================================

/// Query/command surface of the audio server
pub trait AudioServer {
    /// Raw short sink listing (`index \t name \t description...` per line)
    fn list_sinks(&self) -> impl Future<Output = Result<String, AudioError>> + Send;

    /// Streams currently playing
    fn list_streams(&self) -> impl Future<Output = Result<Vec<StreamRecord>, AudioError>> + Send;

    /// Make `sink_name` the default sink
    fn set_default_sink(&self, sink_name: &str)
    -> impl Future<Output = Result<(), AudioError>> + Send;

    /// Move one stream to `sink_name`
    fn move_stream(
        &self,
        stream_id: &str,
        sink_name: &str,
    ) -> impl Future<Output = Result<(), AudioError>> + Send;

    /// Name of the current default sink, if the server reports one
    fn default_sink_name(&self) -> impl Future<Output = Result<Option<String>, AudioError>> + Send;

    /// Human descriptions keyed by sink name
    ///
    /// Optional: servers without a richer listing report none.
    fn sink_descriptions(
        &self,
    ) -> impl Future<Output = Result<HashMap<String, String>, AudioError>> + Send {
        async { Ok(HashMap::new()) }
    }
}

// ============================================================================
// pactl Implementation
// ============================================================================

/// `pactl`-backed audio server
#[derive(Debug, Clone)]
pub struct Pactl {
    program: String,
    timeout: Duration,
}

impl Default for Pactl {
    fn default() -> Self {
        Self::new()
    }
}

impl Pactl {
    /// Use `pactl` from `PATH` with the configured timeout
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: "pactl".to_string(),
            timeout: Duration::from_millis(pactl_timeout_ms()),
        }
    }

    /// Use a specific control program and timeout
    #[must_use]
    pub fn with_program(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Check that the control utility can be run
    ///
    /// # Errors
    /// Returns an error with installation hints if `pactl` is missing or broken.
    pub async fn validate_tools(&self) -> color_eyre::eyre::Result<()> {
        if let Err(e) = self.run(&["--version"]).await {
            color_eyre::eyre::bail!(
                "Audio control utility unavailable: {e}\n\
                 \n\
                 Please install pactl for your distribution:\n\
                 - Arch/Manjaro: pacman -S libpulse\n\
                 - Fedora: dnf install pulseaudio-utils\n\
                 - Debian/Ubuntu: apt install pulseaudio-utils\n\
                 - openSUSE: zypper install pulseaudio-utils"
            );
        }
        Ok(())
    }

    /// Run `pactl` with `args` and return its stdout
    async fn run(&self, args: &[&str]) -> Result<String, AudioError> {
        let command = format!("{} {}", self.program, args.join(" "));
        trace!("Running: {}", command);

        let child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AudioError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| AudioError::Timeout {
                command: command.clone(),
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            })?
            .map_err(|source| AudioError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(AudioError::CommandFailed { command, stderr });
        }

        String::from_utf8(output.stdout).map_err(|_| AudioError::InvalidOutput { command })
    }
}

impl AudioServer for Pactl {
    async fn list_sinks(&self) -> Result<String, AudioError> {
        self.run(&["list", "short", "sinks"]).await
    }

    async fn list_streams(&self) -> Result<Vec<StreamRecord>, AudioError> {
        let raw = self.run(&["list", "short", "sink-inputs"]).await?;
        Ok(inventory::parse_streams(&raw))
    }

    async fn set_default_sink(&self, sink_name: &str) -> Result<(), AudioError> {
        self.run(&["set-default-sink", sink_name]).await?;
        debug!("Set default sink: {}", sink_name);
        Ok(())
    }

    async fn move_stream(&self, stream_id: &str, sink_name: &str) -> Result<(), AudioError> {
        self.run(&["move-sink-input", stream_id, sink_name]).await?;
        Ok(())
    }

    async fn default_sink_name(&self) -> Result<Option<String>, AudioError> {
        let info = self.run(&["info"]).await?;
        Ok(inventory::parse_default_sink(&info))
    }

    async fn sink_descriptions(&self) -> Result<HashMap<String, String>, AudioError> {
        let raw = self.run(&["list", "sinks"]).await?;
        Ok(inventory::parse_descriptions(&raw))
    }
}
