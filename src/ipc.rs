//! IPC infrastructure for daemon communication
//!
//! Provides Unix socket-based IPC for CLI commands to reach the running daemon.
//! Uses length-prefixed JSON messages for protocol framing.

use color_eyre::eyre::{self, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, warn};

use crate::classify::Category;
use crate::controller::SwitchOutcome;

// ============================================================================
// Message Types
// ============================================================================

/// Requests sent from CLI to daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Query daemon status
    Status,
    /// Switch to a category
    Switch { category: Category },
    /// Toggle between speaker and headset
    Toggle,
    /// Re-detect the current output from the default sink
    Refresh,
    /// Reload keywords from the config file
    Reload,
    /// Gracefully shutdown the daemon
    Shutdown,
}

/// Responses sent from daemon to CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    /// Status information
    Status {
        version: String,
        uptime_secs: u64,
        current_output: Category,
    },
    /// Result of a switch or toggle
    Outcome { outcome: SwitchOutcome },
    /// Result of a refresh
    Refreshed { current_output: Category },
    /// Generic success response
    Ok { message: String },
    /// Error response
    Error { message: String },
}

// ============================================================================
// Socket Path Management
// ============================================================================

/// Get the IPC socket path
///
/// Prefers `$XDG_RUNTIME_DIR/audio-toggle.sock`, falls back to
/// `/tmp/audio-toggle-$UID.sock` so users never share a socket.
#[must_use]
pub fn get_socket_path() -> PathBuf {
    match std::env::var_os("XDG_RUNTIME_DIR") {
        Some(runtime_dir) if !runtime_dir.is_empty() => {
            PathBuf::from(runtime_dir).join("audio-toggle.sock")
        }
        _ => PathBuf::from(format!(
            "/tmp/audio-toggle-{}.sock",
            users::get_current_uid()
        )),
    }
}

/// Check whether a daemon is accepting connections
pub async fn is_daemon_running() -> bool {
    let socket_path = get_socket_path();
    matches!(
        tokio::time::timeout(Duration::from_millis(100), UnixStream::connect(&socket_path)).await,
        Ok(Ok(_))
    )
}

/// Remove a socket file left behind by a daemon that is no longer running
async fn cleanup_stale_socket(socket_path: &Path) -> Result<()> {
    if !socket_path.exists() {
        return Ok(());
    }

    match tokio::time::timeout(Duration::from_millis(100), UnixStream::connect(socket_path)).await
    {
        Ok(Ok(_)) => eyre::bail!("Another daemon is already running (socket: {socket_path:?})"),
        Ok(Err(_)) | Err(_) => {
            debug!("Removing stale socket: {:?}", socket_path);
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove stale socket: {socket_path:?}"))?;
            Ok(())
        }
    }
}

// ============================================================================
// Protocol Helpers
// ============================================================================

const MAX_MESSAGE_SIZE: usize = 1024 * 1024; // 1MB max message size
const READ_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Sequential `pactl` calls in the longest request (a switch): list sinks,
/// set default, list streams, the concurrent moves, descriptions
const PACTL_STAGES_PER_SWITCH: u32 = 5;

/// How long a client waits for the daemon's answer
///
/// Must outlast a switch in which every `pactl` call runs into its timeout,
/// otherwise the CLI reports a failure for a switch the daemon completes.
fn response_timeout(pactl_timeout: Duration) -> Duration {
    pactl_timeout * PACTL_STAGES_PER_SWITCH + READ_TIMEOUT
}

/// Read a length-prefixed JSON message from a stream
async fn read_message<T: for<'de> Deserialize<'de>>(
    stream: &mut UnixStream,
    timeout: Duration,
) -> Result<T> {
    // 4-byte big-endian length prefix
    let mut len_buf = [0u8; 4];
    tokio::time::timeout(timeout, stream.read_exact(&mut len_buf))
        .await
        .context("Timeout reading message length")?
        .context("Failed to read message length")?;

    let msg_len = u32::from_be_bytes(len_buf) as usize;

    if msg_len > MAX_MESSAGE_SIZE {
        eyre::bail!("Message too large: {msg_len} bytes (max: {MAX_MESSAGE_SIZE})");
    }

    let mut msg_buf = vec![0u8; msg_len];
    tokio::time::timeout(timeout, stream.read_exact(&mut msg_buf))
        .await
        .context("Timeout reading message payload")?
        .context("Failed to read message payload")?;

    serde_json::from_slice(&msg_buf).context("Failed to deserialize message")
}

/// Write a length-prefixed JSON message to a stream
async fn write_message<T: Serialize>(stream: &mut UnixStream, message: &T) -> Result<()> {
    let json = serde_json::to_vec(message).context("Failed to serialize message")?;

    if json.len() > MAX_MESSAGE_SIZE {
        eyre::bail!(
            "Message too large: {} bytes (max: {MAX_MESSAGE_SIZE})",
            json.len()
        );
    }

    let len = (json.len() as u32).to_be_bytes();
    stream
        .write_all(&len)
        .await
        .context("Failed to write message length")?;
    stream
        .write_all(&json)
        .await
        .context("Failed to write message payload")?;
    stream.flush().await.context("Failed to flush stream")?;

    Ok(())
}

// ============================================================================
// IPC Client (for CLI commands)
// ============================================================================

/// Send a request to the daemon and wait for its response
///
/// # Errors
/// Returns an error if the daemon cannot be reached or the exchange fails.
pub async fn send_request(request: Request) -> Result<Response> {
    send_request_at(&get_socket_path(), request).await
}

/// Send a request to the daemon listening on `socket_path`
///
/// # Errors
/// Returns an error if the daemon cannot be reached or the exchange fails.
pub async fn send_request_at(socket_path: &Path, request: Request) -> Result<Response> {
    let mut stream = tokio::time::timeout(CONNECT_TIMEOUT, UnixStream::connect(socket_path))
        .await
        .context("Timeout connecting to daemon")?
        .with_context(|| {
            format!("Failed to connect to daemon. Is the daemon running?\nSocket: {socket_path:?}")
        })?;

    debug!("Connected to daemon at {:?}", socket_path);

    write_message(&mut stream, &request).await?;
    let timeout = response_timeout(Duration::from_millis(crate::audio::pactl_timeout_ms()));
    read_message(&mut stream, timeout).await
}

// ============================================================================
// IPC Server (for daemon)
// ============================================================================

/// Handle for the IPC server running in the daemon
pub struct IpcServer {
    listener: UnixListener,
    socket_path: PathBuf,
}

impl IpcServer {
    /// Bind the IPC socket at the default path
    ///
    /// # Errors
    /// Returns an error if another daemon owns the socket or binding fails.
    pub async fn bind() -> Result<Self> {
        Self::bind_at(get_socket_path()).await
    }

    /// Bind the IPC socket at a specific path
    ///
    /// # Errors
    /// Returns an error if another daemon owns the socket or binding fails.
    pub async fn bind_at(socket_path: PathBuf) -> Result<Self> {
        cleanup_stale_socket(&socket_path).await?;

        let listener = UnixListener::bind(&socket_path)
            .with_context(|| format!("Failed to bind IPC socket: {socket_path:?}"))?;

        debug!("IPC server listening on {:?}", socket_path);

        Ok(Self {
            listener,
            socket_path,
        })
    }

    /// Accept the next incoming connection
    /// Returns None if accept fails (non-fatal)
    pub async fn accept(&self) -> Option<UnixStream> {
        match self.listener.accept().await {
            Ok((stream, _addr)) => Some(stream),
            Err(e) => {
                error!("Failed to accept IPC connection: {}", e);
                None
            }
        }
    }

    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.socket_path) {
            warn!("Failed to remove IPC socket on shutdown: {}", e);
        } else {
            debug!("Removed IPC socket: {:?}", self.socket_path);
        }
    }
}

/// Read a request from a client connection
///
/// # Errors
/// Returns an error on timeout, oversized or malformed messages.
pub async fn read_request(stream: &mut UnixStream) -> Result<Request> {
    read_message(stream, READ_TIMEOUT).await
}

/// Write a response to a client connection
///
/// # Errors
/// Returns an error if the response cannot be serialized or written.
pub async fn write_response(stream: &mut UnixStream, response: &Response) -> Result<()> {
    write_message(stream, response).await
}
