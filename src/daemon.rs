//! Daemon mode
//!
//! Keeps one [`SwitchController`] alive for the lifetime of the process so the
//! remembered output survives between CLI invocations.
//!
//! Each connection is read and answered in its own task, so a slow or silent
//! client never holds up anyone else. Decoded requests are passed over a channel
//! to the serving loop, the only place the controller is touched, which handles
//! them one at a time.

use color_eyre::eyre::{Context, ContextCompat, Result};
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::net::UnixStream;
use tokio::signal;
use tokio::signal::unix::{SignalKind, signal as unix_signal};
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use crate::audio::{AudioServer, Pactl};
use crate::config::{Config, Settings};
use crate::controller::{SwitchController, SwitchOutcome};
use crate::ipc::{self, IpcServer, Request, Response};
use crate::notification::notify_outcome;

/// Daemon state: the controller plus the settings it was configured with
pub struct Daemon<S> {
    controller: SwitchController<S>,
    settings: Settings,
    started: Instant,
}

impl<S: AudioServer> Daemon<S> {
    pub fn new(server: S, config: Config) -> Self {
        Self {
            controller: SwitchController::new(server, config.keywords),
            settings: config.settings,
            started: Instant::now(),
        }
    }

    #[must_use]
    pub fn controller(&self) -> &SwitchController<S> {
        &self.controller
    }

    /// Handle one IPC request; returns the response and whether to shut down
    pub async fn handle(&mut self, request: Request) -> (Response, bool) {
        debug!("IPC request: {:?}", request);

        let response = match request {
            Request::Status => Response::Status {
                version: env!("CARGO_PKG_VERSION").to_string(),
                uptime_secs: self.started.elapsed().as_secs(),
                current_output: self.controller.current_output(),
            },

            Request::Switch { category } => {
                let outcome = self.controller.switch_to(category).await;
                self.announce(&outcome);
                Response::Outcome { outcome }
            }

            Request::Toggle => {
                let outcome = self.controller.toggle().await;
                self.announce(&outcome);
                Response::Outcome { outcome }
            }

            Request::Refresh => Response::Refreshed {
                current_output: self.controller.refresh().await,
            },

            Request::Reload => self.reload(Config::load()),

            Request::Shutdown => {
                info!("Shutdown requested via IPC");
                return (
                    Response::Ok {
                        message: "Daemon shutting down...".to_string(),
                    },
                    true,
                );
            }
        };

        (response, false)
    }

    /// Apply a freshly loaded config; a failed load keeps the current one
    pub fn reload(&mut self, loaded: Result<Config>) -> Response {
        match loaded {
            Ok(config) => {
                self.controller.reload_keywords(config.keywords);
                self.settings = config.settings;
                info!("Configuration reloaded");
                Response::Ok {
                    message: "Configuration reloaded".to_string(),
                }
            }
            Err(e) => {
                warn!("Config reload failed: {:#}", e);
                Response::Error {
                    message: format!("Config reload failed: {e:#}"),
                }
            }
        }
    }

    /// Send the desktop notification off the serving loop (D-Bus calls block)
    fn announce(&self, outcome: &SwitchOutcome) -> Option<JoinHandle<()>> {
        if !self.settings.notify {
            return None;
        }
        let outcome = outcome.clone();
        Some(tokio::task::spawn_blocking(move || {
            if let Err(e) = notify_outcome(&outcome) {
                warn!("Notification failed: {}", e);
            }
        }))
    }
}

// ============================================================================
// Serving Loop
// ============================================================================

/// A decoded request and the channel its answer goes back on
type Envelope = (Request, oneshot::Sender<Response>);

/// Queued requests waiting for the controller
const REQUEST_QUEUE: usize = 16;

/// Grace period for in-flight answers (the shutdown reply) after the loop ends
const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Read one request, hand it to the serving loop, write back the answer
async fn handle_connection(mut stream: UnixStream, requests: mpsc::Sender<Envelope>) {
    let request = match ipc::read_request(&mut stream).await {
        Ok(request) => request,
        Err(e) => {
            warn!("IPC request error: {:#}", e);
            return;
        }
    };

    let (reply_tx, reply_rx) = oneshot::channel();
    if requests.send((request, reply_tx)).await.is_err() {
        debug!("Daemon stopping, dropping request");
        return;
    }
    let Ok(response) = reply_rx.await else {
        return;
    };

    if let Err(e) = ipc::write_response(&mut stream, &response).await {
        error!("IPC response error: {:#}", e);
    }
}

/// Serve IPC clients until a `Shutdown` request arrives or `shutdown` resolves
pub async fn serve<S: AudioServer>(
    ipc_server: &IpcServer,
    daemon: &mut Daemon<S>,
    shutdown: impl Future<Output = ()>,
) {
    let (request_tx, mut request_rx) = mpsc::channel::<Envelope>(REQUEST_QUEUE);
    let mut connections = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(stream) = ipc_server.accept() => {
                connections.spawn(handle_connection(stream, request_tx.clone()));
            }

            Some((request, reply)) = request_rx.recv() => {
                let (response, stop) = daemon.handle(request).await;
                // The client may have gone away; the switch still happened
                let _ = reply.send(response);
                if stop {
                    break;
                }
            }

            Some(_) = connections.join_next() => {}

            () = &mut shutdown => break,
        }
    }

    // Refuse queued work, then let answered connections finish writing
    drop(request_rx);
    let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
        while connections.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        debug!("Abandoning {} open IPC connections", connections.len());
    }
}

/// Directory for the detached daemon's log file
fn log_dir() -> Result<PathBuf> {
    let dir = dirs::state_dir()
        .or_else(dirs::cache_dir)
        .context("Could not determine state directory")?
        .join("audio-toggle");
    std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create log dir: {dir:?}"))?;
    Ok(dir)
}

/// Initialize logging: stderr in the foreground, a log file when detached
///
/// Filter format: "`audio_toggle=LEVEL`" keeps other crates quiet. `RUST_LOG` wins.
fn init_logging(config: &Config, detached: bool) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("audio_toggle={}", config.settings.log_level))
    });

    if detached {
        let appender = tracing_appender::rolling::never(log_dir()?, "daemon.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
        Ok(Some(guard))
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(None)
    }
}

/// Start the daemon in the background and return immediately
///
/// # Errors
/// Returns an error if a daemon is already running or the process cannot be spawned.
pub async fn spawn_detached() -> Result<()> {
    use std::os::unix::process::CommandExt;

    if ipc::is_daemon_running().await {
        color_eyre::eyre::bail!("Daemon is already running");
    }

    let exe = std::env::current_exe().context("Could not locate the audio-toggle binary")?;
    let child = std::process::Command::new(exe)
        .args(["daemon", "--detached"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .process_group(0)
        .spawn()
        .context("Failed to start daemon")?;

    println!("Daemon started (pid {})", child.id());
    if let Ok(dir) = log_dir() {
        println!("Logs: {}", dir.join("daemon.log").display());
    }
    Ok(())
}

/// Run the daemon until shutdown is requested or a termination signal arrives
///
/// # Errors
/// Returns an error if logging, signal handlers, or the IPC socket cannot be set up.
pub async fn run(config: Config, detached: bool) -> Result<()> {
    let _log_guard = init_logging(&config, detached)?;

    info!("Starting audio-toggle daemon");
    info!(
        "Keywords: speaker={:?} headset={:?}",
        config.keywords.speaker(),
        config.keywords.headset()
    );

    let pactl = Pactl::new();
    if let Err(e) = pactl.validate_tools().await {
        // Calls will degrade to empty results; keep serving status
        warn!("{:#}", e);
    }

    let mut daemon = Daemon::new(pactl, config);
    let current = daemon.controller.refresh().await;
    info!("Current output: {}", current);

    let ipc_server = IpcServer::bind().await?;
    info!("IPC server listening on {:?}", ipc_server.socket_path());

    if let Err(e) = sd_notify::notify(false, &[sd_notify::NotifyState::Ready]) {
        debug!("sd_notify ready failed: {}", e);
    }

    let mut sigterm =
        unix_signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    let signals = async move {
        tokio::select! {
            _ = signal::ctrl_c() => info!("Interrupted, shutting down"),
            _ = sigterm.recv() => info!("Terminated, shutting down"),
        }
    };

    serve(&ipc_server, &mut daemon, signals).await;

    let _ = sd_notify::notify(false, &[sd_notify::NotifyState::Stopping]);
    info!("Daemon stopped");
    Ok(())
}
