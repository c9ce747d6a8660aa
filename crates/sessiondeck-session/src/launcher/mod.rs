//! Terminal launching for new sessions.
//!
//! A session runs in its own terminal window (or detached multiplexer
//! session). The launcher renders a small script, asks the best available
//! terminal emulator to run it, then waits for the script to report its pid
//! through a [`PidMarker`] file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use tracing::{debug, info, warn};

use sessiondeck_core::{validate_session_id, Error, Platform, Result};

pub mod pid_marker;
pub mod registry;
pub mod script;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "windows")]
pub mod windows;

pub use pid_marker::PidMarker;
pub use registry::TerminalRegistry;

/// Environment variable carrying the session id into the launched process.
pub const SESSION_ID_ENV: &str = "SESSIONDECK_SESSION_ID";

/// Everything needed to start one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    /// Id the session will be registered under
    pub session_id: String,
    /// Directory the command runs in
    pub working_dir: PathBuf,
    /// Command and its arguments
    pub args: Vec<String>,
    /// Extra environment variables
    pub env: BTreeMap<String, String>,
}

/// Opens a terminal surface for a session and reports the pid running in it.
pub trait TerminalLauncher: Send + Sync {
    /// Launch the session and return its pid once known.
    fn launch(&self, request: &LaunchRequest) -> Result<u32>;
}

/// A terminal emulator that can run a launch script in a new window.
///
/// Implementations are selected by [`TerminalRegistry`] per platform.
pub trait TerminalEmulator: Send + Sync {
    /// Run `script` in a new terminal surface titled `title`.
    ///
    /// Returns once the emulator has been started; the script reports its
    /// own pid separately.
    fn open(&self, script: &Path, title: &str) -> Result<()>;

    /// Check if this emulator is installed on the current host.
    fn is_available(&self) -> bool;

    /// Human-readable emulator name, also used for lookup by name.
    fn name(&self) -> &'static str;

    /// Higher values win when several emulators are available.
    ///
    /// - 100: primary desktop terminal
    /// - 80: platform default behind a preferred third-party terminal
    /// - 70: modern GPU terminals
    /// - 60: PowerShell
    /// - 50: universal fallback
    /// - 40: headless multiplexer fallback
    fn priority(&self) -> u8;
}

/// Spawn an emulator process without waiting for it.
///
/// The child is reaped on a background thread so short-lived emulator
/// clients do not linger as zombies.
pub(crate) fn spawn_detached(mut command: Command, emulator: &str) -> Result<()> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| Error::TerminalUnavailable(format!("failed to spawn {emulator}: {e}")))?;

    debug!("Spawned {} (pid: {})", emulator, child.id());
    std::thread::spawn(move || {
        let _ = child.wait();
    });
    Ok(())
}

/// Launcher backed by real terminal emulators.
pub struct SystemLauncher {
    run_dir: PathBuf,
    platform: Platform,
    registry: TerminalRegistry,
    terminal: Option<String>,
    pid_timeout: Duration,
    poll_interval: Duration,
}

impl SystemLauncher {
    /// Create a launcher for the detected platform.
    ///
    /// `run_dir` holds launch scripts and PID markers.
    pub fn new(run_dir: impl Into<PathBuf>, pid_timeout: Duration) -> Self {
        let platform = Platform::detect();
        Self {
            run_dir: run_dir.into(),
            platform,
            registry: TerminalRegistry::for_platform(platform),
            terminal: None,
            pid_timeout,
            poll_interval: pid_marker::DEFAULT_POLL,
        }
    }

    /// Prefer the emulator called `name` instead of auto-detecting one.
    pub fn with_terminal(mut self, name: Option<String>) -> Self {
        self.terminal = name;
        self
    }

    /// Use a custom emulator registry.
    pub fn with_registry(mut self, registry: TerminalRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Directory holding launch scripts and PID markers.
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    fn write_script(&self, request: &LaunchRequest, marker: &PidMarker) -> Result<PathBuf> {
        let body = script::render(self.platform, request, marker.path())?;
        let path = self.run_dir.join(format!(
            "{}.{}",
            request.session_id,
            self.platform.script_extension()
        ));
        fs::write(&path, body)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o700))?;
        }

        Ok(path)
    }
}

impl TerminalLauncher for SystemLauncher {
    fn launch(&self, request: &LaunchRequest) -> Result<u32> {
        validate_session_id(&request.session_id)?;
        fs::create_dir_all(&self.run_dir)?;

        let emulator = self.registry.select(self.terminal.as_deref())?;

        let marker = PidMarker::for_session(&self.run_dir, &request.session_id);
        marker.clear()?;
        let script_path = self.write_script(request, &marker)?;

        info!(
            "Launching session {} in {} (cwd: {})",
            request.session_id,
            emulator.name(),
            request.working_dir.display()
        );

        let outcome = emulator
            .open(&script_path, &request.session_id)
            .map_err(|e| Error::LaunchFailed {
                session_id: request.session_id.clone(),
                reason: e.to_string(),
            })
            .and_then(|()| {
                marker
                    .wait(self.pid_timeout, self.poll_interval)
                    .ok_or_else(|| Error::PidTimeout {
                        session_id: request.session_id.clone(),
                        timeout_ms: u64::try_from(self.pid_timeout.as_millis())
                            .unwrap_or(u64::MAX),
                    })
            });

        if let Err(e) = fs::remove_file(&script_path) {
            warn!("Failed to remove launch script {}: {}", script_path.display(), e);
        }
        if let Err(e) = marker.clear() {
            warn!("Failed to remove pid marker {}: {}", marker.path().display(), e);
        }

        let pid = outcome?;
        info!("Session {} reported pid {}", request.session_id, pid);
        Ok(pid)
    }
}
