//! PID marker files written by launched sessions.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use sessiondeck_core::Result;

/// Default delay between marker polls.
pub const DEFAULT_POLL: Duration = Duration::from_millis(50);

/// Well-known file a launched process writes its own pid into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidMarker {
    path: PathBuf,
}

impl PidMarker {
    /// Marker for `session_id` inside `run_dir`.
    pub fn for_session(run_dir: &Path, session_id: &str) -> Self {
        Self {
            path: run_dir.join(format!("{session_id}.pid")),
        }
    }

    /// Location of the marker file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove a leftover marker. Absence is fine.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Pid currently in the marker, if it holds a complete positive number.
    pub fn read(&self) -> Option<u32> {
        let raw = fs::read_to_string(&self.path).ok()?;
        match raw.trim().parse::<u32>() {
            Ok(pid) if pid > 0 => Some(pid),
            _ => None,
        }
    }

    /// Poll for the marker until it holds a pid or `timeout` elapses.
    pub fn wait(&self, timeout: Duration, poll: Duration) -> Option<u32> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(pid) = self.read() {
                return Some(pid);
            }

            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            std::thread::sleep(poll.min(deadline - now));
        }
    }
}
