//! Process liveness probing and termination.

use sessiondeck_core::{Error, Result};

/// Answers "is this pid alive" and "ask this pid to stop".
///
/// Implementations must not block for long and must treat a pid that does
/// not exist as simply not alive.
pub trait ProcessProber: Send + Sync {
    /// Whether `pid` still refers to a live process.
    fn is_alive(&self, pid: u32) -> bool;

    /// Request graceful termination of `pid`.
    ///
    /// Success means the request was delivered, not that the process is gone.
    fn terminate(&self, pid: u32) -> Result<()>;
}

/// Prober backed by the host operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProber;

impl SystemProber {
    /// Create a new system prober.
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
fn to_pid_t(pid: u32) -> Option<libc::pid_t> {
    // 0 and negative values address process groups, never a single process.
    if pid == 0 {
        return None;
    }
    libc::pid_t::try_from(pid).ok()
}

#[cfg(unix)]
impl ProcessProber for SystemProber {
    fn is_alive(&self, pid: u32) -> bool {
        let Some(raw) = to_pid_t(pid) else {
            return false;
        };

        let rc = unsafe { libc::kill(raw, 0) };
        if rc == 0 {
            return true;
        }
        // EPERM: the process exists but belongs to someone else.
        std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
    }

    fn terminate(&self, pid: u32) -> Result<()> {
        let Some(raw) = to_pid_t(pid) else {
            return Err(Error::Terminate {
                pid,
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "pid is not a single process",
                ),
            });
        };

        let rc = unsafe { libc::kill(raw, libc::SIGTERM) };
        if rc == 0 {
            tracing::debug!("Sent SIGTERM to pid {}", pid);
            Ok(())
        } else {
            Err(Error::Terminate {
                pid,
                source: std::io::Error::last_os_error(),
            })
        }
    }
}

#[cfg(windows)]
impl ProcessProber for SystemProber {
    fn is_alive(&self, pid: u32) -> bool {
        use std::process::Command;

        if pid == 0 {
            return false;
        }

        Command::new("tasklist")
            .args(["/FI", &format!("PID eq {pid}"), "/NH", "/FO", "CSV"])
            .output()
            .map(|output| {
                String::from_utf8_lossy(&output.stdout).contains(&format!("\"{pid}\""))
            })
            .unwrap_or(false)
    }

    fn terminate(&self, pid: u32) -> Result<()> {
        use std::process::Command;

        if pid == 0 {
            return Err(Error::Terminate {
                pid,
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "pid 0 is the system idle process",
                ),
            });
        }

        let pid_arg = pid.to_string();
        let graceful = Command::new("taskkill")
            .args(["/PID", &pid_arg, "/T"])
            .output()
            .map_err(|source| Error::Terminate { pid, source })?;
        if graceful.status.success() {
            return Ok(());
        }

        // Console processes without a window ignore the polite request.
        tracing::debug!("taskkill without /F refused for pid {}, forcing", pid);
        let forced = Command::new("taskkill")
            .args(["/PID", &pid_arg, "/T", "/F"])
            .output()
            .map_err(|source| Error::Terminate { pid, source })?;
        if forced.status.success() {
            Ok(())
        } else {
            Err(Error::Terminate {
                pid,
                source: std::io::Error::other(
                    String::from_utf8_lossy(&forced.stderr).trim().to_string(),
                ),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_zero_is_never_alive() {
        assert!(!SystemProber::new().is_alive(0));
    }

    #[test]
    fn test_pid_zero_is_never_signalled() {
        let result = SystemProber::new().terminate(0);
        assert!(matches!(result, Err(Error::Terminate { pid: 0, .. })));
    }

    #[test]
    fn test_current_process_is_alive() {
        assert!(SystemProber::new().is_alive(std::process::id()));
    }

    #[cfg(unix)]
    #[test]
    fn test_out_of_range_pid_is_not_alive() {
        assert!(!SystemProber::new().is_alive(u32::MAX));
    }

    #[cfg(unix)]
    #[test]
    fn test_reaped_child_is_not_alive() {
        let mut child = std::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .unwrap();
        let pid = child.id();
        let prober = SystemProber::new();
        assert!(prober.is_alive(pid));

        child.kill().unwrap();
        child.wait().unwrap();
        assert!(!prober.is_alive(pid));
    }

    #[cfg(unix)]
    #[test]
    fn test_terminate_delivers_sigterm() {
        use std::os::unix::process::ExitStatusExt;

        let mut child = std::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .unwrap();

        SystemProber::new().terminate(child.id()).unwrap();
        let status = child.wait().unwrap();
        assert_eq!(status.signal(), Some(libc::SIGTERM));
    }
}
