//! Error types for sessiondeck.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for sessiondeck operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Session not found
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Session id is empty or unsafe to use as a file name
    #[error("Invalid session id: {0:?}")]
    InvalidSessionId(String),

    /// The terminal launcher could not start the session
    #[error("Failed to launch session {session_id}: {reason}")]
    LaunchFailed {
        /// Session the launch was for
        session_id: String,
        /// Launcher-provided reason
        reason: String,
    },

    /// The launched process never reported its pid
    #[error("Session {session_id} did not report a pid within {timeout_ms}ms")]
    PidTimeout {
        /// Session the launch was for
        session_id: String,
        /// How long the marker file was polled for
        timeout_ms: u64,
    },

    /// No usable terminal emulator on this host
    #[error("Terminal unavailable: {0}")]
    TerminalUnavailable(String),

    /// Sending the termination request failed
    #[error("Failed to terminate pid {pid}: {source}")]
    Terminate {
        /// Target process
        pid: u32,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// Directory is not inside a git working tree
    #[error("Not under version control: {}", .0.display())]
    NotVersionControlled(PathBuf),

    /// A git invocation exited unsuccessfully
    #[error("git {command} failed in {}: {stderr}", .dir.display())]
    Git {
        /// Git arguments, space separated
        command: String,
        /// Directory git ran in
        dir: PathBuf,
        /// Trimmed stderr output
        stderr: String,
    },

    /// Restoring a single path failed
    #[error("Rollback of {path} failed: {reason}")]
    Rollback {
        /// Path relative to the checkpoint directory
        path: String,
        /// What went wrong
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input or parameters (generic)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_not_found_error() {
        let err = Error::SessionNotFound("demo-1".to_string());
        assert_eq!(err.to_string(), "Session not found: demo-1");
    }

    #[test]
    fn test_invalid_session_id_error() {
        let err = Error::InvalidSessionId("../x".to_string());
        assert_eq!(err.to_string(), "Invalid session id: \"../x\"");
    }

    #[test]
    fn test_launch_failed_error() {
        let err = Error::LaunchFailed {
            session_id: "demo-3".to_string(),
            reason: "no terminal".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to launch session demo-3: no terminal");
    }

    #[test]
    fn test_pid_timeout_error() {
        let err = Error::PidTimeout {
            session_id: "demo-1".to_string(),
            timeout_ms: 10000,
        };
        assert_eq!(
            err.to_string(),
            "Session demo-1 did not report a pid within 10000ms"
        );
    }

    #[test]
    fn test_terminate_error_keeps_source() {
        let err = Error::Terminate {
            pid: 42,
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().starts_with("Failed to terminate pid 42:"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_not_version_controlled_error() {
        let err = Error::NotVersionControlled(PathBuf::from("/tmp/plain"));
        assert_eq!(err.to_string(), "Not under version control: /tmp/plain");
    }

    #[test]
    fn test_git_error() {
        let err = Error::Git {
            command: "rev-parse HEAD".to_string(),
            dir: PathBuf::from("/repo"),
            stderr: "fatal: bad revision".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "git rev-parse HEAD failed in /repo: fatal: bad revision"
        );
    }

    #[test]
    fn test_rollback_error() {
        let err = Error::Rollback {
            path: "src/lib.rs".to_string(),
            reason: "permission denied".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Rollback of src/lib.rs failed: permission denied"
        );
    }

    #[test]
    fn test_config_error() {
        let err = Error::Config("monitor.poll_interval_ms must be > 0".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: monitor.poll_interval_ms must be > 0"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_serialization_error_conversion() {
        let json_err = serde_json::from_str::<i32>("invalid json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_invalid_input_error() {
        let err = Error::InvalidInput("no command given".to_string());
        assert_eq!(err.to_string(), "Invalid input: no command given");
    }
}
