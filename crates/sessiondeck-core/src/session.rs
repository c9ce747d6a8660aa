//! Session types and id rules.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

lazy_static! {
    static ref SESSION_ID_SUFFIX: Regex = Regex::new(r"^(.+)-(\d+)$").unwrap();
}

/// Lifecycle state of a tracked session.
///
/// `Exited` is terminal: nothing transitions out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Created but no pid known yet
    Idle,
    /// Process reported a pid and is believed alive
    Running,
    /// Process is gone or was killed
    Exited,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Idle => write!(f, "idle"),
            SessionStatus::Running => write!(f, "running"),
            SessionStatus::Exited => write!(f, "exited"),
        }
    }
}

/// Consistent point-in-time view of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Session identifier (`<project>-<n>`)
    pub id: String,
    /// Logical project name as given by the caller
    pub project_name: String,
    /// Working directory of the session
    pub project_path: PathBuf,
    /// Current status
    pub status: SessionStatus,
    /// Process id, `0` when unknown
    pub pid: u32,
    /// Creation time
    pub started_at: DateTime<Utc>,
}

/// On-disk projection of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Session identifier
    pub id: String,
    /// Logical project name
    pub project_name: String,
    /// Working directory
    pub project_path: PathBuf,
    /// Process id reported by the launcher
    pub pid: u32,
    /// Creation time
    pub started_at: DateTime<Utc>,
}

impl From<&SessionInfo> for SessionRecord {
    fn from(info: &SessionInfo) -> Self {
        Self {
            id: info.id.clone(),
            project_name: info.project_name.clone(),
            project_path: info.project_path.clone(),
            pid: info.pid,
            started_at: info.started_at,
        }
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Replace every character outside `[A-Za-z0-9_.-]` with `_`.
///
/// The result is safe to embed in file names, shell scripts and
/// environment variables.
pub fn sanitize_project_name(name: &str) -> String {
    name.chars()
        .map(|c| if is_id_char(c) { c } else { '_' })
        .collect()
}

/// Build the id for the `counter`-th session of `project_name`.
pub fn format_session_id(project_name: &str, counter: u64) -> String {
    format!("{}-{}", sanitize_project_name(project_name), counter)
}

/// Split an id into its project prefix and numeric suffix.
///
/// Returns `None` when the id has no trailing `-<digits>` or the number
/// does not fit in a `u64`.
pub fn parse_session_suffix(id: &str) -> Option<(&str, u64)> {
    let captures = SESSION_ID_SUFFIX.captures(id)?;
    let prefix = captures.get(1)?.as_str();
    let counter = captures.get(2)?.as_str().parse().ok()?;
    Some((prefix, counter))
}

/// Reject ids that are empty, contain characters a sanitized id never
/// contains, or name a directory entry such as `..`.
pub fn validate_session_id(id: &str) -> Result<()> {
    if id.is_empty() || id == "." || id == ".." || !id.chars().all(is_id_char) {
        return Err(Error::InvalidSessionId(id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_safe_characters() {
        assert_eq!(sanitize_project_name("my-app_v1.2"), "my-app_v1.2");
    }

    #[test]
    fn test_sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_project_name("my app/$HOME"), "my_app__HOME");
        assert_eq!(sanitize_project_name("café"), "caf_");
    }

    #[test]
    fn test_format_session_id() {
        assert_eq!(format_session_id("demo", 1), "demo-1");
        assert_eq!(format_session_id("web app", 12), "web_app-12");
    }

    #[test]
    fn test_parse_session_suffix() {
        assert_eq!(parse_session_suffix("demo-3"), Some(("demo", 3)));
        assert_eq!(parse_session_suffix("my-app-42"), Some(("my-app", 42)));
        assert_eq!(parse_session_suffix("demo"), None);
        assert_eq!(parse_session_suffix("demo-"), None);
        assert_eq!(parse_session_suffix("-7"), None);
        assert_eq!(parse_session_suffix("demo-99999999999999999999999"), None);
    }

    #[test]
    fn test_validate_session_id() {
        assert!(validate_session_id("demo-1").is_ok());
        assert!(validate_session_id("").is_err());
        assert!(validate_session_id("..").is_err());
        assert!(validate_session_id("../etc/passwd").is_err());
        assert!(validate_session_id("a b-1").is_err());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SessionStatus::Idle.to_string(), "idle");
        assert_eq!(SessionStatus::Running.to_string(), "running");
        assert_eq!(SessionStatus::Exited.to_string(), "exited");
    }

    #[test]
    fn test_record_from_info() {
        let info = SessionInfo {
            id: "demo-1".to_string(),
            project_name: "demo".to_string(),
            project_path: PathBuf::from("/work/demo"),
            status: SessionStatus::Running,
            pid: 4242,
            started_at: Utc::now(),
        };
        let record = SessionRecord::from(&info);
        assert_eq!(record.id, "demo-1");
        assert_eq!(record.pid, 4242);
        assert_eq!(record.started_at, info.started_at);
    }

    #[test]
    fn test_record_json_is_self_describing() {
        let record = SessionRecord {
            id: "demo-2".to_string(),
            project_name: "demo".to_string(),
            project_path: PathBuf::from("/work/demo"),
            pid: 17,
            started_at: Utc::now(),
        };
        let json = serde_json::to_value(&record).unwrap();
        for key in ["id", "project_name", "project_path", "pid", "started_at"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        let back: SessionRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
