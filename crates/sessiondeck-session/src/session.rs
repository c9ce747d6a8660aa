//! A session tracked by the manager.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use sessiondeck_core::{SessionInfo, SessionRecord, SessionStatus};

/// Mutable part of a session, guarded by the per-session lock.
#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) status: SessionStatus,
    pub(crate) pid: u32,
}

/// One running (or finished) command in its own terminal.
///
/// Identity fields never change after construction. `status` and `pid` sit
/// behind a lock so the monitor, `kill` and `refresh_status` always observe
/// and leave a consistent pair.
#[derive(Debug)]
pub struct Session {
    id: String,
    project_name: String,
    project_path: PathBuf,
    started_at: DateTime<Utc>,
    state: Mutex<SessionState>,
}

impl Session {
    pub(crate) fn running(
        id: String,
        project_name: String,
        project_path: PathBuf,
        pid: u32,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            project_name,
            project_path,
            started_at,
            state: Mutex::new(SessionState {
                status: SessionStatus::Running,
                pid,
            }),
        }
    }

    pub(crate) fn from_record(record: SessionRecord) -> Self {
        Self::running(
            record.id,
            record.project_name,
            record.project_path,
            record.pid,
            record.started_at,
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn status(&self) -> SessionStatus {
        self.lock_state().status
    }

    pub fn pid(&self) -> u32 {
        self.lock_state().pid
    }

    /// Snapshot taken under the session lock.
    pub fn info(&self) -> SessionInfo {
        let state = self.lock_state();
        SessionInfo {
            id: self.id.clone(),
            project_name: self.project_name.clone(),
            project_path: self.project_path.clone(),
            status: state.status,
            pid: state.pid,
            started_at: self.started_at,
        }
    }

    pub fn record(&self) -> SessionRecord {
        SessionRecord::from(&self.info())
    }

    /// Move a running session to `Exited`.
    ///
    /// Returns `true` only for the caller that performed the transition.
    pub(crate) fn mark_exited(&self) -> bool {
        let mut state = self.lock_state();
        if state.status != SessionStatus::Running {
            return false;
        }
        state.status = SessionStatus::Exited;
        true
    }

    /// A poisoned lock still holds a valid status/pid pair, so recover it.
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
