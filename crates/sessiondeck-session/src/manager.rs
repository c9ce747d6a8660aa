//! Session manager: the authoritative registry of running sessions.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use sessiondeck_core::{
    format_session_id, parse_session_suffix, sanitize_project_name, validate_session_id, Config,
    Error, Result, SessionInfo, SessionStatus,
};

use crate::launcher::{LaunchRequest, TerminalLauncher};
use crate::liveness::ProcessProber;
use crate::monitor::{self, MonitorContext};
use crate::session::Session;
use crate::store::SessionStore;

/// Configuration for the session manager.
#[derive(Debug, Clone)]
pub struct SessionManagerConfig {
    /// Directory holding one record per live session
    pub sessions_dir: PathBuf,

    /// How often each monitor probes its session
    pub poll_interval: Duration,
}

impl SessionManagerConfig {
    /// Default poll interval of two seconds.
    pub fn new(sessions_dir: impl Into<PathBuf>) -> Self {
        Self {
            sessions_dir: sessions_dir.into(),
            poll_interval: Duration::from_secs(2),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            sessions_dir: config.sessions_dir(),
            poll_interval: config.monitor.poll_interval(),
        }
    }
}

#[derive(Default)]
struct Registry {
    sessions: HashMap<String, Arc<Session>>,
    /// Last issued suffix per sanitized project name
    counters: BTreeMap<String, u64>,
}

impl Registry {
    fn seed_counter(&mut self, prefix: &str, value: u64) {
        let counter = self.counters.entry(prefix.to_string()).or_insert(0);
        *counter = (*counter).max(value);
    }
}

/// Owns every session started through it or recovered at startup.
///
/// The session map and id counters share one lock. Reads take it shared;
/// id allocation, registration and removal take it exclusively. Each
/// session's status is additionally guarded by its own lock.
pub struct SessionManager {
    registry: RwLock<Registry>,
    store: Arc<SessionStore>,
    launcher: Arc<dyn TerminalLauncher>,
    prober: Arc<dyn ProcessProber>,
    poll_interval: Duration,
}

impl SessionManager {
    /// Create a manager and recover sessions persisted by a previous run.
    ///
    /// Records whose process is gone are deleted. Live ones are tracked
    /// again and get a fresh monitor.
    pub fn new(
        config: SessionManagerConfig,
        launcher: Arc<dyn TerminalLauncher>,
        prober: Arc<dyn ProcessProber>,
    ) -> Self {
        let manager = Self {
            registry: RwLock::new(Registry::default()),
            store: Arc::new(SessionStore::new(config.sessions_dir)),
            launcher,
            prober,
            poll_interval: config.poll_interval,
        };
        manager.recover();
        manager
    }

    fn read_registry(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_registry(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn monitor_context(&self) -> MonitorContext {
        MonitorContext {
            prober: Arc::clone(&self.prober),
            store: Arc::clone(&self.store),
            interval: self.poll_interval,
        }
    }

    fn recover(&self) {
        let records = self.store.read_all_records();
        let mut recovered = Vec::new();

        {
            let mut registry = self.write_registry();
            for (prefix, value) in self.store.read_counters() {
                registry.seed_counter(&prefix, value);
            }

            for record in records {
                if let Err(e) = validate_session_id(&record.id) {
                    warn!("Ignoring session record: {}", e);
                    continue;
                }
                if let Some((prefix, value)) = parse_session_suffix(&record.id) {
                    registry.seed_counter(prefix, value);
                }

                if record.pid == 0 || !self.prober.is_alive(record.pid) {
                    info!(
                        "Discarding stale session {} (pid: {})",
                        record.id, record.pid
                    );
                    self.forget_record(&record.id);
                    continue;
                }

                info!("Recovered session {} (pid: {})", record.id, record.pid);
                let session = Arc::new(Session::from_record(record));
                registry
                    .sessions
                    .insert(session.id().to_string(), Arc::clone(&session));
                recovered.push(session);
            }
        }

        for session in &recovered {
            monitor::spawn(session, self.monitor_context());
        }
    }

    fn forget_record(&self, id: &str) {
        if let Err(e) = self.store.delete_record(id) {
            warn!("Failed to delete record for {}: {}", id, e);
        }
    }

    fn allocate_id(&self, project_name: &str) -> String {
        let prefix = sanitize_project_name(project_name);
        let mut registry = self.write_registry();

        let counter = registry.counters.entry(prefix.clone()).or_insert(0);
        *counter += 1;
        let id = format_session_id(&prefix, *counter);

        if let Err(e) = self.store.write_counters(&registry.counters) {
            warn!("Failed to persist id counters: {}", e);
        }
        id
    }

    /// Launch `args` in a new terminal and track it as a session of
    /// `project_name`.
    ///
    /// On failure nothing is registered or persisted; the allocated id is
    /// not reused.
    pub fn start(
        &self,
        project_name: &str,
        project_path: impl AsRef<Path>,
        args: &[String],
        env: &BTreeMap<String, String>,
    ) -> Result<SessionInfo> {
        if project_name.trim().is_empty() {
            return Err(Error::InvalidInput("project name is empty".to_string()));
        }
        if args.is_empty() {
            return Err(Error::InvalidInput("no command given".to_string()));
        }

        let session_id = self.allocate_id(project_name);
        let request = LaunchRequest {
            session_id: session_id.clone(),
            working_dir: project_path.as_ref().to_path_buf(),
            args: args.to_vec(),
            env: env.clone(),
        };

        let pid = self.launcher.launch(&request).map_err(|e| match e {
            Error::LaunchFailed { .. } | Error::PidTimeout { .. } => e,
            other => Error::LaunchFailed {
                session_id: session_id.clone(),
                reason: other.to_string(),
            },
        })?;
        if pid == 0 {
            return Err(Error::LaunchFailed {
                session_id,
                reason: "launcher reported pid 0".to_string(),
            });
        }

        let session = Arc::new(Session::running(
            session_id,
            project_name.to_string(),
            request.working_dir,
            pid,
            Utc::now(),
        ));

        {
            let mut registry = self.write_registry();
            registry
                .sessions
                .insert(session.id().to_string(), Arc::clone(&session));
            // The process is already running; keep tracking it in memory.
            if let Err(e) = self.store.write_record(&session.record()) {
                warn!("Failed to persist session {}: {}", session.id(), e);
            }
        }

        monitor::spawn(&session, self.monitor_context());
        info!(
            "Started session {} for project {} (pid: {})",
            session.id(),
            project_name,
            pid
        );
        Ok(session.info())
    }

    /// Terminate the session `id`.
    ///
    /// Unknown and already exited sessions are a no-op. The session is
    /// marked exited and its record removed even when the termination
    /// request fails; that failure is still returned.
    pub fn kill(&self, id: &str) -> Result<()> {
        let session = self.read_registry().sessions.get(id).cloned();
        match session {
            Some(session) => self.kill_session(&session),
            None => {
                debug!("Kill requested for unknown session {}", id);
                Ok(())
            }
        }
    }

    fn kill_session(&self, session: &Session) -> Result<()> {
        let mut state = session.lock_state();
        if state.status != SessionStatus::Running {
            return Ok(());
        }

        let result = self.prober.terminate(state.pid);
        state.status = SessionStatus::Exited;
        let pid = state.pid;
        drop(state);

        match &result {
            Ok(()) => info!("Killed session {} (pid: {})", session.id(), pid),
            Err(e) => warn!("Session {} marked exited: {}", session.id(), e),
        }
        self.forget_record(session.id());
        result
    }

    /// Kill every running session of `project_name`.
    ///
    /// All matching sessions are attempted; the first failure is returned.
    pub fn kill_by_project(&self, project_name: &str) -> Result<()> {
        let registry = self.write_registry();
        let mut first_error = None;

        for session in registry
            .sessions
            .values()
            .filter(|s| s.project_name() == project_name)
        {
            if let Err(e) = self.kill_session(session) {
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    fn snapshot<F>(&self, filter: F) -> Vec<SessionInfo>
    where
        F: Fn(&SessionInfo) -> bool,
    {
        let mut infos: Vec<SessionInfo> = self
            .read_registry()
            .sessions
            .values()
            .map(|session| session.info())
            .filter(|info| filter(info))
            .collect();
        infos.sort_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.id.cmp(&b.id)));
        infos
    }

    /// Sessions of `project_name` in any state, oldest first.
    pub fn list_by_project(&self, project_name: &str) -> Vec<SessionInfo> {
        self.snapshot(|info| info.project_name == project_name)
    }

    /// Running sessions of `project_name`, oldest first.
    pub fn list_running_by_project(&self, project_name: &str) -> Vec<SessionInfo> {
        self.snapshot(|info| {
            info.project_name == project_name && info.status == SessionStatus::Running
        })
    }

    /// Every tracked session, oldest first.
    pub fn list_all(&self) -> Vec<SessionInfo> {
        self.snapshot(|_| true)
    }

    pub fn get(&self, id: &str) -> Option<SessionInfo> {
        self.read_registry()
            .sessions
            .get(id)
            .map(|session| session.info())
    }

    pub fn running_count(&self) -> usize {
        self.read_registry()
            .sessions
            .values()
            .filter(|session| session.status() == SessionStatus::Running)
            .count()
    }

    /// Probe every running session now instead of waiting for its monitor.
    ///
    /// Returns how many sessions were found dead.
    pub fn refresh_status(&self) -> usize {
        let running: Vec<Arc<Session>> = self
            .read_registry()
            .sessions
            .values()
            .filter(|session| session.status() == SessionStatus::Running)
            .cloned()
            .collect();

        let mut exited = 0;
        for session in running {
            let pid = session.pid();
            if self.prober.is_alive(pid) {
                continue;
            }
            if session.mark_exited() {
                info!("Session {} exited (pid: {}, seen on refresh)", session.id(), pid);
                self.forget_record(session.id());
                exited += 1;
            }
        }
        exited
    }

    /// Drop exited sessions from the registry. Returns how many were removed.
    pub fn clean_exited(&self) -> usize {
        let mut registry = self.write_registry();
        let before = registry.sessions.len();
        registry
            .sessions
            .retain(|_, session| session.status() != SessionStatus::Exited);
        let removed = before - registry.sessions.len();
        if removed > 0 {
            debug!("Removed {} exited sessions", removed);
        }
        removed
    }
}
