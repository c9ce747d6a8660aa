//! Per-session exit monitors.

use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use sessiondeck_core::SessionStatus;

use crate::liveness::ProcessProber;
use crate::session::Session;
use crate::store::SessionStore;

/// What a monitor needs besides the session itself.
#[derive(Clone)]
pub(crate) struct MonitorContext {
    pub(crate) prober: Arc<dyn ProcessProber>,
    pub(crate) store: Arc<SessionStore>,
    pub(crate) interval: Duration,
}

/// Start a background thread that polls `session` until its process dies.
///
/// The thread only holds a weak reference, so dropping the session (or the
/// whole manager) ends it at the next tick.
pub(crate) fn spawn(session: &Arc<Session>, context: MonitorContext) {
    let weak = Arc::downgrade(session);
    let id = session.id().to_string();

    let spawned = thread::Builder::new()
        .name(format!("monitor-{id}"))
        .spawn(move || watch(weak, context));

    match spawned {
        Ok(_) => debug!("Monitoring session {}", id),
        Err(e) => warn!(
            "Failed to start monitor for session {}: {}; exit will only be seen on refresh",
            id, e
        ),
    }
}

fn watch(weak: Weak<Session>, context: MonitorContext) {
    loop {
        thread::sleep(context.interval);

        let Some(session) = weak.upgrade() else {
            return;
        };

        let pid = {
            let state = session.lock_state();
            if state.status != SessionStatus::Running {
                return;
            }
            state.pid
        };

        if context.prober.is_alive(pid) {
            continue;
        }

        if session.mark_exited() {
            info!("Session {} exited (pid: {}, seen by monitor)", session.id(), pid);
            if let Err(e) = context.store.delete_record(session.id()) {
                warn!("Failed to delete record for {}: {}", session.id(), e);
            }
        }
        return;
    }
}
