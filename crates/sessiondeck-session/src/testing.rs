//! In-memory launcher and prober for exercising the session manager
//! without opening terminals or signalling real processes.

use std::collections::HashSet;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use sessiondeck_core::{Error, Result};

use crate::launcher::{LaunchRequest, TerminalLauncher};
use crate::liveness::ProcessProber;

/// Prober over a set of pids the test declares alive.
#[derive(Debug, Default)]
pub struct FakeProber {
    alive: Mutex<HashSet<u32>>,
    terminated: Mutex<Vec<u32>>,
    fail_terminate: AtomicBool,
}

impl FakeProber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `pid` alive.
    pub fn spawn(&self, pid: u32) {
        self.alive.lock().unwrap().insert(pid);
    }

    /// Make `pid` die as if it exited on its own.
    pub fn exit(&self, pid: u32) {
        self.alive.lock().unwrap().remove(&pid);
    }

    /// Pids passed to [`ProcessProber::terminate`], in call order.
    pub fn terminated(&self) -> Vec<u32> {
        self.terminated.lock().unwrap().clone()
    }

    /// Make every later `terminate` call fail.
    pub fn fail_terminate(&self, fail: bool) {
        self.fail_terminate.store(fail, Ordering::SeqCst);
    }
}

impl ProcessProber for FakeProber {
    fn is_alive(&self, pid: u32) -> bool {
        self.alive.lock().unwrap().contains(&pid)
    }

    fn terminate(&self, pid: u32) -> Result<()> {
        self.terminated.lock().unwrap().push(pid);
        if self.fail_terminate.load(Ordering::SeqCst) {
            return Err(Error::Terminate {
                pid,
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            });
        }
        self.exit(pid);
        Ok(())
    }
}

/// Launcher that hands out increasing pids and marks them alive.
#[derive(Debug)]
pub struct FakeLauncher {
    prober: Arc<FakeProber>,
    next_pid: AtomicU32,
    fail: AtomicBool,
    requests: Mutex<Vec<LaunchRequest>>,
}

impl FakeLauncher {
    /// Pids start at 1000.
    pub fn new(prober: Arc<FakeProber>) -> Self {
        Self {
            prober,
            next_pid: AtomicU32::new(1000),
            fail: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Make later launches fail.
    pub fn fail_launches(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Every request that reached the launcher, failed ones included.
    pub fn requests(&self) -> Vec<LaunchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl TerminalLauncher for FakeLauncher {
    fn launch(&self, request: &LaunchRequest) -> Result<u32> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::LaunchFailed {
                session_id: request.session_id.clone(),
                reason: "no terminal".to_string(),
            });
        }

        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
        self.prober.spawn(pid);
        Ok(pid)
    }
}
