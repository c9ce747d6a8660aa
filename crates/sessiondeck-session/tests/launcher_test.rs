//! End-to-end launcher tests that run the generated script with `sh`
//! instead of a real terminal emulator.

#![cfg(unix)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use sessiondeck_core::{Error, Result};
use sessiondeck_session::{
    LaunchRequest, ProcessProber, SystemLauncher, SystemProber, TerminalEmulator,
    TerminalLauncher, TerminalRegistry,
};
use tempfile::TempDir;

/// Runs the launch script as a plain child process.
struct ShellEmulator {
    children: Arc<Mutex<Vec<Child>>>,
}

impl TerminalEmulator for ShellEmulator {
    fn open(&self, script: &Path, _title: &str) -> Result<()> {
        let child = Command::new("sh")
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        self.children.lock().unwrap().push(child);
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "sh"
    }

    fn priority(&self) -> u8 {
        1
    }
}

/// Never runs anything, so no pid is ever reported.
struct SilentEmulator;

impl TerminalEmulator for SilentEmulator {
    fn open(&self, _script: &Path, _title: &str) -> Result<()> {
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "silent"
    }

    fn priority(&self) -> u8 {
        1
    }
}

fn wait_for_file(path: &Path, timeout: Duration) -> Option<String> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Ok(content) = fs::read_to_string(path) {
            if content.ends_with('\n') {
                return Some(content);
            }
        }
        thread::sleep(Duration::from_millis(20));
    }
    None
}

#[test]
fn test_launch_reports_pid_of_command() {
    let temp = TempDir::new().unwrap();
    let workdir = temp.path().join("project dir");
    fs::create_dir_all(&workdir).unwrap();

    let children = Arc::new(Mutex::new(Vec::new()));
    let registry = TerminalRegistry::with_emulators(vec![Box::new(ShellEmulator {
        children: Arc::clone(&children),
    })]);
    let launcher = SystemLauncher::new(temp.path().join("run"), Duration::from_secs(10))
        .with_registry(registry);

    let mut env = BTreeMap::new();
    env.insert("GREETING".to_string(), "hello world".to_string());
    let request = LaunchRequest {
        session_id: "demo-1".to_string(),
        working_dir: workdir.clone(),
        args: vec![
            "sh".to_string(),
            "-c".to_string(),
            "echo \"$SESSIONDECK_SESSION_ID $GREETING $$\" > out.txt; exec sleep 30".to_string(),
        ],
        env,
    };

    let pid = launcher.launch(&request).unwrap();

    let out = wait_for_file(&workdir.join("out.txt"), Duration::from_secs(10)).unwrap();
    assert_eq!(out.trim(), format!("demo-1 hello world {pid}"));

    // Script and marker are cleaned up once the pid is known.
    let leftovers: Vec<_> = fs::read_dir(launcher.run_dir()).unwrap().collect();
    assert!(leftovers.is_empty());

    let prober = SystemProber::new();
    assert!(prober.is_alive(pid));
    prober.terminate(pid).unwrap();

    let mut child = children.lock().unwrap().pop().unwrap();
    assert_eq!(child.id(), pid);
    let status = child.wait().unwrap();
    assert!(!status.success());
    assert!(!prober.is_alive(pid));
}

#[test]
fn test_launch_times_out_without_pid() {
    let temp = TempDir::new().unwrap();
    let registry = TerminalRegistry::with_emulators(vec![Box::new(SilentEmulator)]);
    let launcher = SystemLauncher::new(temp.path().join("run"), Duration::from_millis(200))
        .with_registry(registry);

    let request = LaunchRequest {
        session_id: "demo-1".to_string(),
        working_dir: temp.path().to_path_buf(),
        args: vec!["true".to_string()],
        env: BTreeMap::new(),
    };

    let result = launcher.launch(&request);
    assert!(matches!(result, Err(Error::PidTimeout { .. })));
}

#[test]
fn test_launch_without_terminal_fails() {
    let temp = TempDir::new().unwrap();
    let launcher = SystemLauncher::new(temp.path().join("run"), Duration::from_millis(200))
        .with_registry(TerminalRegistry::with_emulators(Vec::new()));

    let request = LaunchRequest {
        session_id: "demo-1".to_string(),
        working_dir: temp.path().to_path_buf(),
        args: vec!["true".to_string()],
        env: BTreeMap::new(),
    };

    assert!(matches!(
        launcher.launch(&request),
        Err(Error::TerminalUnavailable(_))
    ));
}
