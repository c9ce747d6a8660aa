//! Windows terminal emulators. Launch scripts are PowerShell files.

use std::path::Path;
use std::process::Command;

use super::{spawn_detached, TerminalEmulator};
use sessiondeck_core::Result;

/// Check if a command exists in PATH (Windows version).
fn command_exists(cmd: &str) -> bool {
    Command::new("where")
        .arg(cmd)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

const POWERSHELL_FILE_ARGS: [&str; 4] = ["-NoProfile", "-ExecutionPolicy", "Bypass", "-File"];

/// Windows Terminal.
pub struct WindowsTerminal;

impl TerminalEmulator for WindowsTerminal {
    fn open(&self, script: &Path, title: &str) -> Result<()> {
        let mut command = Command::new("wt.exe");
        command
            .arg("new-tab")
            .arg("--title")
            .arg(title)
            .arg("--")
            .arg("powershell.exe")
            .args(POWERSHELL_FILE_ARGS)
            .arg(script);
        spawn_detached(command, self.name())
    }

    fn is_available(&self) -> bool {
        command_exists("wt.exe")
    }

    fn name(&self) -> &'static str {
        "Windows Terminal"
    }

    fn priority(&self) -> u8 {
        100
    }
}

/// A new PowerShell console window.
pub struct PowerShell;

impl TerminalEmulator for PowerShell {
    fn open(&self, script: &Path, _title: &str) -> Result<()> {
        let start = format!(
            "Start-Process powershell.exe -ArgumentList '-NoProfile','-ExecutionPolicy','Bypass','-File','\"{}\"'",
            script.to_string_lossy().replace('\'', "''")
        );

        let mut command = Command::new("powershell.exe");
        command.arg("-NoProfile").arg("-Command").arg(start);
        spawn_detached(command, self.name())
    }

    fn is_available(&self) -> bool {
        command_exists("powershell.exe")
    }

    fn name(&self) -> &'static str {
        "PowerShell"
    }

    fn priority(&self) -> u8 {
        60
    }
}

/// A classic console window opened through `cmd.exe /c start`.
pub struct CmdExe;

impl TerminalEmulator for CmdExe {
    fn open(&self, script: &Path, title: &str) -> Result<()> {
        use std::os::windows::process::CommandExt;

        // `start` treats its first quoted argument as the window title.
        let mut command = Command::new("cmd.exe");
        command
            .arg("/c")
            .arg("start")
            .raw_arg(format!("\"{title}\""))
            .arg("powershell.exe")
            .args(POWERSHELL_FILE_ARGS)
            .arg(script);
        spawn_detached(command, self.name())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "cmd.exe"
    }

    fn priority(&self) -> u8 {
        50
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmd_exe_always_available() {
        assert!(CmdExe.is_available());
    }

    #[test]
    fn test_priorities() {
        assert!(WindowsTerminal.priority() > PowerShell.priority());
        assert!(PowerShell.priority() > CmdExe.priority());
    }
}
