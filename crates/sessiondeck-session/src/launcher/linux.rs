//! Linux (and WSL) terminal emulators.

use std::path::Path;
use std::process::Command;

use super::{spawn_detached, TerminalEmulator};
use sessiondeck_core::{Error, Result};

/// Check if a command exists in PATH.
fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// GNOME Terminal.
pub struct GnomeTerminal;

impl TerminalEmulator for GnomeTerminal {
    fn open(&self, script: &Path, title: &str) -> Result<()> {
        let mut command = Command::new("gnome-terminal");
        command
            .arg(format!("--title={title}"))
            .arg("--")
            .arg("sh")
            .arg(script);
        spawn_detached(command, self.name())
    }

    fn is_available(&self) -> bool {
        command_exists("gnome-terminal")
    }

    fn name(&self) -> &'static str {
        "gnome-terminal"
    }

    fn priority(&self) -> u8 {
        100
    }
}

/// KDE Konsole.
pub struct Konsole;

impl TerminalEmulator for Konsole {
    fn open(&self, script: &Path, title: &str) -> Result<()> {
        let mut command = Command::new("konsole");
        command
            .arg("-p")
            .arg(format!("tabtitle={title}"))
            .arg("-e")
            .arg("sh")
            .arg(script);
        spawn_detached(command, self.name())
    }

    fn is_available(&self) -> bool {
        command_exists("konsole")
    }

    fn name(&self) -> &'static str {
        "konsole"
    }

    fn priority(&self) -> u8 {
        100
    }
}

/// XTerm, the universal fallback.
pub struct XTerm;

impl TerminalEmulator for XTerm {
    fn open(&self, script: &Path, title: &str) -> Result<()> {
        let mut command = Command::new("xterm");
        command.arg("-T").arg(title).arg("-e").arg("sh").arg(script);
        spawn_detached(command, self.name())
    }

    fn is_available(&self) -> bool {
        command_exists("xterm")
    }

    fn name(&self) -> &'static str {
        "xterm"
    }

    fn priority(&self) -> u8 {
        50
    }
}

/// Alacritty.
pub struct Alacritty;

impl TerminalEmulator for Alacritty {
    fn open(&self, script: &Path, title: &str) -> Result<()> {
        let mut command = Command::new("alacritty");
        command
            .arg("--title")
            .arg(title)
            .arg("-e")
            .arg("sh")
            .arg(script);
        spawn_detached(command, self.name())
    }

    fn is_available(&self) -> bool {
        command_exists("alacritty")
    }

    fn name(&self) -> &'static str {
        "alacritty"
    }

    fn priority(&self) -> u8 {
        70
    }
}

/// Kitty.
pub struct Kitty;

impl TerminalEmulator for Kitty {
    fn open(&self, script: &Path, title: &str) -> Result<()> {
        let mut command = Command::new("kitty");
        command.arg("--title").arg(title).arg("sh").arg(script);
        spawn_detached(command, self.name())
    }

    fn is_available(&self) -> bool {
        command_exists("kitty")
    }

    fn name(&self) -> &'static str {
        "kitty"
    }

    fn priority(&self) -> u8 {
        70
    }
}

/// Windows Terminal driven from inside WSL.
pub struct WindowsTerminalWSL;

impl TerminalEmulator for WindowsTerminalWSL {
    fn open(&self, script: &Path, title: &str) -> Result<()> {
        // wt.exe starts a Windows process; hop back into this distro to run the script.
        let mut command = Command::new("wt.exe");
        command
            .arg("new-tab")
            .arg("--title")
            .arg(title)
            .arg("--")
            .arg("wsl.exe")
            .arg("-e")
            .arg("sh")
            .arg(script);
        spawn_detached(command, self.name())
    }

    fn is_available(&self) -> bool {
        command_exists("wt.exe")
    }

    fn name(&self) -> &'static str {
        "wt.exe"
    }

    fn priority(&self) -> u8 {
        100
    }
}

/// Detached tmux session, usable without a display.
pub struct Tmux;

impl TerminalEmulator for Tmux {
    fn open(&self, script: &Path, title: &str) -> Result<()> {
        let output = Command::new("tmux")
            .arg("new-session")
            .arg("-d")
            .arg("-s")
            .arg(title)
            .arg("sh")
            .arg(script)
            .output()
            .map_err(|e| Error::TerminalUnavailable(format!("failed to run tmux: {e}")))?;

        if !output.status.success() {
            return Err(Error::TerminalUnavailable(format!(
                "tmux new-session failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        command_exists("tmux")
    }

    fn name(&self) -> &'static str {
        "tmux"
    }

    fn priority(&self) -> u8 {
        40
    }
}
