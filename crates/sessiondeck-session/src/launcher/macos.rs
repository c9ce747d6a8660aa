//! macOS terminal emulators, driven through AppleScript.

use std::path::Path;
use std::process::Command;

use super::{spawn_detached, TerminalEmulator};
use sessiondeck_core::Result;

/// Shell command line that runs `script`, escaped for an AppleScript string.
fn applescript_command(script: &Path) -> String {
    let command = format!("sh {}", shell_words::quote(&script.to_string_lossy()));
    command.replace('\\', "\\\\").replace('"', "\\\"")
}

/// macOS Terminal.app.
pub struct MacOSTerminal;

impl TerminalEmulator for MacOSTerminal {
    fn open(&self, script: &Path, _title: &str) -> Result<()> {
        let applescript = format!(
            "tell application \"Terminal\" to do script \"{}\"",
            applescript_command(script)
        );

        let mut command = Command::new("osascript");
        command.arg("-e").arg(applescript);
        spawn_detached(command, self.name())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "Terminal.app"
    }

    fn priority(&self) -> u8 {
        80
    }
}

/// iTerm2.
pub struct ITerm2;

impl TerminalEmulator for ITerm2 {
    fn open(&self, script: &Path, title: &str) -> Result<()> {
        let applescript = format!(
            r#"tell application "iTerm2"
                create window with default profile
                tell current session of current window
                    set name to "{}"
                    write text "{}"
                end tell
            end tell"#,
            title.replace('"', "\\\""),
            applescript_command(script)
        );

        let mut command = Command::new("osascript");
        command.arg("-e").arg(applescript);
        spawn_detached(command, self.name())
    }

    fn is_available(&self) -> bool {
        Path::new("/Applications/iTerm.app").exists()
    }

    fn name(&self) -> &'static str {
        "iTerm2"
    }

    fn priority(&self) -> u8 {
        100
    }
}
