//! Terminal emulator registry for selecting where sessions run.

use super::TerminalEmulator;
use sessiondeck_core::{Error, Platform, Result};

/// Registry for managing and selecting terminal emulators.
pub struct TerminalRegistry {
    emulators: Vec<Box<dyn TerminalEmulator>>,
}

impl TerminalRegistry {
    /// Create a registry with the emulators known for `platform`.
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            emulators: Self::emulators_for_platform(platform),
        }
    }

    /// Create a registry for the auto-detected platform.
    pub fn new() -> Self {
        Self::for_platform(Platform::detect())
    }

    /// Create a registry from an explicit emulator list.
    pub fn with_emulators(emulators: Vec<Box<dyn TerminalEmulator>>) -> Self {
        Self { emulators }
    }

    fn emulators_for_platform(platform: Platform) -> Vec<Box<dyn TerminalEmulator>> {
        match platform {
            #[cfg(target_os = "linux")]
            Platform::Linux => Self::linux_emulators(),

            #[cfg(target_os = "linux")]
            Platform::WSL => Self::wsl_emulators(),

            #[cfg(target_os = "macos")]
            Platform::MacOS => Self::macos_emulators(),

            #[cfg(target_os = "windows")]
            Platform::Windows => Self::windows_emulators(),

            // Platforms not matching the compile target have nothing to offer
            #[allow(unreachable_patterns)]
            _ => Vec::new(),
        }
    }

    #[cfg(target_os = "linux")]
    fn linux_emulators() -> Vec<Box<dyn TerminalEmulator>> {
        use super::linux::*;

        vec![
            Box::new(GnomeTerminal),
            Box::new(Konsole),
            Box::new(Alacritty),
            Box::new(Kitty),
            Box::new(XTerm),
            Box::new(Tmux),
        ]
    }

    #[cfg(target_os = "linux")]
    fn wsl_emulators() -> Vec<Box<dyn TerminalEmulator>> {
        use super::linux::*;

        vec![
            Box::new(WindowsTerminalWSL),
            Box::new(GnomeTerminal),
            Box::new(Konsole),
            Box::new(XTerm),
            Box::new(Tmux),
        ]
    }

    #[cfg(target_os = "macos")]
    fn macos_emulators() -> Vec<Box<dyn TerminalEmulator>> {
        use super::macos::*;

        vec![Box::new(ITerm2), Box::new(MacOSTerminal)]
    }

    #[cfg(target_os = "windows")]
    fn windows_emulators() -> Vec<Box<dyn TerminalEmulator>> {
        use super::windows::*;

        vec![
            Box::new(WindowsTerminal),
            Box::new(PowerShell),
            Box::new(CmdExe),
        ]
    }

    /// Highest-priority emulator that is currently available.
    pub fn find_best(&self) -> Option<&dyn TerminalEmulator> {
        self.emulators
            .iter()
            .filter(|e| e.is_available())
            .max_by_key(|e| e.priority())
            .map(|e| e.as_ref())
    }

    /// Emulator registered under `name` (case-insensitive).
    pub fn find_by_name(&self, name: &str) -> Option<&dyn TerminalEmulator> {
        self.emulators
            .iter()
            .find(|e| e.name().eq_ignore_ascii_case(name))
            .map(|e| e.as_ref())
    }

    /// All available emulators, sorted by priority (highest first).
    pub fn available(&self) -> Vec<&dyn TerminalEmulator> {
        let mut emulators: Vec<_> = self
            .emulators
            .iter()
            .filter(|e| e.is_available())
            .map(|e| e.as_ref())
            .collect();

        emulators.sort_by_key(|e| std::cmp::Reverse(e.priority()));
        emulators
    }

    /// Pick the emulator to launch with: `preferred` by name when given,
    /// the best available one otherwise.
    pub fn select(&self, preferred: Option<&str>) -> Result<&dyn TerminalEmulator> {
        match preferred {
            Some(name) => {
                let emulator = self.find_by_name(name).ok_or_else(|| {
                    Error::TerminalUnavailable(format!("terminal emulator '{name}' not known"))
                })?;
                if !emulator.is_available() {
                    return Err(Error::TerminalUnavailable(format!(
                        "terminal emulator '{name}' is not installed"
                    )));
                }
                Ok(emulator)
            }
            None => self.find_best().ok_or_else(|| {
                Error::TerminalUnavailable("no terminal emulator available".to_string())
            }),
        }
    }
}

impl Default for TerminalRegistry {
    fn default() -> Self {
        Self::new()
    }
}
