//! Platform detection.
//!
//! Picks the terminal emulator family and launch script flavour used for
//! new sessions.

use serde::{Deserialize, Serialize};

/// Host platforms with a known terminal launcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Native Linux (not WSL), also used for other Unix targets
    Linux,
    /// macOS
    MacOS,
    /// Native Windows
    Windows,
    /// Windows Subsystem for Linux
    WSL,
}

impl Platform {
    /// Detect the current platform at runtime.
    ///
    /// WSL is told apart from Linux by `/proc/version` mentioning Microsoft
    /// or by the presence of the `WSLInterop` binfmt entry.
    ///
    /// ```
    /// use sessiondeck_core::Platform;
    ///
    /// let platform = Platform::detect();
    /// println!("Running on: {platform}");
    /// ```
    pub fn detect() -> Self {
        #[cfg(target_os = "linux")]
        {
            if Self::is_wsl() {
                return Platform::WSL;
            }
            Platform::Linux
        }

        #[cfg(target_os = "macos")]
        {
            Platform::MacOS
        }

        #[cfg(target_os = "windows")]
        {
            Platform::Windows
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        {
            Platform::Linux
        }
    }

    #[cfg(target_os = "linux")]
    fn is_wsl() -> bool {
        if let Ok(version) = std::fs::read_to_string("/proc/version") {
            if version.to_lowercase().contains("microsoft") {
                return true;
            }
        }

        std::path::Path::new("/proc/sys/fs/binfmt_misc/WSLInterop").exists()
    }

    /// Get the platform name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Linux => "Linux",
            Platform::MacOS => "macOS",
            Platform::Windows => "Windows",
            Platform::WSL => "WSL",
        }
    }

    /// Whether launch scripts for this platform are POSIX shell scripts.
    pub fn is_unix(&self) -> bool {
        matches!(self, Platform::Linux | Platform::MacOS | Platform::WSL)
    }

    /// File extension for generated launch scripts.
    pub fn script_extension(&self) -> &'static str {
        if self.is_unix() {
            "sh"
        } else {
            "ps1"
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_detect() {
        let platform = Platform::detect();
        assert!(matches!(
            platform,
            Platform::Linux | Platform::MacOS | Platform::Windows | Platform::WSL
        ));
    }

    #[test]
    fn test_platform_name() {
        assert_eq!(Platform::Linux.name(), "Linux");
        assert_eq!(Platform::MacOS.name(), "macOS");
        assert_eq!(Platform::Windows.name(), "Windows");
        assert_eq!(Platform::WSL.name(), "WSL");
    }

    #[test]
    fn test_script_extension() {
        assert_eq!(Platform::Linux.script_extension(), "sh");
        assert_eq!(Platform::WSL.script_extension(), "sh");
        assert_eq!(Platform::MacOS.script_extension(), "sh");
        assert_eq!(Platform::Windows.script_extension(), "ps1");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_wsl_detection() {
        let platform = Platform::detect();
        if Platform::is_wsl() {
            assert_eq!(platform, Platform::WSL);
        } else {
            assert_eq!(platform, Platform::Linux);
        }
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Platform::MacOS).unwrap();
        assert_eq!(json, "\"macos\"");
    }
}
