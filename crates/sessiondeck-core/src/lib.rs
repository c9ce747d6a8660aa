//! # sessiondeck-core
//!
//! Core types for sessiondeck.
//!
//! This crate contains all fundamental types with **no internal dependencies**
//! on other sessiondeck crates. It provides:
//!
//! - Error types
//! - Configuration loading and validation
//! - Platform detection
//! - Session data model (status, snapshots, persisted records, id rules)
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - all other crates depend on this one,
//! but this crate has no dependencies on other sessiondeck crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod platform;
pub mod session;

// Re-export commonly used types
pub use config::{Config, LauncherSettings, LoggingSettings, MonitorSettings, PathSettings};
pub use error::{Error, Result};
pub use platform::Platform;
pub use session::{
    format_session_id, parse_session_suffix, sanitize_project_name, validate_session_id,
    SessionInfo, SessionRecord, SessionStatus,
};
