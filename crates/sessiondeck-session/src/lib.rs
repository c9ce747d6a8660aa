//! # sessiondeck-session
//!
//! Session lifecycle management for sessiondeck.
//!
//! This crate provides:
//! - Launching commands in their own terminal windows
//! - Per-session liveness monitoring
//! - Durable session records and recovery after a restart
//! - The session registry with per-project id allocation
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends only on sessiondeck-core.
//! Terminal launching and process probing sit behind the
//! [`TerminalLauncher`] and [`ProcessProber`] traits so the manager can be
//! driven without real terminals (see [`testing`]).

#![warn(clippy::all)]

pub mod launcher;
pub mod liveness;
pub mod manager;
mod monitor;
pub mod session;
pub mod store;
pub mod testing;

// Re-export commonly used types
pub use launcher::{
    LaunchRequest, PidMarker, SystemLauncher, TerminalEmulator, TerminalLauncher,
    TerminalRegistry, SESSION_ID_ENV,
};
pub use liveness::{ProcessProber, SystemProber};
pub use manager::{SessionManager, SessionManagerConfig};
pub use session::Session;
pub use store::SessionStore;
