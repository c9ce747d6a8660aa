//! sessiondeck command-line library
//!
//! Argument definitions and command handlers. The binary entry point is in
//! main.rs.

pub mod cli;
pub mod commands;

// Re-export commonly used types
pub use cli::{CheckpointCommand, Cli, Command};
pub use commands::{load_config, run, system_manager};
