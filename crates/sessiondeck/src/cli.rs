//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Run commands in their own terminals, track them across restarts, and
/// checkpoint the files they change.
#[derive(Debug, Parser)]
#[command(name = "sessiondeck", version, about)]
pub struct Cli {
    /// YAML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the data directory (session records, launch scripts)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start a command in a new terminal as a session of a project
    Start {
        /// Project the session belongs to
        #[arg(long)]
        project: String,

        /// Working directory of the session
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Extra environment variable, repeatable
        #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
        env: Vec<(String, String)>,

        /// Command to run and its arguments
        #[arg(last = true, required = true, value_name = "ARGS")]
        args: Vec<String>,
    },

    /// Print tracked sessions as JSON
    List {
        /// Only sessions of this project
        #[arg(long)]
        project: Option<String>,

        /// Only running sessions
        #[arg(long)]
        running: bool,
    },

    /// Terminate a session, or every session of a project
    Kill {
        /// Session id
        #[arg(required_unless_present = "project", conflicts_with = "project")]
        id: Option<String>,

        /// Kill all sessions of this project
        #[arg(long)]
        project: Option<String>,
    },

    /// Keep session status current until interrupted
    Watch {
        /// Milliseconds between refreshes
        #[arg(long, default_value_t = 2000, value_parser = clap::value_parser!(u64).range(1..))]
        interval_ms: u64,
    },

    /// Snapshot, diff and roll back a git working directory
    Checkpoint {
        #[command(subcommand)]
        action: CheckpointCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum CheckpointCommand {
    /// Take a checkpoint of a directory
    Create {
        /// Directory inside a git working tree
        dir: PathBuf,

        /// Write the checkpoint here instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Show what changed since a checkpoint
    Diff {
        /// Checkpoint file
        file: PathBuf,
    },

    /// Revert changes made since a checkpoint
    Rollback {
        /// Checkpoint file
        file: PathBuf,

        /// Confirm that uncommitted changes will be discarded
        #[arg(long)]
        yes: bool,

        /// Only revert these paths (relative to the checkpoint directory)
        paths: Vec<String>,
    },
}

fn parse_env_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}
