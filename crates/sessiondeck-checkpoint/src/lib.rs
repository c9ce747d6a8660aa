//! # sessiondeck-checkpoint
//!
//! Checkpoint, diff and rollback for a git working directory.
//!
//! A [`Checkpoint`] records the commit `HEAD` pointed to when it was taken,
//! plus a best-effort `git stash create` snapshot of uncommitted work. The
//! working directory does not need to be clean. [`diff_summary`] reports
//! what changed since, and [`rollback_all`] / [`rollback_files`] undo it.
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends only on sessiondeck-core
//! and is independent of session management. Only read-only and
//! working-tree git operations are issued; nothing is committed and no
//! branch is moved.

#![warn(clippy::all)]

pub mod checkpoint;
pub mod diff;
mod git;
pub mod rollback;

// Re-export commonly used types
pub use checkpoint::{create_checkpoint, Checkpoint};
pub use diff::{diff_summary, DiffFile, DiffSummary, FileStatus};
pub use rollback::{rollback_all, rollback_files};
