//! Point-in-time snapshots of a git working directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use sessiondeck_core::{Error, Result};

use crate::git::{split_nul, Git};

/// Reference to a working directory's state at one moment.
///
/// A checkpoint is never modified after creation, so the same value can be
/// diffed or rolled back to any number of times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    head_hash: String,
    stash_ref: String,
    dir: PathBuf,
    created_at: DateTime<Utc>,
    #[serde(default)]
    untracked: Vec<String>,
}

impl Checkpoint {
    /// Commit `HEAD` pointed to.
    pub fn head_hash(&self) -> &str {
        &self.head_hash
    }

    /// Stash commit capturing uncommitted changes, empty for a clean tree.
    ///
    /// Informational only; rollback never reads it.
    pub fn stash_ref(&self) -> &str {
        &self.stash_ref
    }

    /// Absolute working directory the checkpoint was taken in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Untracked, non-ignored paths that already existed, relative to `dir`.
    pub fn untracked(&self) -> &[String] {
        &self.untracked
    }

    /// Write the checkpoint as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Read a checkpoint written by [`Checkpoint::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Untracked, non-ignored files under the git working directory.
pub(crate) fn untracked_files(git: &Git) -> Result<Vec<String>> {
    let output = git.run(&["ls-files", "--others", "--exclude-standard", "-z"])?;
    Ok(split_nul(&output).map(str::to_string).collect())
}

/// Snapshot `dir`.
///
/// Fails with [`Error::NotVersionControlled`] outside a git working tree.
/// Uncommitted changes are captured with `git stash create`, which leaves
/// the working tree, index and branch untouched; failing to do so only
/// costs the forensic copy.
///
/// The stored directory is canonical, so a saved checkpoint keeps pointing
/// at the same tree whatever the reader's current directory.
pub fn create_checkpoint(dir: &Path) -> Result<Checkpoint> {
    let dir =
        fs::canonicalize(dir).map_err(|_| Error::NotVersionControlled(dir.to_path_buf()))?;
    let git = Git::new(&dir);

    let inside = git
        .run(&["rev-parse", "--is-inside-work-tree"])
        .map(|out| out.trim() == "true")
        .unwrap_or(false);
    if !inside {
        return Err(Error::NotVersionControlled(dir));
    }

    let head_hash = git.run(&["rev-parse", "HEAD"])?.trim().to_string();

    let stash_ref = match git.run(&["stash", "create"]) {
        Ok(out) => out.trim().to_string(),
        Err(e) => {
            warn!("Could not snapshot uncommitted changes: {}", e);
            String::new()
        }
    };
    if !stash_ref.is_empty() {
        debug!("Uncommitted changes captured in {}", stash_ref);
    }

    let untracked = untracked_files(&git)?;

    info!(
        "Created checkpoint at {} in {}",
        head_hash,
        dir.display()
    );
    Ok(Checkpoint {
        head_hash,
        stash_ref,
        dir,
        created_at: Utc::now(),
        untracked,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_plain_directory_is_not_version_controlled() {
        let temp = TempDir::new().unwrap();
        let result = create_checkpoint(temp.path());
        assert!(matches!(result, Err(Error::NotVersionControlled(_))));
    }

    #[test]
    fn test_missing_directory_is_not_version_controlled() {
        let temp = TempDir::new().unwrap();
        let result = create_checkpoint(&temp.path().join("absent"));
        assert!(matches!(result, Err(Error::NotVersionControlled(_))));
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let checkpoint = Checkpoint {
            head_hash: "0123abcd".to_string(),
            stash_ref: String::new(),
            dir: PathBuf::from("/work/demo"),
            created_at: Utc::now(),
            untracked: vec!["notes.txt".to_string()],
        };
        let path = temp.path().join("checkpoint.json");

        checkpoint.save(&path).unwrap();

        assert_eq!(Checkpoint::load(&path).unwrap(), checkpoint);
    }

    #[test]
    fn test_load_without_untracked_field() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("checkpoint.json");
        fs::write(
            &path,
            r#"{"head_hash":"abc","stash_ref":"","dir":"/w","created_at":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();

        let checkpoint = Checkpoint::load(&path).unwrap();
        assert!(checkpoint.untracked().is_empty());
        assert_eq!(checkpoint.head_hash(), "abc");
    }
}
