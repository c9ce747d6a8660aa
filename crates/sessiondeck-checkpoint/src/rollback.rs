//! Reverting a working directory to a checkpoint.
//!
//! Both operations work purely from the checkpoint commit and the current
//! working tree; the stash snapshot is never consulted. They discard work
//! irreversibly, so confirmation belongs to the caller.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path};

use tracing::{debug, info, warn};

use sessiondeck_core::{Error, Result};

use crate::checkpoint::Checkpoint;
use crate::git::Git;

/// Restore every tracked file under `dir` to the checkpoint and delete
/// files that are untracked relative to it.
///
/// Paths staged since the checkpoint are unstaged first so they are
/// removed along with other new files. Ignored files are kept. No branch
/// is moved.
pub fn rollback_all(dir: &Path, checkpoint: &Checkpoint) -> Result<()> {
    let git = Git::new(dir);
    let rev = checkpoint.head_hash();
    git.verify_commit(rev)?;

    git.run(&["reset", "-q", rev, "--", "."])?;
    git.run(&["checkout", rev, "--", "."])?;
    git.run(&["clean", "-f", "-d", "--", "."])?;

    info!("Rolled back {} to {}", dir.display(), rev);
    Ok(())
}

/// Reject absolute paths and paths escaping `dir`.
fn check_relative(path: &str) -> Result<()> {
    let escapes = Path::new(path)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if path.is_empty() || escapes {
        return Err(Error::Rollback {
            path: path.to_string(),
            reason: "path must be relative to the checkpoint directory".to_string(),
        });
    }
    Ok(())
}

fn rollback_one(git: &Git, dir: &Path, rev: &str, path: &str) -> Result<()> {
    check_relative(path)?;

    // `rev` is verified, so a miss here means the path did not exist.
    let object = format!("{rev}:./{path}");
    let existed = git.succeeds(&["cat-file", "-e", &object])?;

    if existed {
        git.run(&["checkout", rev, "--", path])?;
        debug!("Restored {}", path);
        return Ok(());
    }

    // Drop it from the index too, or it would show up as a staged deletion.
    git.run(&[
        "rm", "--cached", "-r", "-f", "-q", "--ignore-unmatch", "--", path,
    ])?;
    let target = dir.join(path);
    let removed = match fs::symlink_metadata(&target) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(&target),
        Ok(_) => fs::remove_file(&target),
        Err(e) => Err(e),
    };
    match removed {
        Ok(()) => {
            debug!("Removed {} (absent at checkpoint)", path);
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Rollback {
            path: path.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Revert only `paths` (relative to `dir`).
///
/// Paths that existed at the checkpoint get their content back; paths
/// that did not are deleted, directories included. Every path is attempted;
/// the first failure is returned afterwards. A checkpoint commit missing
/// from the repository fails before any path is touched.
pub fn rollback_files<S: AsRef<str>>(
    dir: &Path,
    checkpoint: &Checkpoint,
    paths: &[S],
) -> Result<()> {
    let git = Git::new(dir);
    let rev = checkpoint.head_hash();
    git.verify_commit(rev)?;
    let mut first_error = None;

    for path in paths {
        let path = path.as_ref();
        if let Err(e) = rollback_one(&git, dir, rev, path) {
            warn!("Rollback of {} failed: {}", path, e);
            first_error.get_or_insert(e);
        }
    }

    info!("Rolled back {} paths in {}", paths.len(), dir.display());
    first_error.map_or(Ok(()), Err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_relative() {
        assert!(check_relative("src/main.rs").is_ok());
        assert!(check_relative("./notes.txt").is_ok());
        assert!(check_relative("").is_err());
        assert!(check_relative("../outside.txt").is_err());
        assert!(check_relative("/etc/passwd").is_err());
    }
}
