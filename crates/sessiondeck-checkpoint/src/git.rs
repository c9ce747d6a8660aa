//! Thin wrapper around the `git` command line.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tracing::trace;

use sessiondeck_core::{Error, Result};

/// Runs git commands inside one working directory.
#[derive(Debug, Clone)]
pub(crate) struct Git {
    dir: PathBuf,
}

impl Git {
    pub(crate) fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    fn output(&self, args: &[&str]) -> Result<Output> {
        trace!("git {} (in {})", args.join(" "), self.dir.display());
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.error(args, format!("cannot run git: {e}")))?;
        Ok(output)
    }

    fn error(&self, args: &[&str], stderr: String) -> Error {
        Error::Git {
            command: args.join(" "),
            dir: self.dir.clone(),
            stderr,
        }
    }

    /// Run git and return stdout, failing on a non-zero exit.
    pub(crate) fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.output(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(self.error(args, stderr));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Fail unless `rev` names a commit present in this repository.
    pub(crate) fn verify_commit(&self, rev: &str) -> Result<()> {
        let spec = format!("{rev}^{{commit}}");
        let args = ["rev-parse", "--verify", "--quiet", spec.as_str()];
        if self.succeeds(&args)? {
            return Ok(());
        }
        Err(self.error(&args, format!("unknown commit {rev}")))
    }

    /// Run git and report only whether it exited successfully.
    pub(crate) fn succeeds(&self, args: &[&str]) -> Result<bool> {
        Ok(self.output(args)?.status.success())
    }
}

/// Split NUL-terminated `-z` output into fields.
pub(crate) fn split_nul(output: &str) -> impl Iterator<Item = &str> {
    output.split('\0').filter(|field| !field.is_empty())
}
