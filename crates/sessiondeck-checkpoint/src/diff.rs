//! Change summaries relative to a checkpoint.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use sessiondeck_core::Result;

use crate::checkpoint::{untracked_files, Checkpoint};
use crate::git::{split_nul, Git};

/// How a path changed since the checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Modified,
    Added,
    Deleted,
    Renamed,
}

impl FileStatus {
    /// Map a git status letter. Copies count as additions, anything
    /// unrecognised as a modification.
    fn from_letter(letter: char) -> Self {
        match letter {
            'A' | 'C' => FileStatus::Added,
            'D' => FileStatus::Deleted,
            'R' => FileStatus::Renamed,
            _ => FileStatus::Modified,
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = match self {
            FileStatus::Modified => "M",
            FileStatus::Added => "A",
            FileStatus::Deleted => "D",
            FileStatus::Renamed => "R",
        };
        write!(f, "{letter}")
    }
}

/// One changed path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffFile {
    /// Path relative to the checkpoint directory
    pub path: String,
    /// Added lines, 0 for binary files
    pub additions: u64,
    /// Removed lines, 0 for binary files
    pub deletions: u64,
    pub status: FileStatus,
    /// Source path of a rename
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
}

/// Every change between a checkpoint and the current working tree,
/// sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub files: Vec<DiffFile>,
}

impl DiffSummary {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_additions(&self) -> u64 {
        self.files.iter().map(|f| f.additions).sum()
    }

    pub fn total_deletions(&self) -> u64 {
        self.files.iter().map(|f| f.deletions).sum()
    }

    /// Entry for `path`, if it changed.
    pub fn get(&self, path: &str) -> Option<&DiffFile> {
        self.files.iter().find(|f| f.path == path)
    }
}

#[derive(Debug, PartialEq, Eq)]
struct NumStat {
    additions: u64,
    deletions: u64,
    path: String,
    old_path: Option<String>,
}

/// `-` marks a binary file.
fn parse_count(field: &str) -> u64 {
    field.parse().unwrap_or(0)
}

/// Parse `git diff --numstat -z`.
///
/// Plain entries are `added\tdeleted\tpath`; renames leave the path empty
/// and follow with the source and destination as separate fields.
fn parse_numstat(output: &str) -> Vec<NumStat> {
    let mut fields = split_nul(output);
    let mut stats = Vec::new();

    while let Some(field) = fields.next() {
        let mut parts = field.splitn(3, '\t');
        let (Some(added), Some(deleted), Some(path)) = (parts.next(), parts.next(), parts.next())
        else {
            warn!("Unexpected numstat entry: {:?}", field);
            continue;
        };

        let (path, old_path) = if path.is_empty() {
            match (fields.next(), fields.next()) {
                (Some(old), Some(new)) => (new.to_string(), Some(old.to_string())),
                _ => break,
            }
        } else {
            (path.to_string(), None)
        };

        stats.push(NumStat {
            additions: parse_count(added),
            deletions: parse_count(deleted),
            path,
            old_path,
        });
    }

    stats
}

/// Parse `git diff --name-status -z` into destination path → status.
fn parse_name_status(output: &str) -> HashMap<String, (FileStatus, Option<String>)> {
    let mut fields = split_nul(output);
    let mut statuses = HashMap::new();

    while let Some(code) = fields.next() {
        let Some(letter) = code.chars().next() else {
            continue;
        };
        let status = FileStatus::from_letter(letter);

        if matches!(letter, 'R' | 'C') {
            let (Some(old), Some(new)) = (fields.next(), fields.next()) else {
                break;
            };
            let old_path = (status == FileStatus::Renamed).then(|| old.to_string());
            statuses.insert(new.to_string(), (status, old_path));
        } else {
            let Some(path) = fields.next() else {
                break;
            };
            statuses.insert(path.to_string(), (status, None));
        }
    }

    statuses
}

/// Line count as git's numstat reports it; binary content counts 0.
fn count_lines(path: &Path) -> u64 {
    let Ok(content) = fs::read(path) else {
        return 0;
    };
    if content.contains(&0) {
        return 0;
    }

    let newlines = content.iter().filter(|&&b| b == b'\n').count() as u64;
    if content.last().is_some_and(|&b| b != b'\n') {
        newlines + 1
    } else {
        newlines
    }
}

fn tracked_changes(git: &Git, base: &str) -> Result<(String, String)> {
    let numstat = git.run(&["diff", "--relative", "-M", "--numstat", "-z", base, "--"])?;
    let name_status = git.run(&["diff", "--relative", "-M", "--name-status", "-z", base, "--"])?;
    Ok((numstat, name_status))
}

/// Summarise how the working tree under `dir` differs from `checkpoint`.
///
/// Tracked changes are compared against the checkpoint commit, or against
/// the current `HEAD` when that commit cannot be diffed. Untracked files
/// that did not exist at checkpoint time are reported as added.
pub fn diff_summary(dir: &Path, checkpoint: &Checkpoint) -> Result<DiffSummary> {
    let git = Git::new(dir);

    let (numstat, name_status) = match tracked_changes(&git, checkpoint.head_hash()) {
        Ok(changes) => changes,
        Err(e) => {
            warn!(
                "Cannot diff against checkpoint {}, comparing with HEAD: {}",
                checkpoint.head_hash(),
                e
            );
            tracked_changes(&git, "HEAD")?
        }
    };

    let mut statuses = parse_name_status(&name_status);
    let mut files: BTreeMap<String, DiffFile> = BTreeMap::new();

    for stat in parse_numstat(&numstat) {
        let (status, old_path) = statuses
            .remove(&stat.path)
            .unwrap_or((FileStatus::Modified, None));
        files.insert(
            stat.path.clone(),
            DiffFile {
                path: stat.path,
                additions: stat.additions,
                deletions: stat.deletions,
                status,
                old_path: old_path.or(stat.old_path),
            },
        );
    }
    for (path, (status, old_path)) in statuses {
        files.entry(path.clone()).or_insert(DiffFile {
            path,
            additions: 0,
            deletions: 0,
            status,
            old_path,
        });
    }

    let preexisting: HashSet<&str> = checkpoint.untracked().iter().map(String::as_str).collect();
    for path in untracked_files(&git)? {
        if preexisting.contains(path.as_str()) || files.contains_key(&path) {
            continue;
        }
        let additions = count_lines(&dir.join(&path));
        files.insert(
            path.clone(),
            DiffFile {
                path,
                additions,
                deletions: 0,
                status: FileStatus::Added,
                old_path: None,
            },
        );
    }

    debug!("{} changed files in {}", files.len(), dir.display());
    Ok(DiffSummary {
        files: files.into_values().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_numstat_plain_and_binary() {
        let stats = parse_numstat("3\t1\tREADME.md\0-\t-\tlogo.png\0");
        assert_eq!(
            stats,
            vec![
                NumStat {
                    additions: 3,
                    deletions: 1,
                    path: "README.md".to_string(),
                    old_path: None,
                },
                NumStat {
                    additions: 0,
                    deletions: 0,
                    path: "logo.png".to_string(),
                    old_path: None,
                },
            ]
        );
    }

    #[test]
    fn test_parse_numstat_rename() {
        let stats = parse_numstat("0\t0\t\0old name.txt\0new name.txt\01\t0\tother.txt\0");
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].path, "new name.txt");
        assert_eq!(stats[0].old_path.as_deref(), Some("old name.txt"));
        assert_eq!(stats[1].path, "other.txt");
    }

    #[test]
    fn test_parse_name_status() {
        let statuses = parse_name_status("M\0a.txt\0A\0b.txt\0D\0c.txt\0R087\0d.txt\0e.txt\0C100\0f.txt\0g.txt\0T\0h\0");

        assert_eq!(statuses["a.txt"], (FileStatus::Modified, None));
        assert_eq!(statuses["b.txt"], (FileStatus::Added, None));
        assert_eq!(statuses["c.txt"], (FileStatus::Deleted, None));
        assert_eq!(
            statuses["e.txt"],
            (FileStatus::Renamed, Some("d.txt".to_string()))
        );
        assert_eq!(statuses["g.txt"], (FileStatus::Added, None));
        assert_eq!(statuses["h"], (FileStatus::Modified, None));
        assert!(!statuses.contains_key("d.txt"));
    }

    #[test]
    fn test_count_lines() {
        let temp = TempDir::new().unwrap();
        let cases: [(&str, &[u8], u64); 4] = [
            ("empty", b"", 0),
            ("terminated", b"a\nb\n", 2),
            ("unterminated", b"a\nb", 2),
            ("binary", b"a\0b\n", 0),
        ];

        for (name, content, expected) in cases {
            let path = temp.path().join(name);
            fs::write(&path, content).unwrap();
            assert_eq!(count_lines(&path), expected, "{name}");
        }
    }

    #[test]
    fn test_summary_totals() {
        let summary = DiffSummary {
            files: vec![
                DiffFile {
                    path: "a".to_string(),
                    additions: 3,
                    deletions: 1,
                    status: FileStatus::Modified,
                    old_path: None,
                },
                DiffFile {
                    path: "b".to_string(),
                    additions: 2,
                    deletions: 0,
                    status: FileStatus::Added,
                    old_path: None,
                },
            ],
        };

        assert_eq!(summary.total_additions(), 5);
        assert_eq!(summary.total_deletions(), 1);
        assert_eq!(summary.get("b").unwrap().status, FileStatus::Added);
        assert!(summary.get("c").is_none());
        assert!(DiffSummary::default().is_empty());
    }
}
