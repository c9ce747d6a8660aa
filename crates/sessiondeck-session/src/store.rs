//! Durable session records, one JSON file per session.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use sessiondeck_core::{validate_session_id, Result, SessionRecord};

const RECORD_EXTENSION: &str = "json";

/// High-water marks of the per-project id counters. The extension keeps it
/// out of the record scan.
const COUNTERS_FILE: &str = "counters.state";

/// Directory of persisted session records.
///
/// The session manager writes and deletes records under its own lock. A
/// session's monitor also deletes its record once the process is gone;
/// the one-shot exit transition lets only one of them do so, and ids are
/// never reused, so no two writers ever touch the same record.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the records.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: &str) -> Result<PathBuf> {
        validate_session_id(id)?;
        Ok(self.dir.join(format!("{id}.{RECORD_EXTENSION}")))
    }

    /// Write (or overwrite) the record for `record.id`.
    pub fn write_record(&self, record: &SessionRecord) -> Result<()> {
        let path = self.record_path(&record.id)?;
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json)?;
        debug!("Wrote session record: {}", path.display());
        Ok(())
    }

    /// Every well-formed record in the directory.
    ///
    /// Unreadable or unparsable files are skipped; a missing directory yields
    /// an empty list.
    pub fn read_all_records(&self) -> Vec<SessionRecord> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("Cannot scan session store {}: {}", self.dir.display(), e);
                return Vec::new();
            }
        };

        let mut records = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }

            let parsed = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|raw| {
                    serde_json::from_str::<SessionRecord>(&raw).map_err(|e| e.to_string())
                });

            match parsed {
                Ok(record) => records.push(record),
                Err(reason) => {
                    warn!("Skipping corrupt session record {}: {}", path.display(), reason);
                }
            }
        }

        records
    }

    /// Remove the record for `id`. A missing record is not an error.
    pub fn delete_record(&self, id: &str) -> Result<()> {
        let path = self.record_path(id)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Deleted session record: {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist the highest counter issued per project prefix.
    pub fn write_counters(&self, counters: &BTreeMap<String, u64>) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(counters)?;
        fs::write(self.dir.join(COUNTERS_FILE), json)?;
        Ok(())
    }

    /// Previously persisted counters; empty when absent or unreadable.
    pub fn read_counters(&self) -> BTreeMap<String, u64> {
        let path = self.dir.join(COUNTERS_FILE);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!("Cannot read id counters {}: {}", path.display(), e);
                return BTreeMap::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Ignoring corrupt id counters {}: {}", path.display(), e);
            BTreeMap::new()
        })
    }
}
