//! File-backed checkpoint store keyed by (source playlist, operation kind)

use super::atomic::AtomicOps;
use super::models::{Checkpoint, CheckpointFile, OperationKind};
use super::{CheckpointError, CheckpointResult};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

const FILE_PREFIX: &str = "recovery_";
const FILE_EXTENSION: &str = ".json";

/// A checkpoint file on disk that matches a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointFileEntry {
    pub path: PathBuf,
    pub modified: SystemTime,
    /// Timestamp suffix of legacy file names, empty for the canonical name
    pub suffix: String,
}

impl CheckpointFileEntry {
    fn sort_key(&self) -> (SystemTime, &str, &Path) {
        (self.modified, self.suffix.as_str(), self.path.as_path())
    }
}

/// Persists checkpoints as JSON files in the recovery directory.
///
/// Two processes must not operate on the same key at the same time; no file
/// locking is performed.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    recovery_dir: PathBuf,
}

impl CheckpointStore {
    /// Create a store rooted at `recovery_dir`. The directory is created lazily.
    pub fn new(recovery_dir: impl Into<PathBuf>) -> Self {
        Self {
            recovery_dir: recovery_dir.into(),
        }
    }

    pub fn recovery_dir(&self) -> &Path {
        &self.recovery_dir
    }

    /// Canonical file path for a key
    pub fn checkpoint_path(&self, source_id: &str, kind: OperationKind) -> PathBuf {
        self.recovery_dir
            .join(format!("{}{}_{}{}", FILE_PREFIX, source_id, kind, FILE_EXTENSION))
    }

    /// Load the most recent checkpoint for a key.
    ///
    /// Missing, unreadable or mismatching files all yield `NotFound`; the
    /// cause is logged as a warning.
    pub fn load(&self, source_id: &str, kind: OperationKind) -> CheckpointResult<Checkpoint> {
        let not_found = || CheckpointError::NotFound {
            source_id: source_id.to_string(),
            kind: kind.to_string(),
        };

        let latest = self
            .files_for(source_id, kind)?
            .into_iter()
            .max_by(|a, b| a.sort_key().cmp(&b.sort_key()))
            .ok_or_else(not_found)?;

        match self.read_checkpoint(&latest.path, source_id, kind) {
            Ok(checkpoint) => {
                debug!(path = %latest.path.display(), "Loaded checkpoint");
                Ok(checkpoint)
            }
            Err(e) => {
                warn!(path = %latest.path.display(), error = %e, "Ignoring unusable checkpoint");
                Err(not_found())
            }
        }
    }

    fn read_checkpoint(
        &self,
        path: &Path,
        source_id: &str,
        kind: OperationKind,
    ) -> CheckpointResult<Checkpoint> {
        let file: CheckpointFile = AtomicOps::read_json(path)
            .map_err(|e| CheckpointError::corrupted(path, e.to_string()))?;

        if file.playlist_id != source_id || file.operation_type != kind {
            return Err(CheckpointError::corrupted(
                path,
                format!(
                    "file is for {} ({}), expected {} ({})",
                    file.playlist_id, file.operation_type, source_id, kind
                ),
            ));
        }

        Ok(Checkpoint::from_file(file))
    }

    /// Atomically persist the full checkpoint to its canonical path
    pub fn save(&self, checkpoint: &Checkpoint) -> CheckpointResult<PathBuf> {
        let path = self.checkpoint_path(&checkpoint.source_id, checkpoint.kind);
        let mut file = checkpoint.to_file();
        file.updated_at = Some(Utc::now());

        AtomicOps::write_json(&path, &file)?;
        debug!(
            path = %path.display(),
            destinations = checkpoint.destination_progress.len(),
            "Saved checkpoint"
        );
        Ok(path)
    }

    /// Most recent checkpoint file for a source, across all operation kinds
    pub fn list_latest_for(&self, source_id: &str) -> CheckpointResult<Option<PathBuf>> {
        let mut entries = Vec::new();
        for kind in OperationKind::ALL {
            entries.extend(self.files_for(source_id, kind)?);
        }

        Ok(entries
            .into_iter()
            .max_by(|a, b| a.sort_key().cmp(&b.sort_key()))
            .map(|entry| entry.path))
    }

    /// Remove every file stored for a key. Returns the number of files removed.
    pub fn clear(&self, source_id: &str, kind: OperationKind) -> CheckpointResult<usize> {
        let mut removed = 0;
        for entry in self.files_for(source_id, kind)? {
            match fs::remove_file(&entry.path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        debug!(source_id, %kind, removed, "Cleared checkpoint state");
        Ok(removed)
    }

    /// Checkpoint files whose name matches the key, canonical or timestamped
    pub fn files_for(
        &self,
        source_id: &str,
        kind: OperationKind,
    ) -> CheckpointResult<Vec<CheckpointFileEntry>> {
        if !self.recovery_dir.exists() {
            return Ok(Vec::new());
        }

        let stem = format!("{}{}_{}", FILE_PREFIX, source_id, kind);
        let mut entries = Vec::new();

        for entry in fs::read_dir(&self.recovery_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if AtomicOps::is_temp_file(&name) {
                continue;
            }

            let Some(rest) = name
                .strip_suffix(FILE_EXTENSION)
                .and_then(|n| n.strip_prefix(stem.as_str()))
            else {
                continue;
            };

            let suffix = if rest.is_empty() {
                String::new()
            } else {
                match rest.strip_prefix('_') {
                    Some(ts) if is_timestamp_suffix(ts) => ts.to_string(),
                    _ => continue,
                }
            };

            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);

            entries.push(CheckpointFileEntry {
                path: entry.path(),
                modified,
                suffix,
            });
        }

        Ok(entries)
    }
}

/// Legacy timestamp suffixes look like `20240101_120000` or RFC 3339 fragments
pub(crate) fn is_timestamp_suffix(value: &str) -> bool {
    !value.is_empty()
        && value.starts_with(|c: char| c.is_ascii_digit())
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '_' | '-' | 'T' | ':' | '.'))
}
