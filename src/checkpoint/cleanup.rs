//! Cleanup of the recovery directory: keep the newest checkpoint per key and
//! reap temp files left behind by interrupted atomic writes.

use super::atomic::AtomicOps;
use super::models::OperationKind;
use super::storage::is_timestamp_suffix;
use super::CheckpointResult;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tracing::{debug, info, warn};

/// Temp files younger than this may belong to a write in progress
const TEMP_FILE_GRACE: Duration = Duration::from_secs(60);

/// Outcome of a cleanup run
#[derive(Debug, Clone, Default)]
pub struct CleanupReport {
    pub deleted_files: Vec<PathBuf>,
    pub freed_bytes: u64,
    /// Keys (source, kind) for which a file was kept
    pub kept: Vec<(String, OperationKind)>,
    pub skipped_files: Vec<PathBuf>,
    pub errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CheckpointHeader {
    playlist_id: String,
    operation_type: OperationKind,
}

#[derive(Debug)]
struct ScannedFile {
    path: PathBuf,
    size: u64,
    modified: SystemTime,
    suffix: String,
}

/// Cleanup manager for the recovery directory
pub struct CleanupManager {
    recovery_dir: PathBuf,
    dry_run: bool,
    verbose: bool,
}

impl CleanupManager {
    pub fn new(recovery_dir: PathBuf, dry_run: bool, verbose: bool) -> Self {
        Self {
            recovery_dir,
            dry_run,
            verbose,
        }
    }

    /// Run cleanup. Per-file failures are collected in the report.
    pub async fn run_cleanup(&self) -> CheckpointResult<CleanupReport> {
        let mut report = CleanupReport::default();

        if !self.recovery_dir.exists() {
            if self.verbose {
                info!(dir = %self.recovery_dir.display(), "Recovery directory not found");
            }
            return Ok(report);
        }

        let mut groups: BTreeMap<(String, OperationKind), Vec<ScannedFile>> = BTreeMap::new();
        let mut temp_files = Vec::new();

        let mut entries = fs::read_dir(&self.recovery_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();

            if AtomicOps::is_temp_file(&name) {
                temp_files.push(path);
                continue;
            }
            if !name.starts_with("recovery_") || !name.ends_with(".json") {
                continue;
            }

            match self.scan_file(&path, &name).await {
                Ok((key, scanned)) => groups.entry(key).or_default().push(scanned),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping invalid checkpoint file");
                    report.skipped_files.push(path);
                }
            }
        }

        for (key, mut files) in groups {
            files.sort_by(|a, b| {
                (a.modified, &a.suffix, &a.path).cmp(&(b.modified, &b.suffix, &b.path))
            });
            files.pop();
            for stale in files {
                self.delete(&stale.path, stale.size, &mut report).await;
            }
            report.kept.push(key);
        }

        for path in temp_files {
            let metadata = match fs::metadata(&path).await {
                Ok(m) => m,
                Err(e) => {
                    report
                        .errors
                        .push(format!("Failed to stat {}: {}", path.display(), e));
                    continue;
                }
            };
            let age = metadata
                .modified()
                .ok()
                .and_then(|m| SystemTime::now().duration_since(m).ok())
                .unwrap_or_default();
            if age >= TEMP_FILE_GRACE {
                self.delete(&path, metadata.len(), &mut report).await;
            }
        }

        info!(
            deleted = report.deleted_files.len(),
            kept = report.kept.len(),
            dry_run = self.dry_run,
            "Recovery cleanup finished"
        );
        Ok(report)
    }

    async fn scan_file(
        &self,
        path: &Path,
        name: &str,
    ) -> CheckpointResult<((String, OperationKind), ScannedFile)> {
        let content = fs::read_to_string(path).await?;
        let header: CheckpointHeader = serde_json::from_str(&content)?;
        let metadata = fs::metadata(path).await?;

        let stem = format!("recovery_{}_{}", header.playlist_id, header.operation_type);
        let suffix = name
            .strip_suffix(".json")
            .and_then(|n| n.strip_prefix(stem.as_str()))
            .and_then(|rest| rest.strip_prefix('_'))
            .filter(|ts| is_timestamp_suffix(ts))
            .unwrap_or_default()
            .to_string();

        Ok((
            (header.playlist_id, header.operation_type),
            ScannedFile {
                path: path.to_path_buf(),
                size: metadata.len(),
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                suffix,
            },
        ))
    }

    async fn delete(&self, path: &Path, size: u64, report: &mut CleanupReport) {
        if !self.dry_run {
            if let Err(e) = fs::remove_file(path).await {
                report
                    .errors
                    .push(format!("Failed to delete {}: {}", path.display(), e));
                return;
            }
        }

        if self.verbose {
            debug!(
                path = %path.display(),
                "{}",
                if self.dry_run { "Would delete" } else { "Deleted" }
            );
        }
        report.deleted_files.push(path.to_path_buf());
        report.freed_bytes += size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::{Checkpoint, CheckpointStore};
    use tempfile::tempdir;

    fn write_checkpoint(dir: &Path, name: &str, source: &str, kind: OperationKind) -> PathBuf {
        let checkpoint = Checkpoint::new(source, kind);
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_string(&checkpoint.to_file()).unwrap()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_keeps_newest_per_key() {
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path();
        let old = write_checkpoint(dir, "recovery_PL1_move_20240101_000000.json", "PL1", OperationKind::Move);
        let new = write_checkpoint(dir, "recovery_PL1_move_20240201_000000.json", "PL1", OperationKind::Move);
        let other = write_checkpoint(dir, "recovery_PL1_copy.json", "PL1", OperationKind::Copy);

        let manager = CleanupManager::new(dir.to_path_buf(), false, false);
        let report = manager.run_cleanup().await.unwrap();

        assert_eq!(report.deleted_files, vec![old.clone()]);
        assert!(!old.exists());
        assert!(new.exists());
        assert!(other.exists());
        assert_eq!(report.kept.len(), 2);
    }

    #[tokio::test]
    async fn test_dry_run_deletes_nothing() {
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path();
        let old = write_checkpoint(dir, "recovery_PL1_move_20240101_000000.json", "PL1", OperationKind::Move);
        write_checkpoint(dir, "recovery_PL1_move_20240201_000000.json", "PL1", OperationKind::Move);

        let manager = CleanupManager::new(dir.to_path_buf(), true, true);
        let report = manager.run_cleanup().await.unwrap();

        assert_eq!(report.deleted_files.len(), 1);
        assert!(old.exists());
    }

    #[tokio::test]
    async fn test_invalid_files_are_skipped() {
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path();
        let broken = dir.join("recovery_PL9_move.json");
        std::fs::write(&broken, "garbage").unwrap();

        let manager = CleanupManager::new(dir.to_path_buf(), false, false);
        let report = manager.run_cleanup().await.unwrap();

        assert_eq!(report.skipped_files, vec![broken.clone()]);
        assert!(broken.exists());
    }

    #[tokio::test]
    async fn test_fresh_temp_files_are_kept() {
        let temp_dir = tempdir().unwrap();
        let store = CheckpointStore::new(temp_dir.path());
        let temp = temp_dir.path().join("recovery_PL1_move.json.tmp.abc");
        std::fs::write(&temp, "partial").unwrap();
        store.save(&Checkpoint::new("PL1", OperationKind::Move)).unwrap();

        let manager = CleanupManager::new(temp_dir.path().to_path_buf(), false, false);
        let report = manager.run_cleanup().await.unwrap();

        assert!(temp.exists());
        assert!(report.deleted_files.is_empty());
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty_report() {
        let temp_dir = tempdir().unwrap();
        let manager = CleanupManager::new(temp_dir.path().join("nope"), false, false);
        let report = manager.run_cleanup().await.unwrap();
        assert!(report.deleted_files.is_empty());
        assert!(report.errors.is_empty());
    }
}
