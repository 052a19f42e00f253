//! Atomic file operations for checkpoint and undo files

use super::{CheckpointError, CheckpointResult};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Marker embedded in temp file names, used by cleanup to find leftovers
pub const TEMP_MARKER: &str = ".tmp.";

/// Atomic file writer using the write-temp, fsync, rename pattern
pub struct AtomicFileWriter {
    target_path: PathBuf,
    temp_path: PathBuf,
}

impl AtomicFileWriter {
    /// Create a new atomic file writer for the target path
    pub fn new(target_path: &Path) -> CheckpointResult<Self> {
        let temp_path = Self::generate_temp_path(target_path)?;

        Ok(AtomicFileWriter {
            target_path: target_path.to_path_buf(),
            temp_path,
        })
    }

    /// Write content to the file atomically
    pub fn write_content(&self, content: &str) -> CheckpointResult<()> {
        if let Some(parent) = self.target_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::File::create(&self.temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        drop(file);

        self.commit()
    }

    /// Write JSON data to the file atomically
    pub fn write_json<T: serde::Serialize>(&self, data: &T) -> CheckpointResult<()> {
        let content = serde_json::to_string_pretty(data)?;
        self.write_content(&content)
    }

    /// Commit the write by renaming temp file to target
    pub fn commit(&self) -> CheckpointResult<()> {
        fs::rename(&self.temp_path, &self.target_path).map_err(|e| {
            CheckpointError::AtomicOperationFailed {
                operation: format!("rename to {}: {}", self.target_path.display(), e),
            }
        })
    }

    /// Abort the write by deleting the temp file
    pub fn abort(&self) -> CheckpointResult<()> {
        if self.temp_path.exists() {
            fs::remove_file(&self.temp_path)?;
        }
        Ok(())
    }

    fn generate_temp_path(target: &Path) -> CheckpointResult<PathBuf> {
        let parent = target
            .parent()
            .ok_or_else(|| CheckpointError::storage("Target path has no parent directory"))?;

        let filename = target
            .file_name()
            .ok_or_else(|| CheckpointError::storage("Target path has no filename"))?;

        let temp_name = format!(
            "{}{}{}",
            filename.to_string_lossy(),
            TEMP_MARKER,
            Uuid::new_v4()
        );

        Ok(parent.join(temp_name))
    }
}

impl Drop for AtomicFileWriter {
    fn drop(&mut self) {
        let _ = self.abort();
    }
}

/// Atomic file operations utility functions
pub struct AtomicOps;

impl AtomicOps {
    /// Atomically write JSON data to a file
    pub fn write_json<T: serde::Serialize>(path: &Path, data: &T) -> CheckpointResult<()> {
        let writer = AtomicFileWriter::new(path)?;
        writer.write_json(data)
    }

    /// Read JSON data from a file
    pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> CheckpointResult<T> {
        let content = fs::read_to_string(path)?;
        let data = serde_json::from_str(&content)?;
        Ok(data)
    }

    /// Whether a file name belongs to an unfinished atomic write
    pub fn is_temp_file(name: &str) -> bool {
        name.contains(TEMP_MARKER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_success() {
        let temp_dir = tempdir().unwrap();
        let target_path = temp_dir.path().join("recovery_PL1_move.json");

        let data = serde_json::json!({"playlist_id": "PL1"});
        AtomicOps::write_json(&target_path, &data).unwrap();

        let read_data: serde_json::Value = AtomicOps::read_json(&target_path).unwrap();
        assert_eq!(data, read_data);

        // No temp file is left behind after a commit
        let leftovers: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| AtomicOps::is_temp_file(&e.file_name().to_string_lossy()))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_overwrite_replaces_content() {
        let temp_dir = tempdir().unwrap();
        let target_path = temp_dir.path().join("undo_move.json");

        AtomicOps::write_json(&target_path, &serde_json::json!({"v": 1})).unwrap();
        AtomicOps::write_json(&target_path, &serde_json::json!({"v": 2})).unwrap();

        let read_data: serde_json::Value = AtomicOps::read_json(&target_path).unwrap();
        assert_eq!(read_data["v"], 2);
    }

    #[test]
    fn test_dropped_writer_removes_temp_file() {
        let temp_dir = tempdir().unwrap();
        let target_path = temp_dir.path().join("state.json");

        let writer = AtomicFileWriter::new(&target_path).unwrap();
        fs::write(&writer.temp_path, "partial").unwrap();
        let temp_path = writer.temp_path.clone();
        drop(writer);

        assert!(!temp_path.exists());
        assert!(!target_path.exists());
    }

    #[test]
    fn test_temp_file_detection() {
        assert!(AtomicOps::is_temp_file("recovery_PL1_move.json.tmp.1234"));
        assert!(!AtomicOps::is_temp_file("recovery_PL1_move.json"));
    }
}
