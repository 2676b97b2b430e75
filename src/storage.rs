use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, warn};

use crate::task::Task;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access task file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode task file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Flat-file persistence for the whole collection. Every save is a full
/// rewrite, deleted tasks included, so soft deletes survive reloads.
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write an empty collection when the file is missing, so the first
    /// save after startup has a target.
    pub fn ensure_exists(&self) {
        if !self.path.exists() {
            self.save(&[]);
        }
    }

    pub fn try_load(&self) -> Result<Vec<Task>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    /// Fail-soft load: read and decode errors are logged and collapse to an
    /// empty collection.
    pub fn load(&self) -> Vec<Task> {
        match self.try_load() {
            Ok(tasks) => tasks,
            Err(err) => {
                warn!("error reading {}: {err}", self.path.display());
                Vec::new()
            }
        }
    }

    pub fn try_save(&self, tasks: &[Task]) -> Result<(), StorageError> {
        let contents = serde_json::to_string_pretty(tasks)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }

    /// Fail-soft save: failures are logged, never propagated.
    pub fn save(&self, tasks: &[Task]) {
        if let Err(err) = self.try_save(tasks) {
            error!("error writing {}: {err}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage_in(dir: &TempDir) -> Storage {
        Storage::new(dir.path().join("tasks.json"))
    }

    fn sample(id: u32) -> Task {
        Task::new(
            id,
            format!("task {id}"),
            "details",
            "Pending",
            "2024-05-01 09:00:00",
            "2024-05-10",
            "easy",
        )
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        assert!(storage_in(&dir).load().is_empty());
    }

    #[test]
    fn blank_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        fs::write(storage.path(), "  \n").unwrap();
        assert!(storage.load().is_empty());
    }

    #[test]
    fn garbage_content_fails_soft() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        fs::write(storage.path(), "not json at all").unwrap();
        assert!(matches!(storage.try_load(), Err(StorageError::Json(_))));
        assert!(storage.load().is_empty());
    }

    #[test]
    fn ensure_exists_creates_an_empty_file() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        storage.ensure_exists();
        assert!(storage.path().exists());
        assert!(storage.load().is_empty());
        let contents = fs::read_to_string(storage.path()).unwrap();
        assert_eq!(contents.trim(), "[]");
    }

    #[test]
    fn ensure_exists_leaves_an_existing_file_alone() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        storage.save(&[sample(1)]);
        storage.ensure_exists();
        assert_eq!(storage.load().len(), 1);
    }

    #[test]
    fn round_trip_keeps_deleted_tasks_field_for_field() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        let mut gone = sample(2);
        gone.soft_delete();
        let tasks = vec![sample(1), gone];

        storage.save(&tasks);
        let loaded = storage.load();
        assert_eq!(loaded, tasks);

        // save(load()) then load() again: still identical
        storage.save(&loaded);
        assert_eq!(storage.load(), tasks);
    }
}
