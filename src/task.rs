use serde::{Deserialize, Serialize};

/// Layout of `created_at` and `last_edited` timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub status: String, // "Pending", "In progress", "Done"
    pub created_at: String,
    pub due_date: String, // may be empty
    pub difficulty: String, // "easy", "medium", "hard"
    #[serde(default)]
    pub deleted: bool,
    pub last_edited: String,
}

/// Sparse update for [`Task::apply`]: `None` keeps the current value.
#[derive(Debug, Default, Clone)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<String>,
    pub difficulty: Option<String>,
}

impl Task {
    /// Build a fresh record. Enumerated fields are stored as given; callers
    /// validate them before construction.
    pub fn new(
        id: u32,
        title: impl Into<String>,
        description: impl Into<String>,
        status: impl Into<String>,
        created_at: impl Into<String>,
        due_date: impl Into<String>,
        difficulty: impl Into<String>,
    ) -> Self {
        let created_at = created_at.into();
        Self {
            id,
            title: title.into(),
            description: description.into(),
            status: status.into(),
            last_edited: created_at.clone(),
            created_at,
            due_date: due_date.into(),
            difficulty: difficulty.into(),
            deleted: false,
        }
    }

    /// Overwrite the fields present in `patch`. `last_edited` is refreshed
    /// even when the patch is empty.
    pub fn apply(&mut self, patch: &TaskPatch, edited_at: &str) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(status) = &patch.status {
            self.status = status.clone();
        }
        if let Some(due_date) = &patch.due_date {
            self.due_date = due_date.clone();
        }
        if let Some(difficulty) = &patch.difficulty {
            self.difficulty = difficulty.clone();
        }
        self.last_edited = edited_at.to_string();
    }

    /// One-way transition; there is no undelete.
    pub fn soft_delete(&mut self) {
        self.deleted = true;
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }
}
