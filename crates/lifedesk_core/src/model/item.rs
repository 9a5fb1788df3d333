//! Task and note domain models.
//!
//! # Responsibility
//! - Define the records that can be filed under a category.
//! - Keep both kinds addressable through one `ItemKind` discriminator.
//!
//! # Invariants
//! - `category_id = None` is valid and means "uncategorized".
//! - A non-null `category_id` always references an existing category;
//!   category deletion resolves every reference before the record goes away.

use crate::model::category::CategoryId;
use serde::{Deserialize, Serialize};

/// Stable identifier for a task.
pub type TaskId = i64;

/// Stable identifier for a note.
pub type NoteId = i64;

/// Discriminator for the two record kinds filed under categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Task,
    Note,
}

/// An actionable to-do, optionally due on a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Owning category; `None` means uncategorized.
    pub category_id: Option<CategoryId>,
    pub content: String,
    /// ISO `YYYY-MM-DD` date, when set.
    pub due_date: Option<String>,
    pub completed: bool,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

/// A free-form text note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    /// Owning category; `None` means uncategorized.
    pub category_id: Option<CategoryId>,
    pub content: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

/// Write shape for inserting a new task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub category_id: Option<CategoryId>,
    pub content: String,
    pub due_date: Option<String>,
}

/// Write shape for inserting a new note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub category_id: Option<CategoryId>,
    pub content: String,
}
