//! Category domain model.
//!
//! # Responsibility
//! - Define the category record and its write shapes.
//! - Provide name normalization shared by store and service layers.
//!
//! # Invariants
//! - `id` is stable and never reused for another category.
//! - `name` is non-empty after trimming.
//! - `parent_id = None` marks a root; the parent relation is acyclic.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable identifier for a category, assigned by the store on insert.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type CategoryId = i64;

/// A named node in the user's organizational hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Stable id used by tasks/notes to reference this category.
    pub id: CategoryId,
    /// User-facing label, non-empty after trim.
    pub name: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Parent category. `None` means root.
    pub parent_id: Option<CategoryId>,
    /// Stable ordering key within one parent.
    pub sort_order: i64,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

impl Category {
    /// Returns whether this category sits at the top of the forest.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Write shape for inserting a new category.
///
/// The store assigns `id` and defaults `sort_order` to last among siblings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryDraft {
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<CategoryId>,
}

/// Partial update shape for an existing category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPatch {
    /// New display name; `None` keeps the current value.
    pub name: Option<String>,
    /// `Some(None)` clears the description; outer `None` keeps the current value.
    pub description: Option<Option<String>>,
}

impl CategoryPatch {
    /// Returns whether this patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

/// Validation failure for category write shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryValidationError {
    /// Name is blank after trim.
    BlankName,
}

impl Display for CategoryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "category name must not be blank"),
        }
    }
}

impl Error for CategoryValidationError {}

/// Trims a candidate name and rejects blank input.
pub fn normalize_name(value: &str) -> Result<String, CategoryValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CategoryValidationError::BlankName);
    }
    Ok(trimmed.to_string())
}

/// Trims a candidate description, mapping blank input to `None`.
pub fn normalize_description(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
