//! Category mutation engine and scoped read facade.
//!
//! # Responsibility
//! - Apply create/rename/move/delete with invariant checks and cascading
//!   effects on tasks/notes.
//! - Serve tree, count, and scope queries from one consistent snapshot.
//!
//! # Invariants
//! - The parent relation stays acyclic: a category never moves into its own
//!   subtree, itself included.
//! - Deletion requires zero children and a resolved item disposition; it is
//!   never recursive.
//! - Every rejected mutation surfaces a specific error kind and leaves state
//!   unchanged.

use crate::counts::{self, CountMap, Rollup};
use crate::model::category::{
    normalize_description, normalize_name, Category, CategoryDraft, CategoryId, CategoryPatch,
    CategoryValidationError,
};
use crate::model::item::{ItemKind, Note, Task};
use crate::repo::category_repo::{
    CategoryRepoError, CategoryRepository, DeleteOutcome, ItemDisposition,
};
use crate::repo::item_repo::{
    ItemRepoError, ItemRepository, NoteListQuery, TaskCountFilter, TaskListQuery,
};
use crate::scope::{resolve_scope, ScopeFilter, ScopeSelection};
use crate::tree::{CategoryForest, CategoryTreeNode};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Caller-supplied choice of what happens to a deleted category's items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Move every attached task/note to the given category.
    ReassignTo(CategoryId),
    /// Delete every attached task/note.
    DeleteItems,
}

/// Errors from category mutation and query operations.
///
/// Every variant is recoverable and maps to a stable kind string for the
/// caller-facing boundary.
#[derive(Debug)]
pub enum CategoryServiceError {
    /// Bad input shape, e.g. a blank name.
    Validation(CategoryValidationError),
    /// Referenced category id does not exist.
    NotFound(CategoryId),
    /// Move would place a category inside its own subtree.
    Cycle {
        id: CategoryId,
        new_parent_id: CategoryId,
    },
    /// Delete blocked by existing child categories.
    HasChildren(CategoryId),
    /// Delete blocked by attached items with no disposition chosen.
    DispositionRequired(CategoryId),
    /// Disposition's reassignment target is unusable.
    InvalidTarget(CategoryId),
    /// Storage failure propagated unchanged.
    Storage(StorageError),
}

/// Storage-layer failure carried through the service boundary.
#[derive(Debug)]
pub enum StorageError {
    Category(CategoryRepoError),
    Item(ItemRepoError),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Category(err) => write!(f, "{err}"),
            Self::Item(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Category(err) => Some(err),
            Self::Item(err) => Some(err),
        }
    }
}

impl CategoryServiceError {
    /// Stable machine-readable kind for caller-facing error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::Cycle { .. } => "cycle_error",
            Self::HasChildren(_) => "has_children",
            Self::DispositionRequired(_) => "disposition_required",
            Self::InvalidTarget(_) => "invalid_target",
            Self::Storage(_) => "storage_error",
        }
    }
}

impl Display for CategoryServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "category not found: {id}"),
            Self::Cycle { id, new_parent_id } => write!(
                f,
                "moving category {id} under {new_parent_id} would create a cycle"
            ),
            Self::HasChildren(id) => write!(
                f,
                "category {id} has child categories; delete or move them first"
            ),
            Self::DispositionRequired(id) => write!(
                f,
                "category {id} has attached tasks or notes; choose a disposition"
            ),
            Self::InvalidTarget(id) => {
                write!(f, "cannot reassign items to category {id}")
            }
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CategoryServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CategoryValidationError> for CategoryServiceError {
    fn from(value: CategoryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<CategoryRepoError> for CategoryServiceError {
    fn from(value: CategoryRepoError) -> Self {
        match value {
            CategoryRepoError::Validation(err) => Self::Validation(err),
            CategoryRepoError::CategoryNotFound(id) => Self::NotFound(id),
            CategoryRepoError::HasChildren(id) => Self::HasChildren(id),
            CategoryRepoError::ItemsStillAttached(id) => Self::DispositionRequired(id),
            CategoryRepoError::ReassignTargetInvalid(id) => Self::InvalidTarget(id),
            other => Self::Storage(StorageError::Category(other)),
        }
    }
}

impl From<ItemRepoError> for CategoryServiceError {
    fn from(value: ItemRepoError) -> Self {
        Self::Storage(StorageError::Item(value))
    }
}

/// Category subsystem facade over the two repositories.
pub struct CategoryService<C: CategoryRepository, I: ItemRepository> {
    categories: C,
    items: I,
}

impl<C: CategoryRepository, I: ItemRepository> CategoryService<C, I> {
    /// Creates the service from repository implementations.
    pub fn new(categories: C, items: I) -> Self {
        Self { categories, items }
    }

    /// Creates one category as a new leaf under the optional parent.
    pub fn create(
        &self,
        name: impl Into<String>,
        description: Option<String>,
        parent_id: Option<CategoryId>,
    ) -> Result<Category, CategoryServiceError> {
        let name = normalize_name(&name.into())?;
        if let Some(parent_id) = parent_id {
            self.require_category(parent_id)?;
        }

        let created = self.categories.insert(&CategoryDraft {
            name,
            description: normalize_description(description),
            parent_id,
        })?;
        info!(
            "event=category_create module=service status=ok id={} parent_id={}",
            created.id,
            display_parent(created.parent_id)
        );
        Ok(created)
    }

    /// Applies a partial name/description update.
    pub fn update(
        &self,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> Result<Category, CategoryServiceError> {
        let normalized = CategoryPatch {
            name: match patch.name {
                Some(name) => Some(normalize_name(&name)?),
                None => None,
            },
            description: patch.description.map(normalize_description),
        };
        let updated = self.categories.patch(id, &normalized)?;
        info!("event=category_update module=service status=ok id={id}");
        Ok(updated)
    }

    /// Re-parents one category after checking the move keeps the forest
    /// acyclic. Only the parent link changes; the category is placed last
    /// among its new siblings.
    pub fn move_category(
        &self,
        id: CategoryId,
        new_parent_id: Option<CategoryId>,
    ) -> Result<Category, CategoryServiceError> {
        let forest = self.forest()?;
        if !forest.contains(id) {
            return Err(CategoryServiceError::NotFound(id));
        }
        if let Some(parent_id) = new_parent_id {
            if !forest.contains(parent_id) {
                return Err(CategoryServiceError::NotFound(parent_id));
            }
            // Covers parent_id == id: the descendant check is reflexive.
            if forest.is_descendant(parent_id, id) {
                return Err(CategoryServiceError::Cycle {
                    id,
                    new_parent_id: parent_id,
                });
            }
        }

        let moved = self.categories.set_parent(id, new_parent_id)?;
        info!(
            "event=category_move module=service status=ok id={id} new_parent_id={}",
            display_parent(new_parent_id)
        );
        Ok(moved)
    }

    /// Deletes one childless category, resolving attached items through the
    /// caller-supplied disposition. Never recursive; all-or-nothing.
    pub fn delete(
        &self,
        id: CategoryId,
        disposition: Option<Disposition>,
    ) -> Result<DeleteOutcome, CategoryServiceError> {
        self.require_category(id)?;

        // Any transitive descendant implies a direct child.
        let forest = self.forest()?;
        if forest.descendant_ids(id).len() > 1 {
            return Err(CategoryServiceError::HasChildren(id));
        }

        let attached_tasks = self.items.find_tasks_by_category(id)?;
        let attached_notes = self.items.find_notes_by_category(id)?;
        let resolved = if attached_tasks.is_empty() && attached_notes.is_empty() {
            ItemDisposition::RequireEmpty
        } else {
            match disposition {
                None => return Err(CategoryServiceError::DispositionRequired(id)),
                Some(Disposition::ReassignTo(target)) => {
                    if target == id {
                        return Err(CategoryServiceError::InvalidTarget(target));
                    }
                    if self.categories.get(target)?.is_none() {
                        return Err(CategoryServiceError::InvalidTarget(target));
                    }
                    ItemDisposition::ReassignTo(target)
                }
                Some(Disposition::DeleteItems) => ItemDisposition::DeleteItems,
            }
        };

        let outcome = self.categories.remove_leaf(id, resolved)?;
        info!(
            "event=category_delete module=service status=ok id={id} tasks_affected={} notes_affected={}",
            outcome.tasks_affected, outcome.notes_affected
        );
        Ok(outcome)
    }

    /// Nested category structure, rebuilt from the flat list.
    pub fn tree(&self) -> Result<Vec<CategoryTreeNode>, CategoryServiceError> {
        Ok(self.forest()?.into_roots())
    }

    /// Per-category counts for one record kind and rollup mode.
    ///
    /// The task filter is forwarded to the direct-count query; it has no
    /// effect on note counts.
    pub fn counts(
        &self,
        kind: ItemKind,
        rollup: Rollup,
        task_filter: TaskCountFilter,
    ) -> Result<CountMap, CategoryServiceError> {
        let forest = self.forest()?;
        let grouped = match kind {
            ItemKind::Task => self.items.count_tasks_by_category(&task_filter)?,
            ItemKind::Note => self.items.count_notes_by_category()?,
        };
        let direct = counts::zero_filled(&forest, grouped);
        Ok(match rollup {
            Rollup::Direct => direct,
            Rollup::Descendants => counts::rolled_up(&forest, &direct),
        })
    }

    /// Translates a view filter into the concrete category match set.
    pub fn resolve_scope(
        &self,
        filter: &ScopeFilter,
    ) -> Result<ScopeSelection, CategoryServiceError> {
        Ok(resolve_scope(&self.forest()?, filter))
    }

    /// Tasks matching the scope filter, optionally narrowed by completion.
    pub fn list_tasks_in_scope(
        &self,
        filter: &ScopeFilter,
        completed: Option<bool>,
    ) -> Result<Vec<Task>, CategoryServiceError> {
        let selection = self.resolve_scope(filter)?;
        let tasks = self.items.list_tasks(&TaskListQuery {
            category_id: None,
            completed,
        })?;
        Ok(tasks
            .into_iter()
            .filter(|task| selection.matches(task.category_id))
            .collect())
    }

    /// Notes matching the scope filter.
    pub fn list_notes_in_scope(
        &self,
        filter: &ScopeFilter,
    ) -> Result<Vec<Note>, CategoryServiceError> {
        let selection = self.resolve_scope(filter)?;
        let notes = self.items.list_notes(&NoteListQuery { category_id: None })?;
        Ok(notes
            .into_iter()
            .filter(|note| selection.matches(note.category_id))
            .collect())
    }

    fn forest(&self) -> Result<CategoryForest, CategoryServiceError> {
        let categories = self.categories.list()?;
        Ok(CategoryForest::build(&categories))
    }

    fn require_category(&self, id: CategoryId) -> Result<Category, CategoryServiceError> {
        self.categories
            .get(id)?
            .ok_or(CategoryServiceError::NotFound(id))
    }
}

fn display_parent(parent_id: Option<CategoryId>) -> String {
    parent_id.map_or_else(|| "none".to_string(), |id| id.to_string())
}
