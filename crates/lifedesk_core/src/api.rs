//! JSON-shaped upward surface for UI callers.
//!
//! # Responsibility
//! - Map category use-cases onto serde request/response bodies.
//! - Keep error semantics machine-readable across the boundary.
//!
//! # Invariants
//! - Every rejected operation carries a stable `kind` plus a human message.
//! - No transport is assumed; callers own HTTP, IPC, or direct calls.

use crate::counts::{CountMap, Rollup};
use crate::model::category::{Category, CategoryId, CategoryPatch};
use crate::model::item::ItemKind;
use crate::repo::category_repo::CategoryRepository;
use crate::repo::item_repo::{ItemRepository, TaskCountFilter};
use crate::scope::{ScopeFilter, ScopeSelection};
use crate::service::category_service::{CategoryService, CategoryServiceError, Disposition};
use crate::tree::CategoryTreeNode;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// Machine-readable error body for rejected operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Stable error kind, e.g. `disposition_required`.
    pub kind: String,
    /// Human-readable explanation suitable for an actionable message.
    pub message: String,
}

impl ErrorBody {
    fn invalid(message: impl Into<String>) -> Self {
        Self {
            kind: "validation_error".to_string(),
            message: message.into(),
        }
    }
}

impl From<CategoryServiceError> for ErrorBody {
    fn from(err: CategoryServiceError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

pub type ApiResult<T> = Result<T, ErrorBody>;

/// Body of `POST category`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
}

/// Body of `PATCH category/:id`. Absent fields keep their current values;
/// an explicit `"description": null` clears the description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateCategoryRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable_update")]
    pub description: Option<Option<String>>,
}

/// Body of `PATCH category/:id/move`. `new_parent_id = null` moves to root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MoveCategoryRequest {
    pub new_parent_id: Option<CategoryId>,
}

/// Body of `DELETE category/:id`. At most one disposition may be chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct DeleteCategoryRequest {
    #[serde(default)]
    pub reassign_to: Option<CategoryId>,
    #[serde(default)]
    pub delete_items: bool,
}

/// Query of `GET counts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CountsRequest {
    pub kind: ItemKind,
    pub rollup: Rollup,
    /// Whether completed tasks count; ignored for notes.
    #[serde(default)]
    pub include_completed: bool,
}

/// Result of a committed `DELETE category/:id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteCategoryResponse {
    pub deleted_id: CategoryId,
    pub tasks_affected: usize,
    pub notes_affected: usize,
}

/// Concrete match set for a resolved view filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeResponse {
    /// True for the unfiltered "All" view.
    pub matches_all: bool,
    /// Whether records with no category match.
    pub include_uncategorized: bool,
    /// Concrete category ids; absent when `matches_all`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_ids: Option<BTreeSet<CategoryId>>,
}

/// `GET tree` — nested category structure.
pub fn get_tree<C: CategoryRepository, I: ItemRepository>(
    service: &CategoryService<C, I>,
) -> ApiResult<Vec<CategoryTreeNode>> {
    service.tree().map_err(Into::into)
}

/// `GET counts` — per-category counts for one kind and rollup mode.
pub fn get_counts<C: CategoryRepository, I: ItemRepository>(
    service: &CategoryService<C, I>,
    request: &CountsRequest,
) -> ApiResult<CountMap> {
    service
        .counts(
            request.kind,
            request.rollup,
            TaskCountFilter {
                include_completed: request.include_completed,
            },
        )
        .map_err(Into::into)
}

/// `POST category` — creates a new leaf.
pub fn create_category<C: CategoryRepository, I: ItemRepository>(
    service: &CategoryService<C, I>,
    request: CreateCategoryRequest,
) -> ApiResult<Category> {
    service
        .create(request.name, request.description, request.parent_id)
        .map_err(Into::into)
}

/// `PATCH category/:id` — partial name/description update.
pub fn update_category<C: CategoryRepository, I: ItemRepository>(
    service: &CategoryService<C, I>,
    id: CategoryId,
    request: UpdateCategoryRequest,
) -> ApiResult<Category> {
    service
        .update(
            id,
            CategoryPatch {
                name: request.name,
                description: request.description,
            },
        )
        .map_err(Into::into)
}

/// `PATCH category/:id/move` — re-parents one category.
pub fn move_category<C: CategoryRepository, I: ItemRepository>(
    service: &CategoryService<C, I>,
    id: CategoryId,
    request: &MoveCategoryRequest,
) -> ApiResult<Category> {
    service
        .move_category(id, request.new_parent_id)
        .map_err(Into::into)
}

/// `DELETE category/:id` — deletes one childless category.
pub fn delete_category<C: CategoryRepository, I: ItemRepository>(
    service: &CategoryService<C, I>,
    id: CategoryId,
    request: &DeleteCategoryRequest,
) -> ApiResult<DeleteCategoryResponse> {
    let disposition = match (request.reassign_to, request.delete_items) {
        (Some(_), true) => {
            return Err(ErrorBody::invalid(
                "choose either reassign_to or delete_items, not both",
            ));
        }
        (Some(target), false) => Some(Disposition::ReassignTo(target)),
        (None, true) => Some(Disposition::DeleteItems),
        (None, false) => None,
    };

    let outcome = service.delete(id, disposition)?;
    Ok(DeleteCategoryResponse {
        deleted_id: outcome.category_id,
        tasks_affected: outcome.tasks_affected,
        notes_affected: outcome.notes_affected,
    })
}

/// `resolveScope` — concrete ids to match task/note listings against.
pub fn resolve_scope<C: CategoryRepository, I: ItemRepository>(
    service: &CategoryService<C, I>,
    filter: &ScopeFilter,
) -> ApiResult<ScopeResponse> {
    let selection = service.resolve_scope(filter)?;
    Ok(match selection {
        ScopeSelection::All => ScopeResponse {
            matches_all: true,
            include_uncategorized: true,
            category_ids: None,
        },
        ScopeSelection::Ids(ids) => ScopeResponse {
            matches_all: false,
            include_uncategorized: false,
            category_ids: Some(ids),
        },
    })
}

/// Distinguishes an absent JSON field (`None`) from an explicit `null`
/// (`Some(None)`) for clear-on-null update semantics.
fn nullable_update<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}
