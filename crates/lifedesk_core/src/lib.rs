//! Core domain logic for LifeDesk, a personal organizer.
//! This crate is the single source of truth for category-tree invariants.

pub mod api;
pub mod counts;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod scope;
pub mod service;
pub mod tree;

pub use counts::{grand_total, rolled_up, zero_filled, CountMap, Rollup};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::category::{
    Category, CategoryDraft, CategoryId, CategoryPatch, CategoryValidationError,
};
pub use model::item::{ItemKind, Note, NoteDraft, NoteId, Task, TaskDraft, TaskId};
pub use repo::category_repo::{
    CategoryRepoError, CategoryRepoResult, CategoryRepository, DeleteOutcome, ItemDisposition,
    SqliteCategoryRepository,
};
pub use repo::item_repo::{
    ItemRepoError, ItemRepoResult, ItemRepository, NoteListQuery, SqliteItemRepository,
    TaskCountFilter, TaskListQuery,
};
pub use scope::{resolve_scope, ScopeFilter, ScopeSelection};
pub use service::category_service::{
    CategoryService, CategoryServiceError, Disposition, StorageError,
};
pub use tree::{CategoryForest, CategoryTreeNode, TreeWalk};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
