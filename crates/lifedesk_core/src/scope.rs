//! Scope resolution for category-filtered task/note views.
//!
//! # Responsibility
//! - Translate a "selected category" view filter into the concrete set of
//!   category ids to match records against.
//!
//! # Invariants
//! - Resolution is pure: it reads the current forest shape and mutates
//!   nothing, so it is safe to run concurrently with tree edits.
//! - Uncategorized records match only the unfiltered "All" view.

use crate::model::category::CategoryId;
use crate::tree::CategoryForest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// View filter selecting everything, a single category, or a subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeFilter {
    /// Selected category; `None` is the unfiltered "All" view.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// Whether the selection covers the whole subtree.
    #[serde(default)]
    pub include_descendants: bool,
}

/// Concrete match set produced from a `ScopeFilter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeSelection {
    /// Every record matches, categorized or not.
    All,
    /// Records whose category id is in the set match; uncategorized never do.
    Ids(BTreeSet<CategoryId>),
}

impl ScopeSelection {
    /// Returns whether a record with the given category assignment matches.
    pub fn matches(&self, category_id: Option<CategoryId>) -> bool {
        match self {
            Self::All => true,
            Self::Ids(ids) => category_id.is_some_and(|id| ids.contains(&id)),
        }
    }

    /// Returns whether records with `category_id = None` match.
    pub fn includes_uncategorized(&self) -> bool {
        matches!(self, Self::All)
    }
}

/// Translates a view filter into its match set against the current forest.
pub fn resolve_scope(forest: &CategoryForest, filter: &ScopeFilter) -> ScopeSelection {
    match filter.category_id {
        None => ScopeSelection::All,
        Some(id) if filter.include_descendants => ScopeSelection::Ids(forest.descendant_ids(id)),
        Some(id) => ScopeSelection::Ids(BTreeSet::from([id])),
    }
}
