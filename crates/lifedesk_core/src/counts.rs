//! Derived per-category task/note counts.
//!
//! # Responsibility
//! - Complete grouped direct counts into full per-category maps.
//! - Roll direct counts up over inclusive descendant sets.
//!
//! # Invariants
//! - Direct counts partition categorized records exactly once, so the grand
//!   total is the sum over *all* ids, never over roots only.
//! - Deleted categories are absent from every map, not present as zero.

use crate::model::category::CategoryId;
use crate::tree::CategoryForest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-category record count, one map per (kind, rollup) pair.
pub type CountMap = BTreeMap<CategoryId, u64>;

/// Whether a count covers a category alone or its whole subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rollup {
    /// Records whose `category_id` equals the id exactly.
    Direct,
    /// Sum over the inclusive descendant set.
    Descendants,
}

/// Completes grouped direct counts with explicit zero entries for every
/// category the forest knows, and drops entries for ids it does not.
pub fn zero_filled(forest: &CategoryForest, grouped: CountMap) -> CountMap {
    let mut counts = grouped;
    counts.retain(|id, _| forest.contains(*id));
    for id in forest.category_ids() {
        counts.entry(id).or_insert(0);
    }
    counts
}

/// Per-category sums of direct counts over the inclusive descendant set.
///
/// Quadratic in the worst case; fine at personal scale, where rebuilding
/// beats maintaining incremental indexes.
pub fn rolled_up(forest: &CategoryForest, direct: &CountMap) -> CountMap {
    let mut counts = CountMap::new();
    for id in forest.category_ids() {
        let subtree_total = forest
            .descendant_ids(id)
            .iter()
            .map(|member| direct.get(member).copied().unwrap_or(0))
            .sum();
        counts.insert(id, subtree_total);
    }
    counts
}

/// Total number of categorized records: the sum of direct counts over all
/// category ids.
pub fn grand_total(direct: &CountMap) -> u64 {
    direct.values().sum()
}
